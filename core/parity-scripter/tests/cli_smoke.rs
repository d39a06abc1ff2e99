use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct DaemonGuard {
    child: Child,
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_parity-scripter"));
    command.env_remove("RUST_LOG");
    command
}

fn write_config(dir: &Path, containers: &[&str]) -> PathBuf {
    let path = dir.join("parity.json");
    let body = serde_json::json!({ "containers": containers });
    std::fs::write(&path, body.to_string()).expect("write config");
    path
}

fn write_status(dir: &Path, state: &str, resync: u64, pos: u64) -> PathBuf {
    let path = dir.join("var.ini");
    std::fs::write(
        &path,
        format!(
            "mdState=\"{}\"\nmdResync=\"{}\"\nmdResyncPos=\"{}\"\n",
            state, resync, pos
        ),
    )
    .expect("write status");
    path
}

fn run_to_exit(command: &mut Command) -> Output {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to run parity-scripter")
}

/// Waits until `needle` appears on at least `count` lines of the log.
fn wait_for_log_lines(path: &Path, needle: &str, count: usize, timeout: Duration) -> Vec<String> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(contents) = std::fs::read_to_string(path) {
            let lines: Vec<String> = contents
                .lines()
                .filter(|line| line.contains(needle))
                .map(str::to_string)
                .collect();
            if lines.len() >= count {
                return lines;
            }
        }
        sleep(Duration::from_millis(50));
    }
    panic!("Timed out waiting for {:?} in {}", needle, path.display());
}

#[test]
fn version_flag_prints_package_version() {
    let output = run_to_exit(binary().arg("--version"));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "stdout: {}", stdout);
}

#[test]
fn missing_config_flag_is_usage_error() {
    let output = run_to_exit(&mut binary());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--config"));
}

#[test]
fn zero_sleep_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(dir.path(), &["plex"]);
    let output = run_to_exit(binary().arg("--config").arg(&config).args(["--sleep", "0"]));
    assert!(!output.status.success());
}

#[test]
fn unreadable_config_exits_with_error() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_to_exit(
        binary()
            .arg("--config")
            .arg(dir.path().join("missing.json"))
            .arg("--no-notify"),
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn fail_fast_exits_when_status_file_is_missing() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(dir.path(), &["plex"]);
    let output = run_to_exit(
        binary()
            .arg("--config")
            .arg(&config)
            .arg("--status-file")
            .arg(dir.path().join("var.ini"))
            .args(["--no-notify", "--fail-fast"]),
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn stopped_array_starts_configured_containers() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(dir.path(), &["plex"]);
    let status = write_status(dir.path(), "STOPPED", 0, 0);
    let log = dir.path().join("logs").join("parity-scripter.log");

    let child = binary()
        .arg("--config")
        .arg(&config)
        .arg("--status-file")
        .arg(&status)
        .arg("--log-file")
        .arg(&log)
        .args(["--docker", "true", "--no-notify", "--sleep", "1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn parity-scripter");
    let _guard = DaemonGuard { child };

    let lines = wait_for_log_lines(&log, "Starting container", 1, Duration::from_secs(10));
    assert!(lines[0].contains("plex"), "line: {}", lines[0]);

    let contents = std::fs::read_to_string(&log).expect("read log");
    assert!(contents.contains("Started monitoring parity state"));
}

#[test]
fn running_parity_check_stops_configured_containers() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(dir.path(), &["plex", "sonarr"]);
    let status = write_status(dir.path(), "STARTED", 976_762_552, 1024);
    let log = dir.path().join("parity-scripter.log");

    let child = binary()
        .arg("--config")
        .arg(&config)
        .arg("--status-file")
        .arg(&status)
        .arg("--log-file")
        .arg(&log)
        .args(["--docker", "true", "--no-notify", "--sleep", "1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn parity-scripter");
    let _guard = DaemonGuard { child };

    let lines = wait_for_log_lines(&log, "Stopping container", 2, Duration::from_secs(10));
    assert!(lines[0].contains("plex"), "line: {}", lines[0]);
    assert!(lines[1].contains("sonarr"), "line: {}", lines[1]);

    let contents = std::fs::read_to_string(&log).expect("read log");
    assert!(!contents.contains("Starting container"));
}
