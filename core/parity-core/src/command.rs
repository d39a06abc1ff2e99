//! Host command execution with captured output and timing.

use chrono::{DateTime, Utc};
use std::process::Command;

use crate::error::ActionError;

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub command: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CommandOutcome {
    pub fn successful(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }

    /// Best available description of what went wrong.
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("`{}` exited with {}", self.command, self.status_label())
    }

    fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status: {}", code),
            None => "signal".to_string(),
        }
    }
}

/// Runs `program args...` to completion and captures its output.
///
/// Only a spawn failure is an error here; see [`run_checked`] for treating a
/// non-zero exit as one.
pub fn run_command<I, S>(program: &str, args: I) -> Result<CommandOutcome, ActionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let command = display_command(program, &args);

    tracing::debug!(command = %command, "Running host command");
    let started_at = Utc::now();
    let output = Command::new(program)
        .args(&args)
        .output()
        .map_err(|source| ActionError::Spawn {
            command: command.clone(),
            source,
        })?;
    let finished_at = Utc::now();

    let outcome = CommandOutcome {
        command,
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        started_at,
        finished_at,
    };
    tracing::debug!(
        command = %outcome.command,
        exit_code = ?outcome.exit_code,
        elapsed_ms = outcome.elapsed().num_milliseconds(),
        "Host command finished"
    );
    Ok(outcome)
}

/// Like [`run_command`], but a non-zero exit becomes `ActionError::CommandFailed`.
pub fn run_checked<I, S>(program: &str, args: I) -> Result<CommandOutcome, ActionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let outcome = run_command(program, args)?;
    if outcome.successful() {
        return Ok(outcome);
    }

    tracing::error!(
        command = %outcome.command,
        exit_code = ?outcome.exit_code,
        stdout = %outcome.stdout.trim(),
        stderr = %outcome.stderr.trim(),
        started_at = %outcome.started_at.to_rfc3339(),
        finished_at = %outcome.finished_at.to_rfc3339(),
        "Host command failed"
    );
    Err(ActionError::CommandFailed {
        command: outcome.command.clone(),
        status: outcome.status_label(),
        details: outcome.error_message(),
    })
}

fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
