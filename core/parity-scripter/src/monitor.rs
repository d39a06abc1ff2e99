//! The poll loop: read status, run the detector, sleep, repeat.

use chrono::Utc;
use parity_core::{
    ActionDispatcher, ActionPlan, Notifier, ParityError, Phase, Severity, StatusSource,
    TransitionDetector,
};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::backoff::{compute_backoff, FailureStreak};

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub interval: Duration,
    /// Exit on the first unreadable or malformed status instead of retrying.
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Checked(Option<Phase>),
    ReadFailed { retry_in: Duration },
}

pub struct Monitor<S: StatusSource, D: ActionDispatcher, N: Notifier> {
    source: S,
    dispatcher: D,
    notifier: N,
    plan: ActionPlan,
    detector: TransitionDetector,
    settings: MonitorSettings,
    streak: FailureStreak,
}

impl<S: StatusSource, D: ActionDispatcher, N: Notifier> Monitor<S, D, N> {
    pub fn new(
        source: S,
        dispatcher: D,
        notifier: N,
        plan: ActionPlan,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            dispatcher,
            notifier,
            plan,
            detector: TransitionDetector::new(),
            settings,
            streak: FailureStreak::default(),
        }
    }

    pub fn announce(&self) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            on_start = self.plan.on_start.len(),
            on_stop = self.plan.on_stop.len(),
            "Started monitoring parity state"
        );
        self.notifier.send(
            Severity::Normal,
            "Started monitoring parity state",
            "Began monitoring parity check state to run start actions when a parity check \
             starts and stop actions when it is stopped or paused.",
            "",
        );
    }

    /// One poll. Returns an error only for a failed read in fail-fast mode.
    pub fn tick(&mut self) -> Result<TickOutcome, ParityError> {
        let status = match self.source.read_status() {
            Ok(status) => status,
            Err(err) => return self.handle_read_failure(err),
        };

        if let Some(recovery) = self.streak.record_success() {
            info!(
                failures = recovery.failures,
                since = %recovery.since.to_rfc3339(),
                "Parity status readable again"
            );
            self.notifier.send(
                Severity::Normal,
                "Parity status readable again",
                &format!(
                    "Status could be read again after {} failed attempts.",
                    recovery.failures
                ),
                &format!("First failure at {}.", recovery.since.to_rfc3339()),
            );
        }

        let phase = self
            .detector
            .tick(&status, &self.plan, &mut self.dispatcher);
        if let Some(phase) = phase {
            debug!(phase = %phase, "Parity transition handled");
        }
        Ok(TickOutcome::Checked(phase))
    }

    /// Polls forever. Returns only when fail-fast mode hits a read error.
    pub fn run(&mut self) -> Result<(), ParityError> {
        loop {
            let delay = match self.tick()? {
                TickOutcome::Checked(_) => self.settings.interval,
                TickOutcome::ReadFailed { retry_in } => retry_in,
            };
            debug!(sleep_secs = delay.as_secs(), "Going to sleep");
            thread::sleep(delay);
        }
    }

    fn handle_read_failure(&mut self, err: ParityError) -> Result<TickOutcome, ParityError> {
        if self.settings.fail_fast || !err.is_status_error() {
            error!(error = %err, "Failed to read parity status");
            return Err(err);
        }

        let first = self.streak.record_failure(Utc::now());
        let retry_in = compute_backoff(self.streak.count(), self.settings.interval);
        warn!(
            error = %err,
            failures = self.streak.count(),
            retry_secs = retry_in.as_secs(),
            "Failed to read parity status; skipping this check"
        );
        if first {
            self.notifier.send(
                Severity::Warning,
                "Parity status unavailable",
                &err.to_string(),
                "Parity transitions are not detected until the status can be read again.",
            );
        }
        Ok(TickOutcome::ReadFailed { retry_in })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::{parse_status, Action, DetectorMemory, RawStatus};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    const RUNNING: &str = "mdState=\"STARTED\"\nmdResync=\"5\"\nmdResyncPos=\"10\"\n";
    const STOPPED: &str = "mdState=\"STOPPED\"\nmdResync=\"0\"\nmdResyncPos=\"0\"\n";

    struct FakeSource {
        reads: RefCell<VecDeque<Option<&'static str>>>,
    }

    impl FakeSource {
        fn new(reads: Vec<Option<&'static str>>) -> Self {
            Self {
                reads: RefCell::new(reads.into()),
            }
        }
    }

    impl StatusSource for FakeSource {
        fn read_raw(&self) -> Result<RawStatus, ParityError> {
            match self.reads.borrow_mut().pop_front().flatten() {
                Some(text) => Ok(parse_status(text)),
                None => Err(ParityError::SourceUnavailable {
                    path: PathBuf::from("/var/local/emhttp/var.ini"),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        actions: Vec<Action>,
    }

    impl ActionDispatcher for Recorder {
        fn dispatch(&mut self, action: &Action) {
            self.actions.push(action.clone());
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        subjects: RefCell<Vec<(Severity, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, severity: Severity, subject: &str, _message: &str, _long_message: &str) {
            self.subjects
                .borrow_mut()
                .push((severity, subject.to_string()));
        }
    }

    fn monitor(
        reads: Vec<Option<&'static str>>,
        fail_fast: bool,
    ) -> Monitor<FakeSource, Recorder, RecordingNotifier> {
        Monitor::new(
            FakeSource::new(reads),
            Recorder::default(),
            RecordingNotifier::default(),
            ActionPlan::from_containers(&["plex".to_string()]),
            MonitorSettings {
                interval: Duration::from_secs(60),
                fail_fast,
            },
        )
    }

    #[test]
    fn tick_runs_detector_on_good_read() {
        let mut monitor = monitor(vec![Some(RUNNING)], false);
        let outcome = monitor.tick().expect("tick");
        assert_eq!(outcome, TickOutcome::Checked(Some(Phase::Start)));
        assert_eq!(
            monitor.dispatcher.actions,
            vec![Action::StopContainer("plex".to_string())]
        );
    }

    #[test]
    fn read_failure_skips_detection_and_backs_off() {
        let mut monitor = monitor(vec![None, None], false);

        assert_eq!(
            monitor.tick().expect("tick"),
            TickOutcome::ReadFailed {
                retry_in: Duration::from_secs(10)
            }
        );
        assert_eq!(
            monitor.tick().expect("tick"),
            TickOutcome::ReadFailed {
                retry_in: Duration::from_secs(20)
            }
        );
        assert!(monitor.dispatcher.actions.is_empty());
        assert_eq!(monitor.detector.memory(), DetectorMemory::default());

        let subjects = monitor.notifier.subjects.borrow();
        assert_eq!(
            *subjects,
            vec![(Severity::Warning, "Parity status unavailable".to_string())]
        );
    }

    #[test]
    fn recovery_is_announced_once_and_detection_resumes() {
        let mut monitor = monitor(vec![None, Some(STOPPED), Some(STOPPED)], false);

        monitor.tick().expect("failed tick");
        assert_eq!(
            monitor.tick().expect("recovered tick"),
            TickOutcome::Checked(Some(Phase::Stop))
        );
        monitor.tick().expect("steady tick");

        let subjects = monitor.notifier.subjects.borrow();
        assert_eq!(
            *subjects,
            vec![
                (Severity::Warning, "Parity status unavailable".to_string()),
                (Severity::Normal, "Parity status readable again".to_string()),
            ]
        );
    }

    #[test]
    fn fail_fast_returns_read_error() {
        let mut monitor = monitor(vec![None], true);
        let result = monitor.tick();
        assert!(matches!(
            result,
            Err(ParityError::SourceUnavailable { .. })
        ));
        assert!(monitor.notifier.subjects.borrow().is_empty());
    }

    #[test]
    fn announce_sends_normal_notification() {
        let monitor = monitor(vec![], false);
        monitor.announce();
        assert_eq!(
            *monitor.notifier.subjects.borrow(),
            vec![(
                Severity::Normal,
                "Started monitoring parity state".to_string()
            )]
        );
    }
}
