//! Container actions and the boundary where their failures are absorbed.

use crate::containers::ContainerRuntime;
use crate::error::ActionError;
use crate::notify::{Notifier, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartContainer(String),
    StopContainer(String),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::StartContainer(name) => write!(f, "start container '{}'", name),
            Action::StopContainer(name) => write!(f, "stop container '{}'", name),
        }
    }
}

/// The two ordered action lists run on parity transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPlan {
    /// Run when a parity check starts or resumes.
    pub on_start: Vec<Action>,
    /// Run when a parity check stops or pauses.
    pub on_stop: Vec<Action>,
}

impl ActionPlan {
    /// Containers are stopped while parity runs and started again afterwards.
    pub fn from_containers(containers: &[String]) -> Self {
        Self {
            on_start: containers
                .iter()
                .map(|name| Action::StopContainer(name.clone()))
                .collect(),
            on_stop: containers
                .iter()
                .map(|name| Action::StartContainer(name.clone()))
                .collect(),
        }
    }
}

/// Executes actions. Implementations must not fail the caller: an action that
/// goes wrong is reported and the next one still runs.
pub trait ActionDispatcher {
    fn dispatch(&mut self, action: &Action);
}

pub struct ContainerDispatcher<R: ContainerRuntime, N: Notifier> {
    runtime: R,
    notifier: N,
    failures: usize,
}

impl<R: ContainerRuntime, N: Notifier> ContainerDispatcher<R, N> {
    pub fn new(runtime: R, notifier: N) -> Self {
        Self {
            runtime,
            notifier,
            failures: 0,
        }
    }

    /// Total failed actions since the dispatcher was created.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn report_failure(&mut self, action: &Action, err: &ActionError) {
        self.failures = self.failures.saturating_add(1);
        tracing::error!(action = %action, error = %err, "Container action failed");
        self.notifier.send(
            Severity::Warning,
            "System call failed",
            &err.to_string(),
            &format!("Could not {} while handling a parity transition.", action),
        );
    }
}

impl<R: ContainerRuntime, N: Notifier> ActionDispatcher for ContainerDispatcher<R, N> {
    fn dispatch(&mut self, action: &Action) {
        let result = match action {
            Action::StartContainer(name) => self.runtime.start(name),
            Action::StopContainer(name) => self.runtime.stop(name),
        };
        if let Err(err) = result {
            self.report_failure(action, &err);
        }
    }
}
