//! Decides when a parity transition has happened and runs its actions once.
//!
//! ## Decision Rule
//!
//! ```text
//! is_stopped || (is_paused && !prev_stopped)  → stop phase   (prev_stopped = true)
//! is_running && !prev_started                 → start phase  (prev_started = true)
//! otherwise                                   → nothing
//! ```
//!
//! The `!prev_stopped` guard binds to the paused clause only. A steady
//! `stopped` reading therefore re-runs the stop phase on every tick. The first
//! re-run after a completed stop phase is logged at warn level.
//!
//! Memory lives only as long as the process. A restart may re-run the first
//! applicable phase even if it already ran before the restart.

use crate::action::{ActionDispatcher, ActionPlan};
use crate::status::DerivedStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorMemory {
    pub prev_started: bool,
    pub prev_stopped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Parity check stopped or paused.
    Stop,
    /// Parity check started or resumed.
    Start,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Stop => f.write_str("stop"),
            Phase::Start => f.write_str("start"),
        }
    }
}

pub fn decide(memory: &DetectorMemory, status: &DerivedStatus) -> Option<Phase> {
    if status.is_stopped() || (status.is_paused() && !memory.prev_stopped) {
        Some(Phase::Stop)
    } else if status.is_running() && !memory.prev_started {
        Some(Phase::Start)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct TransitionDetector {
    memory: DetectorMemory,
    refire_logged: bool,
}

impl TransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(memory: DetectorMemory) -> Self {
        Self {
            memory,
            refire_logged: false,
        }
    }

    pub fn memory(&self) -> DetectorMemory {
        self.memory
    }

    /// Runs at most one phase for this snapshot and updates memory after the
    /// whole phase has been dispatched.
    pub fn tick<D: ActionDispatcher>(
        &mut self,
        status: &DerivedStatus,
        plan: &ActionPlan,
        dispatcher: &mut D,
    ) -> Option<Phase> {
        tracing::debug!(
            state = %status.classification(),
            prev_started = self.memory.prev_started,
            prev_stopped = self.memory.prev_stopped,
            "Checking parity state"
        );

        let phase = decide(&self.memory, status);
        match phase {
            Some(Phase::Stop) => {
                if self.memory.prev_stopped && !self.refire_logged {
                    tracing::warn!(
                        state = %status.classification(),
                        "Stop actions already ran; running them again on every check while stopped"
                    );
                    self.refire_logged = true;
                } else if self.memory.prev_stopped {
                    tracing::debug!("Running stop actions again for steady stopped state");
                } else {
                    tracing::info!(
                        state = %status.classification(),
                        actions = plan.on_stop.len(),
                        "Parity check stopped, running stop actions"
                    );
                }
                for action in &plan.on_stop {
                    dispatcher.dispatch(action);
                }
                self.memory = DetectorMemory {
                    prev_started: false,
                    prev_stopped: true,
                };
            }
            Some(Phase::Start) => {
                tracing::info!(
                    actions = plan.on_start.len(),
                    "Parity check started, running start actions"
                );
                for action in &plan.on_start {
                    dispatcher.dispatch(action);
                }
                self.refire_logged = false;
                self.memory = DetectorMemory {
                    prev_started: true,
                    prev_stopped: false,
                };
            }
            None => tracing::debug!("Nothing to do, skipping"),
        }
        phase
    }
}
