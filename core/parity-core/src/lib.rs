//! # parity-core
//!
//! Parity check monitoring for Unraid: reads the array status, detects when a
//! parity check starts, pauses or stops, and runs container actions exactly
//! once per transition.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. The daemon loop blocks on each action.
//! - **Injectable edges**: Status reads, container control and notifications
//!   sit behind traits so poll sequences can be replayed in tests.
//! - **No persisted history**: Detector memory lives for one process.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parity_core::{ActionPlan, ContainerDispatcher, DockerCli, FileStatusSource,
//!     StatusSource, TransitionDetector, UnraidNotifier};
//!
//! let plan = ActionPlan::from_containers(&config.containers);
//! let mut dispatcher = ContainerDispatcher::new(DockerCli::default(), UnraidNotifier::default());
//! let mut detector = TransitionDetector::new();
//! let status = FileStatusSource::default().read_status()?;
//! detector.tick(&status, &plan, &mut dispatcher);
//! ```

pub mod action;
pub mod command;
pub mod config;
pub mod containers;
pub mod detector;
pub mod error;
pub mod notify;
pub mod status;

pub use action::{Action, ActionDispatcher, ActionPlan, ContainerDispatcher};
pub use command::{run_checked, run_command, CommandOutcome};
pub use config::Config;
pub use containers::{ContainerRuntime, DockerCli};
pub use detector::{decide, DetectorMemory, Phase, TransitionDetector};
pub use error::{ActionError, ParityError, Result};
pub use notify::{html_format, Notifier, NullNotifier, Severity, UnraidNotifier};
pub use status::{
    parse_status, DerivedStatus, FileStatusSource, ParityState, RawStatus, StatusSource,
};
