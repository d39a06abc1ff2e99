//! Start and stop containers by name.

use crate::command::run_checked;
use crate::error::ActionError;

pub const DEFAULT_DOCKER_PROGRAM: &str = "docker";

pub trait ContainerRuntime {
    fn start(&self, name: &str) -> Result<(), ActionError>;
    fn stop(&self, name: &str) -> Result<(), ActionError>;
}

/// Drives containers through the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, verb: &str, name: &str) -> Result<(), ActionError> {
        run_checked(&self.program, [verb, name])?;
        Ok(())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_PROGRAM)
    }
}

impl ContainerRuntime for DockerCli {
    fn start(&self, name: &str) -> Result<(), ActionError> {
        tracing::info!(container = name, "Starting container");
        self.run("start", name)
    }

    fn stop(&self, name: &str) -> Result<(), ActionError> {
        tracing::info!(container = name, "Stopping container");
        self.run("stop", name)
    }
}
