//! JSON configuration loading.
//!
//! ```json
//! { "containers": ["plex", "sonarr"] }
//! ```

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ParityError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Containers to stop during a parity check and start after it completes.
    pub containers: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ParityError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|err| ParityError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
