//! Server configuration file.
//!
//! ```yaml
//! listen:
//!   host: 127.0.0.1
//!   port: 8080
//! mappings: ./wiremock
//! logging:
//!   level: info
//!   format: json
//! ```

mod listen;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use listen::{ListenConfig, LogFormat, LoggingConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Directory holding `mappings/*.json` and `__files/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref dir) = self.mappings {
            if !dir.join("mappings").is_dir() {
                anyhow::bail!(
                    "Mapping directory '{}' has no 'mappings' subdirectory",
                    dir.display()
                );
            }
        }

        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.logging.level) {
            anyhow::bail!("Invalid log level '{}': {}", self.logging.level, e);
        }

        Ok(())
    }
}
