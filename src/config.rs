//! Configuration for the Wiresight CLI

use serde::{Deserialize, Serialize};

use crate::log::DEFAULT_MAX_REQUESTS;
use crate::{Result, WiresightError};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of requests to retain in the shared log
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    /// Extra headers applied to CLI-issued requests
    #[serde(default)]
    pub headers: Vec<HeaderConfig>,
}

/// A single configured request header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

fn default_max_requests() -> usize {
    DEFAULT_MAX_REQUESTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            headers: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WiresightError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| WiresightError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(WiresightError::Config(
                "max_requests must be greater than 0".to_string(),
            ));
        }

        for (i, header) in self.headers.iter().enumerate() {
            if header.name.is_empty() {
                return Err(WiresightError::Config(format!(
                    "Header {i}: name cannot be empty"
                )));
            }
        }

        Ok(())
    }
}
