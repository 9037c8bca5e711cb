//! # Node Configuration
//!
//! Settings for a local verification mesh, loaded from TOML.
//!
//! ```toml
//! [verification]
//! timeout_ms = 10000
//!
//! [mesh]
//! session = "group"   # or "direct"
//! nodes = ["alice", "bob", "carol"]
//! settle_ms = 15000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional. `RUST_LOG` overrides `logging.level`.

use pm_01_peer_verification::{ConfigProvider, TomlConfigProvider, VerificationConfig};
use serde::Deserialize;
use shared_types::SessionKind;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Handshake settings.
    pub verification: VerificationConfig,
    /// Local mesh layout.
    pub mesh: MeshConfig,
    /// Log filter.
    pub logging: LoggingConfig,
}

/// Local mesh configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshConfig {
    /// Direct (two-party) or group session.
    pub session: SessionKind,
    /// Node names; each becomes `peer-<name>` on the mesh.
    pub nodes: Vec<String>,
    /// How long to wait for every pair to finish before reporting.
    pub settle: Duration,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            session: SessionKind::Group,
            nodes: vec!["alice".into(), "bob".into(), "carol".into()],
            settle: Duration::from_secs(15),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    mesh: MeshSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default)]
struct MeshSection {
    session: Option<String>,
    nodes: Option<Vec<String>>,
    settle_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingSection {
    level: Option<String>,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error on malformed TOML or an unusable value.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let verification = TomlConfigProvider::parse(content)?.verification_config();
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let defaults = MeshConfig::default();
        let session = match file.mesh.session {
            Some(raw) => SessionKind::from_str(&raw)
                .map_err(|e| ConfigError::Invalid(format!("mesh.session: {e}")))?,
            None => defaults.session,
        };

        let config = Self {
            verification,
            mesh: MeshConfig {
                session,
                nodes: file.mesh.nodes.unwrap_or(defaults.nodes),
                settle: file
                    .mesh
                    .settle_ms
                    .map_or(defaults.settle, Duration::from_millis),
            },
            logging: LoggingConfig {
                level: file
                    .logging
                    .level
                    .unwrap_or_else(|| LoggingConfig::default().level),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the mesh layout.
    ///
    /// # Errors
    ///
    /// `Invalid` if there are fewer than two nodes, a name is empty or
    /// repeated, or a direct session has more than two nodes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nodes = &self.mesh.nodes;
        if nodes.len() < 2 {
            return Err(ConfigError::Invalid(
                "mesh.nodes needs at least two nodes".into(),
            ));
        }
        if self.mesh.session.is_direct() && nodes.len() > 2 {
            return Err(ConfigError::Invalid(
                "a direct session has exactly two nodes".into(),
            ));
        }

        let mut seen = HashSet::new();
        for name in nodes {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("mesh.nodes contains an empty name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate node name: {name}")));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML syntax or type error.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Invalid `[verification]` section.
    #[error(transparent)]
    Verification(#[from] pm_01_peer_verification::ConfigError),
    /// Well-formed but unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}
