use crate::domain::VerificationConfig;
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider.
///
/// Useful for testing and development. For config files, use
/// `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: VerificationConfig,
}

impl StaticConfigProvider {
    /// Create with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with the given config.
    #[must_use]
    pub fn with_config(mut self, config: VerificationConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn verification_config(&self) -> VerificationConfig {
        self.config
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading (requires "toml-config" feature)
// ============================================================================

#[cfg(feature = "toml-config")]
mod toml_config {
    use super::*;
    use crate::domain::DEFAULT_VERIFICATION_TIMEOUT_MS;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use thiserror::Error;

    /// Configuration file structure. Other sections are ignored.
    #[derive(Debug, Deserialize)]
    struct ConfigFile {
        #[serde(default)]
        verification: VerificationSection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct VerificationSection {
        timeout_ms: Option<u64>,
    }

    /// TOML-based configuration provider.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [verification]
    /// timeout_ms = 10000
    /// ```
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        config: VerificationConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if the file cannot be read or parsed.
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
        /// `Parse` on malformed TOML, `Invalid` on a zero timeout.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let timeout_ms = file
                .verification
                .timeout_ms
                .unwrap_or(DEFAULT_VERIFICATION_TIMEOUT_MS);
            if timeout_ms == 0 {
                return Err(ConfigError::Invalid(
                    "verification.timeout_ms must be greater than zero".into(),
                ));
            }

            Ok(Self {
                config: VerificationConfig::with_timeout(Duration::from_millis(timeout_ms)),
            })
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn verification_config(&self) -> VerificationConfig {
            self.config
        }
    }

    /// Errors that can occur during config loading.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
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
        /// Well-formed but unusable value.
        #[error("invalid config: {0}")]
        Invalid(String),
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_timeout() {
            let provider = TomlConfigProvider::parse(
                r#"
                [verification]
                timeout_ms = 2500

                [mesh]
                session = "group"
                "#,
            )
            .unwrap();
            assert_eq!(
                provider.verification_config().timeout,
                Duration::from_millis(2500)
            );
        }

        #[test]
        fn test_missing_section_uses_default() {
            let provider = TomlConfigProvider::parse("").unwrap();
            assert_eq!(provider.verification_config(), VerificationConfig::default());
        }

        #[test]
        fn test_zero_timeout_rejected() {
            let err = TomlConfigProvider::parse("[verification]\ntimeout_ms = 0").unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        }

        #[test]
        fn test_bad_toml_rejected() {
            let err = TomlConfigProvider::parse("[verification\n").unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
        }

        #[test]
        fn test_missing_file() {
            let err = TomlConfigProvider::load("/nonexistent/peer-mesh.toml").unwrap_err();
            assert!(matches!(err, ConfigError::Io { .. }));
        }
    }
}

#[cfg(feature = "toml-config")]
pub use toml_config::{ConfigError, TomlConfigProvider};
