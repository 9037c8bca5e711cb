//! # Adapters Layer
//!
//! Concrete implementations of the driven ports:
//!
//! - `registry` - In-memory peer registry behind one mutex
//! - `timer` - tokio-backed cancellable timers
//! - `alerts` - Tracing and recording alert sinks
//! - `names` - Display names from the registry, with derived fallbacks
//! - `config` - Static and TOML configuration providers

pub mod alerts;
pub mod config;
pub mod names;
pub mod registry;
pub mod timer;

pub use alerts::{RecordedAlert, RecordingAlertSink, TracingAlertSink};
pub use config::StaticConfigProvider;
#[cfg(feature = "toml-config")]
pub use config::{ConfigError, TomlConfigProvider};
pub use names::{derive_display_name, RegistryNameResolver};
pub use registry::InMemoryPeerRegistry;
pub use timer::TokioTimerScheduler;
