//! # Peer Verification Subsystem
//!
//! Lets each peer in a mesh confirm that another peer really holds the
//! private key for the public key it announced.
//!
//! ## Handshake
//!
//! The initiator encrypts a random token under the peer's public key and
//! sends it as `VERIFICATION_TOKEN_ENCRYPTED`. The responder decrypts it and
//! echoes the plaintext as `VERIFICATION_TOKEN_RAW`. A matching echo marks
//! the peer `VERIFIED`; a mismatch or a timeout resets it to `UNVERIFIED` and
//! raises an error alert.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Peer entity, tokens, timer handles, scheduling buffer,
//!   transition rules
//! - **Ports Layer:** Registry, alerts, names, timers, config
//! - **Service Layer:** Handshake wired to the action bus
//! - **Adapters Layer:** In-memory registry, tokio timers, alert sinks,
//!   config providers
//! - **Roster:** Peer announcements feeding the registry
//!
//! ## Features
//!
//! - `toml-config` - `TomlConfigProvider` (toml)
//! - `test-utils` - `ScriptedEncryption`, `TestNode`
//!
//! ## Example
//!
//! ```rust,ignore
//! use pm_01_peer_verification::{PeerRoster, PeerVerificationService, VerificationPorts};
//!
//! let service = PeerVerificationService::start(
//!     &channel,
//!     SessionKind::Group,
//!     keys.secret().clone(),
//!     ports,
//!     VerificationConfig::default(),
//! )?;
//! let roster = PeerRoster::start(&channel, local_metadata, service.clone())?;
//!
//! // Peers that answer get verified in the background
//! roster.announce(None).await?;
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod roster;
pub mod service;

/// Test utilities (ScriptedEncryption, TestNode)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain
pub use domain::{
    evaluate_echo, timeout_applies, EchoOutcome, Peer, PeerUpdate, SchedulingBuffer, TimerControl,
    TimerHandle, TimerId, VerificationConfig, VerificationError, VerificationState,
    VerificationToken, DEFAULT_VERIFICATION_TIMEOUT_MS,
};

// Port traits
pub use ports::{
    AlertSeverity, AlertSink, CommitListener, ConfigProvider, DisplayNameResolver, PeerRegistry,
    PeerVerificationApi, TimerCallback, TimerScheduler, UpdateOutcome,
};

// Service
pub use service::{
    PeerVerificationService, VerificationPorts, VERIFICATION_TOKEN_ENCRYPTED,
    VERIFICATION_TOKEN_RAW,
};

// Roster
pub use roster::{PeerMetadata, PeerRoster, PEER_METADATA};

// Adapters
pub use adapters::{
    derive_display_name, InMemoryPeerRegistry, RecordedAlert, RecordingAlertSink,
    RegistryNameResolver, StaticConfigProvider, TokioTimerScheduler, TracingAlertSink,
};

#[cfg(feature = "toml-config")]
pub use adapters::{ConfigError, TomlConfigProvider};
