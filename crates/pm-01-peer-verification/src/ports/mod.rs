//! # Ports Layer - Hexagonal Architecture Interfaces
//!
//! ## Driving Ports (API - Inbound)
//!
//! - `PeerVerificationApi` - Start and schedule handshakes
//!
//! ## Driven Ports (SPI - Outbound)
//!
//! - `PeerRegistry` - Shared per-peer state with atomic partial updates
//! - `AlertSink` - User-facing alerts
//! - `DisplayNameResolver` - Human-readable names for alerts
//! - `TimerScheduler` - "Run after duration" with cancellable handles
//! - `ConfigProvider` - Verification settings

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
