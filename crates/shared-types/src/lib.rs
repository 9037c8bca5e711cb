//! # Shared Types Crate
//!
//! Identifiers and session types used across the Peer-Mesh crates.
//!
//! ## Design Principles
//!
//! - **Connection vs. Identity**: `PeerId` names one transport connection,
//!   `UserId` names the identity behind it. A user may reconnect under a new
//!   `PeerId`; nothing keyed by `PeerId` survives the reconnect.
//! - **Namespaces**: every action on the wire is scoped by a `Namespace`
//!   derived from the `SessionKind`, so direct and group traffic never mix.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
