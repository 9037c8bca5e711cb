//! # Node Runtime Library
//!
//! Exposes the mesh container for the `node-runtime` binary and its tests.
//!
//! ## Modules
//!
//! - `container/` - Node configuration and the local mesh of verifying nodes

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod container;

pub use container::{
    ConfigError, LoggedAlerts, LoggingConfig, MeshConfig, MeshContainer, MeshNode, NodeConfig,
    NodeError, PeerStatus,
};
