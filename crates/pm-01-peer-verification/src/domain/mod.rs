//! Domain Layer - Verification state machine with no I/O
//!
//! This module contains the pure parts of the handshake:
//! - The `Peer` entity and its partial `PeerUpdate`
//! - Verification tokens
//! - Owned timer handles (scheduling lives behind a port)
//! - The single-slot scheduling buffer
//! - Transition rules for echoes and timeouts

pub mod config;
pub mod entities;
pub mod errors;
pub mod scheduler;
pub mod timer;
pub mod token;
pub mod transitions;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use scheduler::*;
pub use timer::*;
pub use token::*;
pub use transitions::*;
