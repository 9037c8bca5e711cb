//! # Shared Bus - Peer Action Channel
//!
//! Typed, namespaced messaging over a set of live peer connections.
//!
//! ## Model
//!
//! ```text
//! ┌──────────────┐  register(action, ns)  ┌───────────────┐   bytes + key   ┌───────────────┐
//! │   Feature    │ ─────────────────────→ │ ActionChannel │ ──────────────→ │ PeerTransport │
//! │ (verifier,   │ ←── ActionSender<T> ── │  (dispatcher) │ ←── frames ──── │  (data chans) │
//! │  roster, …)  │ ←── on_receive(T, id) ─│               │                 │               │
//! └──────────────┘                        └───────────────┘                 └───────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Keyed dispatch:** frames are routed on `(ActionId, Namespace)`; the
//!   payload type is fixed per action by convention.
//! - **Ordering:** frames for the same action key are handled one at a time,
//!   in arrival order. The transport preserves per-sender order.
//! - **Isolation:** handler errors and panics are caught at the dispatch
//!   boundary and logged. They never reach the transport.
//! - **Fire and forget:** at-most-once per transmission, no retries.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod action;
pub mod channel;
pub mod codec;
pub mod mesh;
pub mod transport;

// Re-export main types
pub use action::{ActionId, ActionKey};
pub use channel::{ActionChannel, ActionError, ActionSender, ChannelStats, HandlerError};
pub use codec::{ActionPayload, CodecError, Json, PayloadFormat};
pub use mesh::{InMemoryMesh, MeshTransport};
pub use transport::{InboundFrame, PeerTransport, TransportError};

/// Maximum length in bytes of a namespaced action key (`"<ns>.<action>"`).
///
/// Matches the tag limit of common data-channel transports.
pub const MAX_ACTION_KEY_LEN: usize = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_key_fits_direct_namespace() {
        let key = ActionKey::new(ActionId::new("V_TKN_ENC"), shared_types::Namespace::Direct);
        assert!(key.as_str().len() <= MAX_ACTION_KEY_LEN);
    }
}
