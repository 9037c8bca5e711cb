//! # Peer Verification Service
//!
//! Wires the handshake state machine to the action bus, the encryption
//! capability and the peer registry.
//!
//! ## Message Flow
//!
//! ```text
//! Initiator (A)                                   Responder (B)
//! ─────────────                                   ─────────────
//! encrypt(B.pub, token)
//! arm timeout, B := PENDING
//!        ── VERIFICATION_TOKEN_ENCRYPTED ──→      decrypt(B.priv)
//!        ←──── VERIFICATION_TOKEN_RAW ─────       echo plaintext
//! compare with stored token
//!   match    → B := VERIFIED, timer cleared
//!   mismatch → B := UNVERIFIED, "failed" alert
//! no echo before timeout → B := UNVERIFIED, "timed out" alert
//! ```
//!
//! Both actions live in the session namespace (`dm` or `g`), so direct and
//! group handshakes never see each other's traffic.

mod api;
mod core;
mod initiator;
mod responder;
mod scheduling;

pub use core::{
    PeerVerificationService, VerificationPorts, VERIFICATION_TOKEN_ENCRYPTED,
    VERIFICATION_TOKEN_RAW,
};

#[cfg(test)]
mod tests;
