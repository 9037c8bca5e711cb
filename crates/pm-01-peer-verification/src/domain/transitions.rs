//! Pure transition rules for the verification handshake.

use super::entities::{Peer, VerificationState};
use super::timer::TimerId;

/// Result of checking an echoed token against the registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    /// Peer is not waiting for an echo (late, duplicate or never challenged).
    NotPending,
    /// Echo equals the stored token.
    Match,
    /// Echo differs from the stored token.
    Mismatch,
}

/// Classify an echoed token. The `PENDING` check comes first.
#[must_use]
pub fn evaluate_echo(peer: &Peer, received: &str) -> EchoOutcome {
    if peer.verification_state != VerificationState::Pending {
        return EchoOutcome::NotPending;
    }
    if peer.verification_token.matches(received) {
        EchoOutcome::Match
    } else {
        EchoOutcome::Mismatch
    }
}

/// A timer may reset the peer only while it is `PENDING` and the timer is the
/// one currently stored.
#[must_use]
pub fn timeout_applies(peer: &Peer, timer: TimerId) -> bool {
    peer.is_pending() && peer.timer_id() == Some(timer)
}

/// A handshake may start for any peer that is not already verified.
#[must_use]
pub fn can_start_verification(peer: &Peer) -> bool {
    !peer.is_verified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timer::tests::manual_handle;
    use crate::domain::{PeerUpdate, VerificationToken};
    use shared_crypto::EncryptionKeyPair;
    use shared_types::{PeerId, UserId};

    fn pending_peer(token: &str, timer: u64) -> Peer {
        let mut peer = Peer::with_token(
            PeerId::new("peer-b").unwrap(),
            UserId::new("user-b").unwrap(),
            EncryptionKeyPair::generate().unwrap().public_key(),
            VerificationToken::new(token),
        );
        let (handle, _) = manual_handle(timer);
        peer.apply(PeerUpdate::new().state(VerificationState::Pending).timer(handle));
        peer
    }

    #[test]
    fn test_echo_match_and_mismatch() {
        let peer = pending_peer("abc123", 1);
        assert_eq!(evaluate_echo(&peer, "abc123"), EchoOutcome::Match);
        assert_eq!(evaluate_echo(&peer, "wrong"), EchoOutcome::Mismatch);
    }

    #[test]
    fn test_echo_after_reset_is_not_pending() {
        let mut peer = pending_peer("abc123", 1);
        peer.apply(PeerUpdate::new().state(VerificationState::Unverified).clear_timer());
        assert_eq!(evaluate_echo(&peer, "abc123"), EchoOutcome::NotPending);
    }

    #[test]
    fn test_echo_when_verified_is_not_pending() {
        let mut peer = pending_peer("abc123", 1);
        peer.apply(PeerUpdate::new().state(VerificationState::Verified));
        assert_eq!(evaluate_echo(&peer, "wrong"), EchoOutcome::NotPending);
        assert!(!can_start_verification(&peer));
    }

    #[test]
    fn test_only_current_timer_applies() {
        let peer = pending_peer("abc123", 5);
        assert!(timeout_applies(&peer, TimerId::new(5)));
        assert!(!timeout_applies(&peer, TimerId::new(4)));
    }
}
