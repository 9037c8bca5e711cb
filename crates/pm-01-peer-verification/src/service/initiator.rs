//! Initiator side: send the challenge, check the echo, handle timeouts.

use super::core::PeerVerificationService;
use crate::domain::{
    can_start_verification, evaluate_echo, timeout_applies, EchoOutcome, Peer, PeerUpdate,
    TimerHandle, TimerId, VerificationError, VerificationState,
};
use crate::ports::{AlertSeverity, UpdateOutcome};
use shared_types::PeerId;
use std::slice;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

impl PeerVerificationService {
    /// Challenge `peer` now.
    ///
    /// 1. Encrypt the peer's token under its public key
    /// 2. Arm the timeout
    /// 3. Record `PENDING`, the ciphertext and the timer, then release the
    ///    timer's commit gate
    /// 4. Send the ciphertext to that peer only
    ///
    /// A verified peer is left alone. If the registry entry changed since
    /// `peer` was read (new token, or verified meanwhile), nothing is sent.
    ///
    /// # Errors
    ///
    /// - `PeerNotFound` if the peer left the registry
    /// - `Crypto` if encryption fails
    /// - `Action` if the challenge cannot be sent
    pub async fn init_peer_verification(&self, peer: &Peer) -> Result<(), VerificationError> {
        if !can_start_verification(peer) {
            debug!(peer_id = %peer.peer_id, "Peer already verified, handshake skipped");
            return Ok(());
        }

        let encrypted = self
            .ports
            .encryption
            .encrypt_string(&peer.public_key, peer.verification_token.as_str())
            .await?;

        let (timer, committed) = self.arm_timeout(&peer.peer_id);
        let expected = &peer.verification_token;
        let outcome = self.ports.registry.update_peer_if(
            &peer.peer_id,
            &|current| can_start_verification(current) && &current.verification_token == expected,
            PeerUpdate::new()
                .state(VerificationState::Pending)
                .encrypted_token(encrypted.clone())
                .timer(timer.clone()),
        );

        match outcome {
            UpdateOutcome::Applied => {
                // The receiver is gone only if the timer was aborted.
                let _ = committed.send(());
            }
            UpdateOutcome::Rejected => {
                timer.cancel();
                debug!(peer_id = %peer.peer_id, "Peer changed before challenge, not sent");
                return Ok(());
            }
            UpdateOutcome::NotFound => {
                timer.cancel();
                return Err(VerificationError::PeerNotFound(peer.peer_id.clone()));
            }
        }

        let delivered = self
            .send_encrypted
            .send(&encrypted, Some(slice::from_ref(&peer.peer_id)))
            .await?;
        debug!(
            peer_id = %peer.peer_id,
            timer = %timer.id(),
            delivered,
            "Verification challenge sent"
        );
        Ok(())
    }

    /// Handle an echoed token from `sender`.
    ///
    /// # Errors
    ///
    /// - `PeerNotFound` if the sender is not in the registry (no mutation)
    /// - `TokenMismatch` if the echo differs from the stored token
    pub(crate) async fn handle_raw_token(
        &self,
        received: String,
        sender: PeerId,
    ) -> Result<(), VerificationError> {
        let peer = self
            .ports
            .registry
            .peer(&sender)
            .ok_or_else(|| VerificationError::PeerNotFound(sender.clone()))?;

        match evaluate_echo(&peer, &received) {
            EchoOutcome::NotPending => {
                debug!(
                    peer_id = %sender,
                    state = %peer.verification_state,
                    "Echo from peer not awaiting verification dropped"
                );
                Ok(())
            }
            EchoOutcome::Match => {
                self.confirm(&peer);
                Ok(())
            }
            EchoOutcome::Mismatch => self.reject(&peer, received),
        }
    }

    fn confirm(&self, peer: &Peer) {
        let expected = peer.verification_token.as_str();
        // Clearing the timer cancels it.
        let outcome = self.ports.registry.update_peer_if(
            &peer.peer_id,
            &|current| evaluate_echo(current, expected) == EchoOutcome::Match,
            PeerUpdate::new()
                .state(VerificationState::Verified)
                .clear_timer(),
        );

        if outcome.is_applied() {
            info!(peer_id = %peer.peer_id, user_id = %peer.user_id, "Peer verified");
        } else {
            debug!(peer_id = %peer.peer_id, ?outcome, "Peer changed before confirmation, echo dropped");
        }
    }

    fn reject(&self, peer: &Peer, received: String) -> Result<(), VerificationError> {
        let outcome = self.ports.registry.update_peer_if(
            &peer.peer_id,
            &Peer::is_pending,
            PeerUpdate::new()
                .state(VerificationState::Unverified)
                .clear_timer(),
        );

        if outcome.is_applied() {
            let name = self.ports.names.display_username(&peer.user_id);
            self.ports
                .alerts
                .show_alert(&format!("Verification for {name} failed"), AlertSeverity::Error);
        }

        Err(VerificationError::TokenMismatch {
            peer_id: peer.peer_id.clone(),
            expected: peer.verification_token.to_string(),
            received,
        })
    }

    /// Schedule the timeout for `peer_id`.
    ///
    /// An expiry waits on the returned gate until the timer handle has been
    /// committed to the registry. A dropped gate means the attempt was
    /// abandoned and the expiry does nothing.
    fn arm_timeout(&self, peer_id: &PeerId) -> (TimerHandle, oneshot::Sender<()>) {
        let (committed, gate) = oneshot::channel::<()>();
        let service = self.me.clone();
        let peer_id = peer_id.clone();
        let timer = self.ports.timers.schedule(
            self.config.timeout,
            Box::new(move |timer_id| {
                Box::pin(async move {
                    if gate.await.is_err() {
                        return;
                    }
                    if let Some(service) = service.upgrade() {
                        service.on_verification_timeout(&peer_id, timer_id);
                    }
                })
            }),
        );
        (timer, committed)
    }

    /// Reset a peer whose echo never came.
    ///
    /// Only applies while the peer is `PENDING` under this exact timer, so a
    /// replaced or cancelled timer firing late changes nothing.
    ///
    /// # Returns
    ///
    /// True if the peer was reset.
    pub(crate) fn on_verification_timeout(&self, peer_id: &PeerId, timer_id: TimerId) -> bool {
        let outcome = self.ports.registry.update_peer_if(
            peer_id,
            &|current| timeout_applies(current, timer_id),
            PeerUpdate::new()
                .state(VerificationState::Unverified)
                .clear_timer(),
        );
        if !outcome.is_applied() {
            debug!(peer_id = %peer_id, timer = %timer_id, ?outcome, "Stale verification timer ignored");
            return false;
        }

        let err = VerificationError::VerificationTimeout {
            peer_id: peer_id.clone(),
        };
        warn!(peer_id = %peer_id, "{err}");

        let name = self.display_name(peer_id);
        self.ports
            .alerts
            .show_alert(&format!("Verification for {name} timed out"), AlertSeverity::Error);
        true
    }

    fn display_name(&self, peer_id: &PeerId) -> String {
        match self.ports.registry.peer(peer_id) {
            Some(peer) => self.ports.names.display_username(&peer.user_id),
            None => peer_id.to_string(),
        }
    }
}
