//! Core entities: the remote `Peer` and its verification state.

use super::timer::{TimerHandle, TimerId};
use super::token::VerificationToken;
use shared_crypto::EncryptionPublicKey;
use shared_types::{PeerId, UserId};
use std::fmt;

/// Where a peer stands in the handshake.
///
/// `Unverified -> Pending -> Verified`, and `Pending -> Unverified` on
/// timeout or mismatch. Nothing leaves `Verified` while the connection lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerificationState {
    /// No successful handshake yet, or the last one failed.
    #[default]
    Unverified,
    /// Challenge sent, waiting for the echo.
    Pending,
    /// Peer proved it holds the private key for its public key.
    Verified,
}

impl VerificationState {
    /// Wire/display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "UNVERIFIED",
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
        }
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote participant, keyed by its connection id.
#[derive(Debug, Clone)]
pub struct Peer {
    /// Transport-level connection identifier.
    pub peer_id: PeerId,
    /// Identity-level identifier, used for display lookups.
    pub user_id: UserId,
    /// Key challenges to this peer are encrypted under.
    pub public_key: EncryptionPublicKey,
    /// Name the peer chose for itself, if any.
    pub custom_username: Option<String>,
    /// Secret this side expects back from the peer.
    pub verification_token: VerificationToken,
    /// Ciphertext most recently sent to the peer.
    pub encrypted_verification_token: Option<Vec<u8>>,
    /// Handshake state.
    pub verification_state: VerificationState,
    /// Live timeout, if a handshake is outstanding.
    pub verification_timer: Option<TimerHandle>,
}

impl Peer {
    /// A freshly discovered peer with a new random token.
    pub fn new(peer_id: PeerId, user_id: UserId, public_key: EncryptionPublicKey) -> Self {
        Self::with_token(peer_id, user_id, public_key, VerificationToken::generate())
    }

    /// A freshly discovered peer with a caller-chosen token.
    pub fn with_token(
        peer_id: PeerId,
        user_id: UserId,
        public_key: EncryptionPublicKey,
        verification_token: VerificationToken,
    ) -> Self {
        Self {
            peer_id,
            user_id,
            public_key,
            custom_username: None,
            verification_token,
            encrypted_verification_token: None,
            verification_state: VerificationState::Unverified,
            verification_timer: None,
        }
    }

    /// Set the peer's chosen display name.
    #[must_use]
    pub fn with_custom_username(mut self, name: impl Into<String>) -> Self {
        self.custom_username = Some(name.into());
        self
    }

    /// True while a challenge is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.verification_state == VerificationState::Pending
    }

    /// True once the handshake succeeded.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verification_state == VerificationState::Verified
    }

    /// Id of the stored timer, if any.
    #[must_use]
    pub fn timer_id(&self) -> Option<TimerId> {
        self.verification_timer.as_ref().map(TimerHandle::id)
    }

    /// Apply a partial update.
    ///
    /// Replacing or clearing the stored timer cancels the previous handle, so
    /// a peer never owns more than one live timer.
    pub fn apply(&mut self, update: PeerUpdate) {
        let PeerUpdate {
            verification_state,
            verification_timer,
            encrypted_verification_token,
            verification_token,
            custom_username,
        } = update;

        if let Some(state) = verification_state {
            self.verification_state = state;
        }
        if let Some(timer) = verification_timer {
            if let Some(previous) = self.verification_timer.take() {
                if timer.as_ref().map(TimerHandle::id) != Some(previous.id()) {
                    previous.cancel();
                }
            }
            self.verification_timer = timer;
        }
        if let Some(ciphertext) = encrypted_verification_token {
            self.encrypted_verification_token = Some(ciphertext);
        }
        if let Some(token) = verification_token {
            self.verification_token = token;
        }
        if let Some(name) = custom_username {
            self.custom_username = name;
        }
    }
}

/// Partial field update for one peer.
///
/// Unset fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct PeerUpdate {
    verification_state: Option<VerificationState>,
    verification_timer: Option<Option<TimerHandle>>,
    encrypted_verification_token: Option<Vec<u8>>,
    verification_token: Option<VerificationToken>,
    custom_username: Option<Option<String>>,
}

impl PeerUpdate {
    /// Empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake state.
    #[must_use]
    pub fn state(mut self, state: VerificationState) -> Self {
        self.verification_state = Some(state);
        self
    }

    /// Store a new timer, cancelling any previous one.
    #[must_use]
    pub fn timer(mut self, timer: TimerHandle) -> Self {
        self.verification_timer = Some(Some(timer));
        self
    }

    /// Drop the stored timer, cancelling it.
    #[must_use]
    pub fn clear_timer(mut self) -> Self {
        self.verification_timer = Some(None);
        self
    }

    /// Record the ciphertext sent to the peer.
    #[must_use]
    pub fn encrypted_token(mut self, ciphertext: Vec<u8>) -> Self {
        self.encrypted_verification_token = Some(ciphertext);
        self
    }

    /// Replace the expected token.
    #[must_use]
    pub fn token(mut self, token: VerificationToken) -> Self {
        self.verification_token = Some(token);
        self
    }

    /// Replace the peer's chosen display name.
    #[must_use]
    pub fn custom_username(mut self, name: Option<String>) -> Self {
        self.custom_username = Some(name);
        self
    }

    /// True if the update touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verification_state.is_none()
            && self.verification_timer.is_none()
            && self.encrypted_verification_token.is_none()
            && self.verification_token.is_none()
            && self.custom_username.is_none()
    }
}
