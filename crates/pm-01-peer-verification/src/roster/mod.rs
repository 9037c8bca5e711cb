//! # Peer Roster
//!
//! Learns who is on the other end of each connection. Every node announces
//! its user id, encryption public key and optional display name under
//! `PEER_METADATA`; the roster turns announcements into registry entries with
//! a fresh verification token and hands them to the verification service.
//!
//! A node replies with its own announcement the first time it hears from a
//! peer, so two nodes learn each other whichever one speaks first.

use crate::domain::{Peer, PeerUpdate, VerificationError};
use crate::ports::{PeerRegistry, PeerVerificationApi};
use serde::{Deserialize, Serialize};
use shared_bus::{ActionChannel, ActionId, ActionSender, Json};
use shared_crypto::EncryptionPublicKey;
use shared_types::{PeerId, SessionKind, UserId};
use std::slice;
use std::sync::Arc;
use tracing::{debug, info};

/// Roster announcement action.
pub const PEER_METADATA: ActionId = ActionId::new("META");

/// What a node announces about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMetadata {
    /// Identity of the announcing user.
    pub user_id: UserId,
    /// Hex-encoded compressed encryption public key.
    pub public_key: String,
    /// Name the user chose, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_username: Option<String>,
}

impl PeerMetadata {
    /// Announcement for a local identity.
    pub fn new(
        user_id: UserId,
        public_key: &EncryptionPublicKey,
        custom_username: Option<String>,
    ) -> Self {
        Self {
            user_id,
            public_key: public_key.to_hex(),
            custom_username,
        }
    }
}

/// Keeps the peer registry in step with announcements and departures.
pub struct PeerRoster {
    local: PeerMetadata,
    registry: Arc<dyn PeerRegistry>,
    verification: Arc<dyn PeerVerificationApi>,
    send_metadata: ActionSender<Json<PeerMetadata>>,
}

impl PeerRoster {
    /// Register the announcement handler in the verification session's
    /// namespace.
    ///
    /// # Errors
    ///
    /// `VerificationError::Action` if the action cannot be registered.
    pub fn start(
        channel: &ActionChannel,
        local: PeerMetadata,
        verification: Arc<dyn PeerVerificationApi>,
    ) -> Result<Arc<Self>, VerificationError> {
        let namespace = verification.session().namespace();
        let send_metadata = channel.sender::<Json<PeerMetadata>>(PEER_METADATA, namespace)?;

        let roster = Arc::new(Self {
            local,
            registry: verification.registry(),
            verification,
            send_metadata,
        });

        let handler = Arc::downgrade(&roster);
        channel.register(
            PEER_METADATA,
            namespace,
            move |Json(metadata): Json<PeerMetadata>, sender: PeerId| {
                let roster = handler.upgrade();
                async move {
                    match roster {
                        Some(roster) => roster
                            .handle_metadata(metadata, sender)
                            .await
                            .map_err(Into::into),
                        None => Ok(()),
                    }
                }
            },
        )?;

        Ok(roster)
    }

    /// Announce the local identity. `None` broadcasts.
    ///
    /// # Returns
    ///
    /// Number of peers the announcement was handed to.
    ///
    /// # Errors
    ///
    /// `VerificationError::Action` if sending fails.
    pub async fn announce(&self, targets: Option<&[PeerId]>) -> Result<usize, VerificationError> {
        Ok(self
            .send_metadata
            .send(&Json(self.local.clone()), targets)
            .await?)
    }

    /// Forget a peer whose connection closed, cancelling any live timer.
    pub fn on_peer_left(&self, peer_id: &PeerId) -> Option<Peer> {
        let removed = self.registry.remove_peer(peer_id);
        if let Some(peer) = &removed {
            info!(peer_id = %peer_id, user_id = %peer.user_id, "Peer left roster");
        }
        removed
    }

    /// The local announcement.
    #[must_use]
    pub fn local(&self) -> &PeerMetadata {
        &self.local
    }

    /// Known peers.
    #[must_use]
    pub fn peers(&self) -> Vec<Peer> {
        self.registry.peer_list()
    }

    pub(crate) async fn handle_metadata(
        &self,
        metadata: PeerMetadata,
        sender: PeerId,
    ) -> Result<(), VerificationError> {
        let public_key = EncryptionPublicKey::from_hex(&metadata.public_key).map_err(|e| {
            VerificationError::InvalidMetadata {
                peer_id: sender.clone(),
                reason: e.to_string(),
            }
        })?;

        if let Some(existing) = self.registry.peer(&sender) {
            if existing.user_id == metadata.user_id && existing.public_key == public_key {
                if existing.custom_username != metadata.custom_username {
                    self.registry.update_peer(
                        &sender,
                        PeerUpdate::new().custom_username(metadata.custom_username),
                    );
                }
                return Ok(());
            }
            debug!(peer_id = %sender, "Peer identity changed, verification restarts");
        }

        let mut peer = Peer::new(sender.clone(), metadata.user_id, public_key);
        peer.custom_username = metadata.custom_username;

        let first_contact = self.registry.insert_peer(peer.clone()).is_none();
        info!(peer_id = %sender, user_id = %peer.user_id, "Peer joined roster");

        if first_contact {
            self.announce(Some(slice::from_ref(&sender))).await?;
        }

        match self.verification.session() {
            SessionKind::Direct => self.verification.init_peer_verification(&peer).await,
            SessionKind::Group => {
                self.verification.verify_peer(&peer);
                Ok(())
            }
        }
    }
}
