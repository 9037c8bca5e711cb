//! One local node: identity, channel, registry, verification and roster.

use pm_01_peer_verification::{
    AlertSeverity, AlertSink, InMemoryPeerRegistry, PeerMetadata, PeerRegistry,
    PeerRoster, PeerVerificationService, RecordingAlertSink, RegistryNameResolver,
    TokioTimerScheduler, TracingAlertSink, VerificationConfig, VerificationError,
    VerificationPorts, VerificationState,
};
use shared_bus::{ActionChannel, InMemoryMesh};
use shared_crypto::{CryptoError, EciesEncryption, EncryptionKeyPair};
use shared_types::{IdentifierError, PeerId, SessionKind, UserId};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised while building or driving a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Node name does not make a valid identifier.
    #[error("Invalid node identity: {0}")]
    Identifier(#[from] IdentifierError),

    /// Key generation failed.
    #[error("Key generation failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Verification service or roster failure.
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Logs every alert and keeps a copy for the run summary.
#[derive(Debug, Default)]
pub struct LoggedAlerts {
    log: TracingAlertSink,
    recorded: RecordingAlertSink,
}

impl LoggedAlerts {
    /// Number of alerts shown so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    /// True if no alert was shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

impl AlertSink for LoggedAlerts {
    fn show_alert(&self, message: &str, severity: AlertSeverity) {
        self.log.show_alert(message, severity);
        self.recorded.show_alert(message, severity);
    }
}

/// How one node sees one of its peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatus {
    /// Observing node.
    pub node: String,
    /// Observed peer's connection id.
    pub peer_id: PeerId,
    /// Name the peer announced, if any.
    pub peer_name: Option<String>,
    /// Current verification state.
    pub state: VerificationState,
}

/// A node joined to a local mesh.
pub struct MeshNode {
    /// Configured name.
    pub name: String,
    /// Connection id (`peer-<name>`).
    pub peer_id: PeerId,
    /// Identity (`user-<name>`).
    pub user_id: UserId,
    /// Action channel bound to the mesh.
    pub channel: ActionChannel,
    /// This node's peer registry.
    pub registry: Arc<InMemoryPeerRegistry>,
    /// Alerts raised on this node.
    pub alerts: Arc<LoggedAlerts>,
    /// Verification service.
    pub service: Arc<PeerVerificationService>,
    /// Announcement handling.
    pub roster: Arc<PeerRoster>,
}

impl MeshNode {
    /// Join `mesh` and start the verification service and roster.
    ///
    /// # Errors
    ///
    /// See [`NodeError`].
    pub fn start(
        mesh: &InMemoryMesh,
        name: &str,
        session: SessionKind,
        config: VerificationConfig,
    ) -> Result<Self, NodeError> {
        let peer_id = PeerId::new(format!("peer-{name}"))?;
        let user_id = UserId::new(format!("user-{name}"))?;
        let keys = EncryptionKeyPair::generate()?;

        let (transport, inbound) = mesh.join(peer_id.clone());
        let channel = ActionChannel::spawn(transport, inbound);

        let registry = Arc::new(InMemoryPeerRegistry::new());
        let alerts = Arc::new(LoggedAlerts::default());
        let names = RegistryNameResolver::new(registry.clone())
            .with_local_user(user_id.clone(), Some(name.to_owned()));
        let ports = VerificationPorts {
            registry: registry.clone(),
            encryption: Arc::new(EciesEncryption::new()),
            alerts: alerts.clone(),
            names: Arc::new(names),
            timers: Arc::new(TokioTimerScheduler::new()),
        };

        let service =
            PeerVerificationService::start(&channel, session, keys.secret().clone(), ports, config)?;
        let metadata = PeerMetadata::new(user_id.clone(), &keys.public_key(), Some(name.to_owned()));
        let roster = PeerRoster::start(&channel, metadata, service.clone())?;

        info!(node = %name, peer_id = %peer_id, "Node started");

        Ok(Self {
            name: name.to_owned(),
            peer_id,
            user_id,
            channel,
            registry,
            alerts,
            service,
            roster,
        })
    }

    /// This node's view of every known peer.
    #[must_use]
    pub fn statuses(&self) -> Vec<PeerStatus> {
        self.registry
            .peer_list()
            .into_iter()
            .map(|peer| PeerStatus {
                node: self.name.clone(),
                peer_id: peer.peer_id,
                peer_name: peer.custom_username,
                state: peer.verification_state,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_node_identity_follows_name() {
        let mesh = InMemoryMesh::new();
        let node = MeshNode::start(
            &mesh,
            "alice",
            SessionKind::Group,
            VerificationConfig::default(),
        )
        .unwrap();

        assert_eq!(node.peer_id.as_str(), "peer-alice");
        assert_eq!(node.user_id.as_str(), "user-alice");
        assert_eq!(node.roster.local().custom_username.as_deref(), Some("alice"));
        assert!(node.statuses().is_empty());
        assert!(node.alerts.is_empty());
    }

    #[test]
    fn test_alerts_are_recorded() {
        let alerts = LoggedAlerts::default();
        alerts.show_alert("Verification for bob timed out", AlertSeverity::Error);
        assert_eq!(alerts.len(), 1);
    }
}
