//! # Mesh Container
//!
//! Holds every local node with its channel, registry, verification service
//! and roster, all joined to one in-memory mesh.
//!
//! ## Wiring per node
//!
//! ```text
//! InMemoryMesh ──join──→ MeshTransport ──→ ActionChannel
//!                                             │
//!                     ┌───────────────────────┼───────────────────┐
//!                     ↓                       ↓                   ↓
//!         PeerVerificationService        PeerRoster        (other features)
//!                     │                       │
//!                     └──→ InMemoryPeerRegistry ←┘
//! ```

pub mod config;
pub mod node;

pub use config::{ConfigError, LoggingConfig, MeshConfig, NodeConfig};
pub use node::{LoggedAlerts, MeshNode, NodeError, PeerStatus};

use pm_01_peer_verification::{PeerRegistry, VerificationState};
use shared_bus::InMemoryMesh;
use std::sync::Arc;
use tracing::{debug, info};

/// All local nodes on one mesh.
pub struct MeshContainer {
    /// Configuration the nodes were built from.
    pub config: NodeConfig,
    mesh: Arc<InMemoryMesh>,
    nodes: Vec<MeshNode>,
}

impl MeshContainer {
    /// Join every configured node to a fresh mesh.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if a node name is not a valid identifier, a key pair cannot be
    /// generated, or a service cannot register its actions.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let mesh = Arc::new(InMemoryMesh::new());
        let nodes = config
            .mesh
            .nodes
            .iter()
            .map(|name| MeshNode::start(&mesh, name, config.mesh.session, config.verification))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            nodes = nodes.len(),
            session = ?config.mesh.session,
            "Local mesh assembled"
        );
        Ok(Self {
            config,
            mesh,
            nodes,
        })
    }

    /// The nodes, in configuration order.
    #[must_use]
    pub fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    /// Look up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&MeshNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Every node broadcasts its metadata.
    ///
    /// # Errors
    ///
    /// Fails if a node's announcement cannot be sent.
    pub async fn announce_all(&self) -> Result<(), NodeError> {
        for node in &self.nodes {
            let delivered = node.roster.announce(None).await?;
            debug!(node = %node.name, delivered, "Metadata announced");
        }
        Ok(())
    }

    /// Schedule one never-challenged peer per node.
    ///
    /// The scheduling slot keeps only the latest request, so peers learned
    /// in a burst can be skipped. Peers that failed or timed out are left
    /// alone.
    ///
    /// # Returns
    ///
    /// Number of peers scheduled.
    pub fn schedule_unchallenged(&self) -> usize {
        let mut scheduled = 0;
        for node in &self.nodes {
            if node.service.scheduled_peer_id().is_some() {
                continue;
            }
            let candidate = node.registry.peer_list().into_iter().find(|peer| {
                peer.verification_state == VerificationState::Unverified
                    && peer.encrypted_verification_token.is_none()
            });
            if let Some(peer) = candidate {
                debug!(node = %node.name, peer_id = %peer.peer_id, "Scheduling unchallenged peer");
                node.service.verify_peer(&peer);
                scheduled += 1;
            }
        }
        scheduled
    }

    /// Disconnect a node from the mesh; every other node forgets it.
    ///
    /// Returns true if the node was connected.
    pub fn disconnect(&self, name: &str) -> bool {
        let Some(leaving) = self.node(name) else {
            return false;
        };
        if !self.mesh.leave(&leaving.peer_id) {
            return false;
        }
        for node in self.nodes.iter().filter(|node| node.name != name) {
            node.roster.on_peer_left(&leaving.peer_id);
        }
        info!(node = %name, "Node disconnected");
        true
    }

    /// Every node's view of every peer.
    #[must_use]
    pub fn statuses(&self) -> Vec<PeerStatus> {
        self.nodes.iter().flat_map(MeshNode::statuses).collect()
    }

    /// True once every pair of connected nodes has verified each other.
    #[must_use]
    pub fn fully_verified(&self) -> bool {
        let connected = self.mesh.peer_count();
        self.nodes.iter().all(|node| {
            let peers = node.registry.peer_list();
            peers.len() + 1 >= connected && peers.iter().all(|peer| peer.is_verified())
        })
    }

    /// Total alerts shown across nodes.
    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.nodes.iter().map(|node| node.alerts.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_01_peer_verification::VerificationConfig;
    use shared_types::SessionKind;
    use std::time::Duration;

    async fn settle(container: &MeshContainer) -> bool {
        for _ in 0..200 {
            if container.fully_verified() {
                return true;
            }
            container.schedule_unchallenged();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        container.fully_verified()
    }

    fn config(session: SessionKind, nodes: &[&str]) -> NodeConfig {
        NodeConfig {
            verification: VerificationConfig::with_timeout(Duration::from_secs(5)),
            mesh: MeshConfig {
                session,
                nodes: nodes.iter().map(|n| n.to_string()).collect(),
                settle: Duration::from_secs(2),
            },
            logging: LoggingConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_group_mesh_fully_verifies() {
        let container =
            MeshContainer::new(config(SessionKind::Group, &["alice", "bob", "carol", "dave"]))
                .unwrap();
        container.announce_all().await.unwrap();

        assert!(settle(&container).await);
        assert_eq!(container.statuses().len(), 12);
        assert_eq!(container.alert_count(), 0);
    }

    #[tokio::test]
    async fn test_direct_pair_verifies() {
        let container = MeshContainer::new(config(SessionKind::Direct, &["alice", "bob"])).unwrap();
        container.announce_all().await.unwrap();

        assert!(settle(&container).await);
        assert_eq!(container.statuses().len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_removes_node_everywhere() {
        let container =
            MeshContainer::new(config(SessionKind::Group, &["alice", "bob", "carol"])).unwrap();
        container.announce_all().await.unwrap();
        assert!(settle(&container).await);

        assert!(container.disconnect("carol"));
        assert!(!container.disconnect("carol"));
        assert!(!container.disconnect("nobody"));

        assert_eq!(container.node("alice").unwrap().registry.len(), 1);
        assert_eq!(container.node("bob").unwrap().registry.len(), 1);
    }
}
