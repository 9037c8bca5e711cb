//! Test utilities: scripted encryption and in-memory verification nodes.

use crate::adapters::{
    InMemoryPeerRegistry, RecordingAlertSink, RegistryNameResolver, TokioTimerScheduler,
};
use crate::domain::{Peer, VerificationConfig, VerificationState, VerificationToken};
use crate::ports::PeerRegistry;
use crate::roster::PeerMetadata;
use crate::service::{PeerVerificationService, VerificationPorts};
use async_trait::async_trait;
use shared_bus::{ActionChannel, InMemoryMesh};
use shared_crypto::{
    CryptoError, EciesEncryption, EncryptionKeyPair, EncryptionPublicKey, EncryptionSecretKey,
    EncryptionService,
};
use shared_types::{PeerId, SessionKind, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Error type for test fixtures.
pub type FixtureError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// ScriptedEncryption
// ============================================================================

/// What `ScriptedEncryption::decrypt_string` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptScript {
    /// Really decrypt.
    Real,
    /// Ignore the ciphertext and return this value.
    Fixed(String),
    /// Always fail.
    Fail,
}

/// Real ECIES encryption with a scripted decrypt step.
#[derive(Debug)]
pub struct ScriptedEncryption {
    inner: EciesEncryption,
    decrypt: DecryptScript,
    fail_encrypt: bool,
    decrypt_calls: AtomicUsize,
}

impl ScriptedEncryption {
    fn with(decrypt: DecryptScript, fail_encrypt: bool) -> Self {
        Self {
            inner: EciesEncryption::new(),
            decrypt,
            fail_encrypt,
            decrypt_calls: AtomicUsize::new(0),
        }
    }

    /// Behaves like `EciesEncryption`.
    #[must_use]
    pub fn real() -> Self {
        Self::with(DecryptScript::Real, false)
    }

    /// Every decrypt returns `value`.
    #[must_use]
    pub fn decrypting_to(value: impl Into<String>) -> Self {
        Self::with(DecryptScript::Fixed(value.into()), false)
    }

    /// Every decrypt fails.
    #[must_use]
    pub fn failing_decrypt() -> Self {
        Self::with(DecryptScript::Fail, false)
    }

    /// Every encrypt fails.
    #[must_use]
    pub fn failing_encrypt() -> Self {
        Self::with(DecryptScript::Real, true)
    }

    /// Number of decrypt calls so far.
    #[must_use]
    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EncryptionService for ScriptedEncryption {
    async fn encrypt_string(
        &self,
        public_key: &EncryptionPublicKey,
        plaintext: &str,
    ) -> Result<Vec<u8>, CryptoError> {
        if self.fail_encrypt {
            return Err(CryptoError::EncryptionFailed("scripted failure".into()));
        }
        self.inner.encrypt_string(public_key, plaintext).await
    }

    async fn decrypt_string(
        &self,
        private_key: &EncryptionSecretKey,
        ciphertext: &[u8],
    ) -> Result<String, CryptoError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        match &self.decrypt {
            DecryptScript::Real => self.inner.decrypt_string(private_key, ciphertext).await,
            DecryptScript::Fixed(value) => Ok(value.clone()),
            DecryptScript::Fail => Err(CryptoError::DecryptionFailed("scripted failure".into())),
        }
    }
}

// ============================================================================
// TestNode
// ============================================================================

/// One node on an in-memory mesh with its own registry and alert recorder.
pub struct TestNode {
    /// Short name, also used as the custom username peers store.
    pub name: String,
    /// Connection id on the mesh.
    pub peer_id: PeerId,
    /// Identity.
    pub user_id: UserId,
    /// Encryption identity.
    pub keys: EncryptionKeyPair,
    /// Action channel.
    pub channel: ActionChannel,
    /// This node's view of its peers.
    pub registry: Arc<InMemoryPeerRegistry>,
    /// Alerts shown on this node.
    pub alerts: Arc<RecordingAlertSink>,
    /// Verification service.
    pub service: Arc<PeerVerificationService>,
}

impl TestNode {
    /// Join `mesh` as `peer-<name>` and start verification.
    ///
    /// # Errors
    ///
    /// Fails on an empty name or if the service cannot start.
    pub fn spawn(
        mesh: &InMemoryMesh,
        name: &str,
        session: SessionKind,
        encryption: Arc<dyn EncryptionService>,
        config: VerificationConfig,
    ) -> Result<Self, FixtureError> {
        let peer_id = PeerId::new(format!("peer-{name}"))?;
        let user_id = UserId::new(format!("user-{name}"))?;
        let keys = EncryptionKeyPair::generate()?;

        let (transport, inbound) = mesh.join(peer_id.clone());
        let channel = ActionChannel::spawn(transport, inbound);

        let registry = Arc::new(InMemoryPeerRegistry::new());
        let alerts = Arc::new(RecordingAlertSink::new());
        let ports = VerificationPorts {
            registry: registry.clone(),
            encryption,
            alerts: alerts.clone(),
            names: Arc::new(RegistryNameResolver::new(registry.clone())),
            timers: Arc::new(TokioTimerScheduler::new()),
        };
        let service =
            PeerVerificationService::start(&channel, session, keys.secret().clone(), ports, config)?;

        Ok(Self {
            name: name.to_owned(),
            peer_id,
            user_id,
            keys,
            channel,
            registry,
            alerts,
            service,
        })
    }

    /// Store `other` in this node's registry with a known token.
    pub fn learn(&self, other: &TestNode, token: &str) -> Peer {
        let peer = Peer::with_token(
            other.peer_id.clone(),
            other.user_id.clone(),
            other.keys.public_key(),
            VerificationToken::new(token),
        )
        .with_custom_username(other.name.clone());
        self.registry.insert_peer(peer.clone());
        peer
    }

    /// This node's current entry for `other`.
    #[must_use]
    pub fn entry_for(&self, other: &TestNode) -> Option<Peer> {
        self.registry.peer(&other.peer_id)
    }

    /// Verification state this node holds for `other`.
    #[must_use]
    pub fn state_of(&self, other: &TestNode) -> Option<VerificationState> {
        self.entry_for(other).map(|peer| peer.verification_state)
    }

    /// Roster announcement for this node.
    #[must_use]
    pub fn metadata(&self) -> PeerMetadata {
        PeerMetadata::new(
            self.user_id.clone(),
            &self.keys.public_key(),
            Some(self.name.clone()),
        )
    }
}

/// Poll `condition` every 5ms, up to two seconds.
///
/// Returns whether it became true.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
