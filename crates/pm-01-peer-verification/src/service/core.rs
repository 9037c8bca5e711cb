use crate::domain::{SchedulingBuffer, VerificationConfig, VerificationError};
use crate::ports::{AlertSink, DisplayNameResolver, PeerRegistry, TimerScheduler};
use parking_lot::Mutex;
use shared_bus::{ActionChannel, ActionId, ActionSender};
use shared_crypto::{EncryptionSecretKey, EncryptionService};
use shared_types::{PeerId, SessionKind};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tracing::info;

/// Challenge: the verification token encrypted under the responder's key.
pub const VERIFICATION_TOKEN_ENCRYPTED: ActionId = ActionId::new("V_TKN_ENC");

/// Echo: the decrypted token sent back to the initiator.
pub const VERIFICATION_TOKEN_RAW: ActionId = ActionId::new("V_TKN_RAW");

/// Collaborators the service drives.
#[derive(Clone)]
pub struct VerificationPorts {
    /// Shared per-peer state.
    pub registry: Arc<dyn PeerRegistry>,
    /// Asymmetric encryption capability.
    pub encryption: Arc<dyn EncryptionService>,
    /// User-facing alerts.
    pub alerts: Arc<dyn AlertSink>,
    /// Names used in alerts.
    pub names: Arc<dyn DisplayNameResolver>,
    /// Timeout scheduling.
    pub timers: Arc<dyn TimerScheduler>,
}

/// Peer verification for one session.
///
/// Created with [`PeerVerificationService::start`], which registers the two
/// handshake actions on the channel and starts the drain task for the
/// scheduling buffer. Handlers and timers hold weak references, so dropping
/// the last `Arc` stops the service.
///
/// # Example
///
/// ```rust,ignore
/// let service = PeerVerificationService::start(
///     &channel,
///     SessionKind::Group,
///     keys.secret().clone(),
///     ports,
///     VerificationConfig::default(),
/// )?;
///
/// // A peer was added to the registry
/// service.verify_peer(&peer);
/// ```
pub struct PeerVerificationService {
    pub(crate) me: Weak<Self>,
    pub(crate) session: SessionKind,
    pub(crate) private_key: EncryptionSecretKey,
    pub(crate) ports: VerificationPorts,
    pub(crate) config: VerificationConfig,
    pub(crate) send_encrypted: ActionSender<Vec<u8>>,
    pub(crate) send_raw: ActionSender<String>,
    pub(crate) scheduled: Mutex<SchedulingBuffer>,
    pub(crate) drain_signal: Arc<Notify>,
}

impl PeerVerificationService {
    /// Start verification for `session` on `channel`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `channel` - Action channel shared with other features
    /// * `session` - Selects the namespace and the scheduling policy
    /// * `private_key` - Key challenges to this node are encrypted under
    /// * `ports` - Registry, encryption, alerts, names and timers
    /// * `config` - Verification timeout
    ///
    /// # Errors
    ///
    /// `VerificationError::Action` if the actions cannot be registered.
    pub fn start(
        channel: &ActionChannel,
        session: SessionKind,
        private_key: EncryptionSecretKey,
        ports: VerificationPorts,
        config: VerificationConfig,
    ) -> Result<Arc<Self>, VerificationError> {
        let namespace = session.namespace();
        let send_encrypted = channel.sender::<Vec<u8>>(VERIFICATION_TOKEN_ENCRYPTED, namespace)?;
        let send_raw = channel.sender::<String>(VERIFICATION_TOKEN_RAW, namespace)?;

        let service = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            session,
            private_key,
            ports,
            config,
            send_encrypted,
            send_raw,
            scheduled: Mutex::new(SchedulingBuffer::new()),
            drain_signal: Arc::new(Notify::new()),
        });

        let responder = Arc::downgrade(&service);
        channel.register(
            VERIFICATION_TOKEN_ENCRYPTED,
            namespace,
            move |ciphertext: Vec<u8>, sender: PeerId| {
                let service = responder.upgrade();
                async move {
                    match service {
                        Some(service) => service
                            .handle_encrypted_token(ciphertext, sender)
                            .await
                            .map_err(Into::into),
                        None => Ok(()),
                    }
                }
            },
        )?;

        let initiator = Arc::downgrade(&service);
        channel.register(
            VERIFICATION_TOKEN_RAW,
            namespace,
            move |token: String, sender: PeerId| {
                let service = initiator.upgrade();
                async move {
                    match service {
                        Some(service) => service
                            .handle_raw_token(token, sender)
                            .await
                            .map_err(Into::into),
                        None => Ok(()),
                    }
                }
            },
        )?;

        let signal = service.drain_signal.clone();
        service
            .ports
            .registry
            .subscribe_commits(Arc::new(move || signal.notify_one()));
        tokio::spawn(run_drain_loop(
            Arc::downgrade(&service),
            service.drain_signal.clone(),
        ));

        info!(
            namespace = %namespace,
            timeout_ms = service.config.timeout.as_millis() as u64,
            "Peer verification started"
        );
        Ok(service)
    }

    /// Session this service verifies for.
    #[must_use]
    pub fn session(&self) -> SessionKind {
        self.session
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Registry the service reads and updates.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn PeerRegistry> {
        &self.ports.registry
    }
}

/// Drains the scheduling buffer each time the registry commits.
async fn run_drain_loop(service: Weak<PeerVerificationService>, signal: Arc<Notify>) {
    loop {
        signal.notified().await;
        let Some(service) = service.upgrade() else {
            break;
        };
        service.drain_scheduled().await;
    }
}
