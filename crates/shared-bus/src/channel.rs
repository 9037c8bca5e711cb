//! # Action Channel
//!
//! Registration, typed sending, and the dispatch loop that turns inbound
//! transport frames into handler calls.
//!
//! ## Dispatch
//!
//! One dispatcher task reads the transport's inbound frames and forwards each
//! to a per-key lane. A lane runs its handler calls one at a time, so frames
//! for the same `(action, namespace)` are handled in arrival order, while
//! different actions proceed independently. Every handler call runs in its
//! own task; an `Err` or a panic is logged at the lane and the lane moves on.

use crate::action::{ActionId, ActionKey};
use crate::codec::{ActionPayload, CodecError};
use crate::transport::{InboundFrame, PeerTransport, TransportError};
use crate::MAX_ACTION_KEY_LEN;
use shared_types::{Namespace, PeerId};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Error type handlers return. Logged at the dispatch boundary.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;
type RawHandler = Arc<dyn Fn(Vec<u8>, PeerId) -> HandlerFuture + Send + Sync>;
type LaneSender = mpsc::UnboundedSender<(PeerId, Vec<u8>)>;

/// Errors from registering or sending actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The namespaced key exceeds `MAX_ACTION_KEY_LEN`.
    #[error("Action key {key} is {len} bytes, limit is {max}")]
    KeyTooLong {
        /// The offending wire key.
        key: String,
        /// Its length in bytes.
        len: usize,
        /// The limit.
        max: usize,
    },

    /// Payload could not be encoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Transport refused the frame.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Snapshot of channel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Frames handed to the transport (one per recipient).
    pub frames_sent: u64,
    /// Frames whose handler completed with `Ok`.
    pub frames_dispatched: u64,
    /// Frames whose handler returned `Err`, failed to decode, or panicked.
    pub handler_failures: u64,
    /// Frames dropped because no handler was registered for their key.
    pub frames_unrouted: u64,
}

#[derive(Default)]
struct Counters {
    frames_sent: AtomicU64,
    frames_dispatched: AtomicU64,
    handler_failures: AtomicU64,
    frames_unrouted: AtomicU64,
}

struct ChannelInner {
    /// Outbound transport.
    transport: Arc<dyn PeerTransport>,

    /// Current handler per wire key.
    routes: RwLock<HashMap<ActionKey, RawHandler>>,

    counters: Counters,
}

impl ChannelInner {
    fn route(&self, key: &ActionKey) -> Option<RawHandler> {
        self.routes.read().ok()?.get(key).cloned()
    }
}

/// Typed, namespaced messaging over a peer transport.
///
/// Cloning is cheap; all clones share routes and the dispatcher.
#[derive(Clone)]
pub struct ActionChannel {
    inner: Arc<ChannelInner>,
}

impl ActionChannel {
    /// Create a channel and spawn its dispatcher on the current runtime.
    ///
    /// `inbound` is the transport's stream of received frames. The dispatcher
    /// stops when it is closed or when the channel and all its senders have
    /// been dropped.
    #[must_use]
    pub fn spawn(
        transport: Arc<dyn PeerTransport>,
        inbound: mpsc::UnboundedReceiver<InboundFrame>,
    ) -> Self {
        let inner = Arc::new(ChannelInner {
            transport,
            routes: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        });
        tokio::spawn(run_dispatcher(Arc::downgrade(&inner), inbound));
        Self { inner }
    }

    /// Register a receive handler for `action` in `namespace`.
    ///
    /// Registering the same `(action, namespace)` again replaces the previous
    /// handler; frames already queued are handled by whichever handler is
    /// current when they are dispatched.
    ///
    /// # Returns
    ///
    /// A sender for the same action and namespace.
    ///
    /// # Errors
    ///
    /// `ActionError::KeyTooLong` if the namespaced key exceeds
    /// `MAX_ACTION_KEY_LEN`.
    pub fn register<T, F, Fut>(
        &self,
        action: ActionId,
        namespace: Namespace,
        on_receive: F,
    ) -> Result<ActionSender<T>, ActionError>
    where
        T: ActionPayload,
        F: Fn(T, PeerId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let key = validated_key(action, namespace)?;

        let handler: RawHandler = Arc::new(move |bytes: Vec<u8>, sender: PeerId| -> HandlerFuture {
            match T::from_frame(&bytes) {
                Ok(payload) => Box::pin(on_receive(payload, sender)),
                Err(e) => Box::pin(async move { Err(Box::new(e) as HandlerError) }),
            }
        });

        if let Ok(mut routes) = self.inner.routes.write() {
            if routes.insert(key.clone(), handler).is_some() {
                debug!(action = %key, "Action handler replaced");
            } else {
                debug!(action = %key, "Action handler registered");
            }
        }

        Ok(self.sender_for(key))
    }

    /// Get a sender without registering a receive handler.
    ///
    /// # Errors
    ///
    /// `ActionError::KeyTooLong` if the namespaced key is too long.
    pub fn sender<T: ActionPayload>(
        &self,
        action: ActionId,
        namespace: Namespace,
    ) -> Result<ActionSender<T>, ActionError> {
        let key = validated_key(action, namespace)?;
        Ok(self.sender_for(key))
    }

    /// Remove the handler for `action` in `namespace`.
    ///
    /// Returns true if one was registered.
    pub fn unregister(&self, action: ActionId, namespace: Namespace) -> bool {
        let key = ActionKey::new(action, namespace);
        self.inner
            .routes
            .write()
            .map(|mut routes| routes.remove(&key).is_some())
            .unwrap_or(false)
    }

    /// Returns true if a handler is registered for `action` in `namespace`.
    #[must_use]
    pub fn is_registered(&self, action: ActionId, namespace: Namespace) -> bool {
        self.inner.route(&ActionKey::new(action, namespace)).is_some()
    }

    /// Local connection identifier.
    #[must_use]
    pub fn local_peer_id(&self) -> &PeerId {
        self.inner.transport.local_peer_id()
    }

    /// Peers currently connected.
    #[must_use]
    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.inner.transport.connected_peers()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> ChannelStats {
        let c = &self.inner.counters;
        ChannelStats {
            frames_sent: c.frames_sent.load(Ordering::Relaxed),
            frames_dispatched: c.frames_dispatched.load(Ordering::Relaxed),
            handler_failures: c.handler_failures.load(Ordering::Relaxed),
            frames_unrouted: c.frames_unrouted.load(Ordering::Relaxed),
        }
    }

    fn sender_for<T: ActionPayload>(&self, key: ActionKey) -> ActionSender<T> {
        ActionSender {
            key,
            inner: self.inner.clone(),
            _payload: PhantomData,
        }
    }
}

fn validated_key(action: ActionId, namespace: Namespace) -> Result<ActionKey, ActionError> {
    let key = ActionKey::new(action, namespace);
    if key.len() > MAX_ACTION_KEY_LEN {
        return Err(ActionError::KeyTooLong {
            len: key.len(),
            key: key.to_string(),
            max: MAX_ACTION_KEY_LEN,
        });
    }
    Ok(key)
}

/// Sending half of a registered action.
pub struct ActionSender<T> {
    key: ActionKey,
    inner: Arc<ChannelInner>,
    _payload: PhantomData<fn(T)>,
}

impl<T> Clone for ActionSender<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            inner: self.inner.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T: ActionPayload> ActionSender<T> {
    /// Send `payload`.
    ///
    /// `targets = None` broadcasts to every connected peer; otherwise only the
    /// listed peers receive it and unknown ids are skipped.
    ///
    /// # Returns
    ///
    /// The number of peers the frame was handed to.
    pub async fn send(&self, payload: &T, targets: Option<&[PeerId]>) -> Result<usize, ActionError> {
        let frame = payload.to_frame()?;
        let delivered = self.inner.transport.send(&self.key, frame, targets).await?;

        self.inner
            .counters
            .frames_sent
            .fetch_add(delivered as u64, Ordering::Relaxed);
        debug!(action = %self.key, delivered, "Action sent");

        Ok(delivered)
    }

    /// Wire key this sender sends under.
    #[must_use]
    pub fn key(&self) -> &ActionKey {
        &self.key
    }
}

async fn run_dispatcher(inner: Weak<ChannelInner>, mut inbound: mpsc::UnboundedReceiver<InboundFrame>) {
    let mut lanes: HashMap<ActionKey, LaneSender> = HashMap::new();

    while let Some(frame) = inbound.recv().await {
        let Some(channel) = inner.upgrade() else {
            break;
        };

        if channel.route(&frame.key).is_none() {
            channel
                .counters
                .frames_unrouted
                .fetch_add(1, Ordering::Relaxed);
            debug!(action = %frame.key, sender = %frame.sender, "No handler for action, frame dropped");
            continue;
        }

        let lane = lanes
            .entry(frame.key.clone())
            .or_insert_with(|| spawn_lane(Arc::downgrade(&channel), frame.key.clone()));

        if lane.send((frame.sender, frame.bytes)).is_err() {
            error!(action = %frame.key, "Dispatch lane closed, frame dropped");
            lanes.remove(&frame.key);
        }
    }

    debug!("Action dispatcher stopped");
}

fn spawn_lane(inner: Weak<ChannelInner>, key: ActionKey) -> LaneSender {
    let (tx, mut rx) = mpsc::unbounded_channel::<(PeerId, Vec<u8>)>();

    tokio::spawn(async move {
        while let Some((sender, bytes)) = rx.recv().await {
            let Some(channel) = inner.upgrade() else {
                break;
            };
            let Some(handler) = channel.route(&key) else {
                channel
                    .counters
                    .frames_unrouted
                    .fetch_add(1, Ordering::Relaxed);
                debug!(action = %key, sender = %sender, "Handler removed before dispatch, frame dropped");
                continue;
            };

            let counters = &channel.counters;
            let from = sender.clone();
            match tokio::spawn(async move { handler(bytes, from).await }).await {
                Ok(Ok(())) => {
                    counters.frames_dispatched.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Err(e)) => {
                    counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(action = %key, sender = %sender, error = %e, "Action handler failed");
                }
                Err(e) if e.is_panic() => {
                    counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(action = %key, sender = %sender, "Action handler panicked");
                }
                Err(e) => {
                    counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                    debug!(action = %key, sender = %sender, error = %e, "Action handler cancelled");
                }
            }
        }
    });

    tx
}
