//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the verification subsystem **requires** the host
//! application to implement.

use crate::domain::{Peer, PeerUpdate, TimerHandle, TimerId, VerificationConfig};
use shared_types::{PeerId, UserId};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Peer Registry
// ============================================================================

/// Callback run after every registry commit.
pub type CommitListener = Arc<dyn Fn() + Send + Sync>;

/// Result of a guarded registry update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was applied and committed.
    Applied,
    /// The peer exists but the guard refused the update.
    Rejected,
    /// No peer with that id.
    NotFound,
}

impl UpdateOutcome {
    /// True if the update was committed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Shared per-peer state.
///
/// Every mutation is atomic per peer and followed by a commit notification.
/// Implementations serialize updates behind one lock and never hold it while
/// running listeners.
pub trait PeerRegistry: Send + Sync {
    /// Snapshot of one peer.
    fn peer(&self, peer_id: &PeerId) -> Option<Peer>;

    /// Snapshot of all peers, in insertion order.
    fn peer_list(&self) -> Vec<Peer>;

    /// Insert `peer`, replacing any entry with the same id.
    ///
    /// A replaced entry's live timer is cancelled.
    fn insert_peer(&self, peer: Peer) -> Option<Peer>;

    /// Remove a peer, cancelling its live timer.
    fn remove_peer(&self, peer_id: &PeerId) -> Option<Peer>;

    /// Apply `update` only if `guard` accepts the peer's current state.
    ///
    /// The check and the update happen under the same lock.
    fn update_peer_if(
        &self,
        peer_id: &PeerId,
        guard: &dyn Fn(&Peer) -> bool,
        update: PeerUpdate,
    ) -> UpdateOutcome;

    /// Apply `update` unconditionally.
    fn update_peer(&self, peer_id: &PeerId, update: PeerUpdate) -> UpdateOutcome {
        self.update_peer_if(peer_id, &|_| true, update)
    }

    /// Run `listener` after every commit.
    fn subscribe_commits(&self, listener: CommitListener);
}

// ============================================================================
// Alerts and Names
// ============================================================================

/// Severity of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertSeverity {
    /// Neutral notice.
    Info,
    /// Something went well.
    Success,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Presents alerts to the user (toast, console, test recorder).
pub trait AlertSink: Send + Sync {
    /// Show `message` with `severity`.
    fn show_alert(&self, message: &str, severity: AlertSeverity);
}

/// Resolves the name shown for a user.
pub trait DisplayNameResolver: Send + Sync {
    /// Human-readable name for `user_id`.
    fn display_username(&self, user_id: &UserId) -> String;
}

// ============================================================================
// Timers
// ============================================================================

/// Boxed future run when a timer fires.
pub type TimerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Work to run on expiry. Receives the id of the timer that fired.
pub type TimerCallback = Box<dyn FnOnce(TimerId) -> TimerFuture + Send>;

/// "Run after duration" primitive.
pub trait TimerScheduler: Send + Sync {
    /// Run `on_fire` once `after` has elapsed, unless the returned handle is
    /// cancelled first.
    fn schedule(&self, after: Duration, on_fire: TimerCallback) -> TimerHandle;
}

// ============================================================================
// Configuration
// ============================================================================

/// Source of verification settings.
pub trait ConfigProvider: Send + Sync {
    /// Current verification config.
    fn verification_config(&self) -> VerificationConfig;
}
