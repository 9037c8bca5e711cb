//! # Timer Handles
//!
//! A verification timeout is an owned handle returned by a "schedule after
//! duration" primitive. The registry stores the handle on the peer; replacing
//! or clearing it cancels the previous one.
//!
//! Cancellation is idempotent, and a timer that has already fired ignores
//! cancellation.

use std::fmt;
use std::sync::Arc;

/// Identifier of one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Create from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Control side of a scheduled timer, implemented by the scheduler adapter.
pub trait TimerControl: Send + Sync {
    /// Stop the timer if it has neither fired nor been cancelled.
    ///
    /// Returns true if this call cancelled it.
    fn cancel(&self) -> bool;

    /// True while the timer is armed.
    fn is_live(&self) -> bool;
}

/// Owned handle to a scheduled verification timeout.
#[derive(Clone)]
pub struct TimerHandle {
    id: TimerId,
    control: Arc<dyn TimerControl>,
}

impl TimerHandle {
    /// Wrap a scheduler's control object.
    pub fn new(id: TimerId, control: Arc<dyn TimerControl>) -> Self {
        Self { id, control }
    }

    /// Timer identifier.
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancel the timer. Safe to call any number of times.
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }

    /// True while the timer is armed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.control.is_live()
    }
}

impl PartialEq for TimerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TimerHandle {}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Timer control that only records cancellation.
    #[derive(Default)]
    pub(crate) struct ManualTimer {
        cancelled: AtomicBool,
        pub(crate) cancel_calls: AtomicUsize,
    }

    impl TimerControl for ManualTimer {
        fn cancel(&self) -> bool {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            !self.cancelled.swap(true, Ordering::SeqCst)
        }

        fn is_live(&self) -> bool {
            !self.cancelled.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn manual_handle(id: u64) -> (TimerHandle, Arc<ManualTimer>) {
        let control = Arc::new(ManualTimer::default());
        (TimerHandle::new(TimerId::new(id), control.clone()), control)
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (handle, control) = manual_handle(1);
        assert!(handle.is_live());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(!handle.is_live());
        assert_eq!(control.cancel_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handles_compare_by_id() {
        let (a, _) = manual_handle(7);
        let (b, _) = manual_handle(7);
        let (c, _) = manual_handle(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.id().to_string(), "timer-7");
    }
}
