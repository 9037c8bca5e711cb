//! tokio-backed `TimerScheduler`.

use crate::domain::{TimerControl, TimerHandle, TimerId};
use crate::ports::{TimerCallback, TimerScheduler};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::trace;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Schedules each timer as a sleeping task on the current runtime.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioTimerScheduler {
    next_id: AtomicU64,
}

impl TokioTimerScheduler {
    /// Create a scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerScheduler for TokioTimerScheduler {
    fn schedule(&self, after: Duration, on_fire: TimerCallback) -> TimerHandle {
        let id = TimerId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let state = Arc::new(AtomicU8::new(ARMED));

        let task_state = state.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Losing this race means the timer was cancelled.
            if task_state
                .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                trace!(timer = %id, "Timer fired");
                on_fire(id).await;
            }
        });

        TimerHandle::new(
            id,
            Arc::new(TokioTimer {
                state,
                abort: task.abort_handle(),
            }),
        )
    }
}

struct TokioTimer {
    state: Arc<AtomicU8>,
    abort: AbortHandle,
}

impl TimerControl for TokioTimer {
    fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            self.abort.abort();
        }
        cancelled
    }

    fn is_live(&self) -> bool {
        self.state.load(Ordering::Acquire) == ARMED
    }
}
