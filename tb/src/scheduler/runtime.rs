//! Real-time scheduler backed by tokio timers

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use super::{Scheduler, TimerHandle, TimerTask};

/// Spawns one sleeping task per timer on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    next_id: Arc<AtomicU64>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Scheduler for the runtime the caller is running on, if any
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(timer_id = id, delay_ms = delay.as_millis() as u64, "TokioScheduler::schedule: called");
        let (handle, guard) = TimerHandle::pair(id);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if guard.try_fire() {
                debug!(timer_id = id, "TokioScheduler: timer fired");
                task();
            }
        });
        handle.on_cancel(move || join.abort())
    }
}
