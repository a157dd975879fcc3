//! Cancellable timer handles

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Owner's side of a scheduled timer
///
/// Dropping the handle leaves the timer running; call [`TimerHandle::cancel`]
/// to stop it.
#[must_use = "a TimerHandle is the only way to cancel its timer"]
pub struct TimerHandle {
    id: u64,
    state: Arc<AtomicU8>,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

/// Scheduler's side of a timer, consulted right before the task runs
#[derive(Debug)]
pub struct TimerGuard {
    state: Arc<AtomicU8>,
}

impl TimerHandle {
    /// Create a linked handle/guard pair for timer `id`
    pub fn pair(id: u64) -> (Self, TimerGuard) {
        let state = Arc::new(AtomicU8::new(PENDING));
        let guard = TimerGuard {
            state: Arc::clone(&state),
        };
        (
            Self {
                id,
                state,
                on_cancel: None,
            },
            guard,
        )
    }

    /// Extra cleanup run on a successful cancel (e.g. aborting a task)
    pub fn on_cancel(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Still waiting to fire
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Stop the timer; returns false if it already fired
    pub fn cancel(mut self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            if let Some(f) = self.on_cancel.take() {
                f();
            }
        }
        cancelled
    }
}

impl TimerGuard {
    /// Claim the right to run the task; false if the timer was cancelled
    pub fn try_fire(&self) -> bool {
        self.state
            .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_fire_then_cancel_fails() {
        let (handle, guard) = TimerHandle::pair(1);
        assert!(handle.is_pending());
        assert!(guard.try_fire());
        assert!(!handle.is_pending());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancel_then_fire_fails() {
        let (handle, guard) = TimerHandle::pair(2);
        assert!(handle.cancel());
        assert!(!guard.try_fire());
        assert!(!guard.is_pending());
    }

    #[test]
    fn test_on_cancel_runs_only_when_cancelled() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let (handle, guard) = TimerHandle::pair(3);
        let handle = handle.on_cancel(move || flag.store(true, Ordering::SeqCst));
        assert!(guard.try_fire());
        assert!(!handle.cancel());
        assert!(!ran.load(Ordering::SeqCst));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let (handle, _guard) = TimerHandle::pair(4);
        let handle = handle.on_cancel(move || flag.store(true, Ordering::SeqCst));
        assert!(handle.cancel());
        assert!(ran.load(Ordering::SeqCst));
    }
}
