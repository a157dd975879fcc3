//! Virtual-clock playback of a board's phase cycles
//!
//! The clock stops at every pending timer deadline, so a phase change is seen
//! at the instant it happens however short the phase is.

use std::time::Duration;

use tracing::debug;

use crate::board::Board;
use crate::scheduler::ManualScheduler;
use crate::tracker::Phase;

/// One tracker moving from one phase to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Virtual time of the change
    pub at: Duration,
    pub identifier: String,
    pub from: Phase,
    pub to: Phase,
}

/// Advance `scheduler` by `duration`, reporting each phase change on `board`
///
/// No single clock jump is longer than `max_step`. A pair of zero-length
/// phases flips twice at one instant and is not reported. Returns the number
/// of transitions reported.
pub fn play<F>(board: &Board, scheduler: &ManualScheduler, duration: Duration, max_step: Duration, mut report: F) -> usize
where
    F: FnMut(&Transition),
{
    let max_step = max_step.max(Duration::from_millis(1));
    let end = scheduler.now() + duration;
    debug!(end_ms = end.as_millis() as u64, "simulate::play: called");

    let mut last = board.phases();
    let mut reported = 0;
    while scheduler.now() < end {
        let now = scheduler.now();
        let stop = match scheduler.next_deadline() {
            Some(deadline) if deadline > now => deadline.min(now + max_step),
            // Still due after an advance: the firing budget ran out
            _ => now + max_step,
        };
        scheduler.advance(stop.min(end) - now);

        let current = board.phases();
        for ((identifier, from), (_, to)) in last.iter().zip(&current) {
            if from != to {
                report(&Transition {
                    at: scheduler.now(),
                    identifier: identifier.clone(),
                    from: *from,
                    to: *to,
                });
                reported += 1;
            }
        }
        last = current;
    }
    reported
}
