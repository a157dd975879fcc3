//! TallyBoard - timer-driven trackers feeding a shared tally
//!
//! Each tracker counts one source into a shared [`tallystore::Aggregator`]
//! and cycles between an Idle and a highlighted Active phase on timers.
//! Every change to any counter republishes the grand total.
//!
//! # Modules
//!
//! - [`tracker`] - the per-source state machine and its host collaborators
//! - [`scheduler`] - cancellable timers (tokio or virtual clock)
//! - [`board`] - wires trackers, aggregator and totals display together
//! - [`display`] - text rendering of entries and totals
//! - [`console`] - terminal implementations of the collaborators
//! - [`simulate`] - virtual-clock playback of the phase cycles
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod board;
pub mod cli;
pub mod config;
pub mod console;
pub mod display;
pub mod scheduler;
pub mod simulate;
pub mod tracker;

pub use board::{Action, Board, ParseActionError, TOTALS_LABEL};
pub use config::Config;
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use tracker::{Phase, Tracker, TrackerConfig, TrackerError, TrackerParts};
