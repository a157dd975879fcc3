//! Tracker configuration errors

use thiserror::Error;

/// Why a tracker stayed Uninitialized
///
/// Never propagated: the tracker logs it and goes inert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("tracker has no identifier")]
    MissingIdentifier,

    #[error("tracker {0} has no action trigger")]
    MissingTrigger(String),

    #[error("tracker {0} has no output sink")]
    MissingOutput(String),
}
