use std::fmt;
use thiserror::Error;

use crate::store::{MatchId, StoreError};

/// A committed state transition of the match clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Resume,
    Pause,
    AutoPause,
    Reset,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Resume => "resume",
            Transition::Pause => "pause",
            Transition::AutoPause => "auto-pause",
            Transition::Reset => "reset",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ClockError {
    #[error("match {0} not found")]
    NotFound(MatchId),

    #[error("could not load match {id}: {source}")]
    Attach {
        id: MatchId,
        #[source]
        source: StoreError,
    },

    /// The store rejected a commit. The engine keeps its last confirmed
    /// baseline; the caller may retry the intent.
    #[error("{transition} was not saved: {source}")]
    CommitFailed {
        transition: Transition,
        #[source]
        source: StoreError,
    },

    #[error("refresh failed: {0}")]
    RefreshFailed(#[source] StoreError),
}

impl ClockError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClockError::NotFound(_) => false,
            ClockError::Attach { source, .. } => source.is_recoverable(),
            ClockError::CommitFailed { .. } => true,
            ClockError::RefreshFailed(_) => true,
        }
    }
}
