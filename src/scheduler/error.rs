//! Scheduler run errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that end a scheduler run before every vehicle completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("run deadline of {}ms exceeded with {remaining} vehicles unfinished", .deadline.as_millis())]
    DeadlineExceeded { remaining: usize, deadline: Duration },

    #[error("run cancelled with {remaining} vehicles unfinished")]
    Cancelled { remaining: usize },

    #[error("service task failed: {0}")]
    WorkerPanicked(String),
}

impl ScheduleError {
    /// Vehicles that had not completed the terminal stage, when known.
    pub fn remaining(&self) -> Option<usize> {
        match self {
            Self::DeadlineExceeded { remaining, .. } | Self::Cancelled { remaining } => {
                Some(*remaining)
            }
            Self::WorkerPanicked(_) => None,
        }
    }
}
