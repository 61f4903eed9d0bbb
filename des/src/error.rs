//! Error types for the event loop

use crate::ActivityId;
use crate::pool::PoolError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid delay {delay}: delays must be finite and non-negative")]
    InvalidDelay { delay: f64 },

    #[error("horizon {horizon} is not at or after the clock at {now}")]
    InvalidHorizon { horizon: f64, now: f64 },

    #[error("no pending activities at t={at}")]
    Exhausted { at: f64 },

    #[error("activity {0} is not parked")]
    NotParked(ActivityId),

    #[error("server pool: {0}")]
    Pool(#[from] PoolError),
}
