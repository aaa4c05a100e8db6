//! Facility construction errors.
//!
//! Malformed facilities are rejected when built, never deep inside a run.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacilityError {
    #[error("slot count must be at least 1")]
    ZeroSlots,

    #[error("server count must be at least 1")]
    ZeroServers,
}
