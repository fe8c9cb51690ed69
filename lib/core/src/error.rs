use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Start number cannot be greater than end number: {start} > {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("Invalid even/odd value '{0}'. Must be 'even', 'odd', or 'all'")]
    InvalidParity(String),

    #[error("Administrative unit not found: {0}")]
    UnitNotFound(u64),

    #[error("Team not found: {0}")]
    TeamNotFound(u64),

    #[error("Street segment not found: {0}")]
    SegmentNotFound(u64),

    #[error("Cannot delete team {0} with assigned street segments")]
    TeamHasSegments(u64),

    #[error("Cannot delete administrative unit {0} with assigned teams")]
    UnitHasTeams(u64),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Catalog lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Errors caused by the caller's input rather than by the system.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::InvalidRange { .. } | Error::InvalidParity(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UnitNotFound(_)
                | Error::TeamNotFound(_)
                | Error::SegmentNotFound(_)
                | Error::SnapshotNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
