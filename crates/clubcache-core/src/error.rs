use thiserror::Error;

use crate::api::ApiError;

/// Why a repository `load` did not produce data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A coalesced caller gave up waiting for the load already in flight.
    #[error("Timed out waiting for the in-flight load of {key}")]
    WaitTimedOut { key: String },

    /// The in-flight load ended without reporting an outcome.
    #[error("The in-flight load of {key} was abandoned")]
    Abandoned { key: String },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Api(e) if e.is_not_found())
    }
}
