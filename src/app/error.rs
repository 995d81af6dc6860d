use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the data layer.
///
/// "Not found" is deliberately absent: lookups report it as `None` and writes as an
/// affected-row count of zero.
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// The caller did not supply a required entity.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[source] sqlx::Error),

    #[error("failed to open database connection: {0}")]
    Connect(#[source] sqlx::Error),

    /// Driver-level failure while executing the procedure or decoding its rows.
    #[error("stored procedure {procedure} failed: {source}")]
    Procedure {
        procedure: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The procedure succeeded but left a required output parameter NULL.
    #[error("stored procedure {procedure} returned no value for output parameter {parameter}")]
    MissingOutput {
        procedure: &'static str,
        parameter: &'static str,
    },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
}

impl DataAccessError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DataAccessError::InvalidArgument(_))
    }

    pub(crate) fn procedure(procedure: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| DataAccessError::Procedure { procedure, source }
    }
}

pub type DataAccessResult<T> = Result<T, DataAccessError>;
