//! Error taxonomy for the data-access core.

use thiserror::Error;

/// Failure of a core database operation.
///
/// `Query` carries what the engine reported so callers can render a
/// detailed notice; `Cancelled` is a distinguished outcome for queries
/// killed through the cancellation side channel, not a generic failure.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    #[error("database not connected")]
    NotConnected,

    #[error("{message}")]
    Query {
        message: String,
        detail: Option<String>,
        code: Option<String>,
        position: Option<usize>,
    },

    #[error("query canceled")]
    Cancelled,

    #[error("{0}")]
    Unsupported(String),
}

impl DbError {
    pub fn query(message: impl Into<String>) -> Self {
        DbError::Query {
            message: message.into(),
            detail: None,
            code: None,
            position: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DbError::Cancelled)
    }
}
