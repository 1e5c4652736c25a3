//! Error types for the ordo crate.

use thiserror::Error;

/// Errors that fail a `select` call.
///
/// Everything except [`QueryError::Raised`] is a construction error: the
/// query could not be run at all. `Raised` carries a data error that the
/// `raise_exceptions` policy turned fatal, unchanged.
#[derive(Debug, Error)]
pub enum QueryError<E> {
    /// The source could not produce an iterator.
    #[error("could not convert input source to an iterator: {0}")]
    InvalidSource(String),

    /// `order_key` named a key the first item of the stream doesn't have.
    #[error("error while ordering: could not find '{key}' on {shape}")]
    KeyNotFound { key: String, shape: String },

    /// More than one of `order_by`, `order_key`, `order_value` was set.
    #[error("at most one of order_by, order_key or order_value may be set, got {count}")]
    AmbiguousOrder { count: usize },

    /// Two order values could not be compared while sorting.
    #[error("'<' not supported between {left} and {right} order values")]
    Incomparable {
        left: &'static str,
        right: &'static str,
    },

    /// An error item met while `raise_exceptions` was set.
    #[error("{0}")]
    Raised(E),
}

impl<E> QueryError<E> {
    /// Returns the raised data error, if this is [`QueryError::Raised`].
    pub fn into_raised(self) -> Option<E> {
        match self {
            QueryError::Raised(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` for errors about the query itself rather than the data.
    pub fn is_construction(&self) -> bool {
        !matches!(self, QueryError::Raised(_))
    }
}

/// Result type for ordo operations.
pub type Result<T, E> = std::result::Result<T, QueryError<E>>;
