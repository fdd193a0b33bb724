//! The module contains the error the engine can throw.
//!
//! The errors are grouped by [`ErrorKind`]:
//!
//! - validation: [`InvalidMonth`], [`InvalidAmount`], [`InvalidCategory`] and
//!   [`InvalidInput`], raised before the store is touched.
//! - [`KeyNotFound`] thrown when a budget or expense does not exist.
//! - [`Forbidden`] thrown when the record exists but belongs to another user.
//! - [`Database`] wraps every store failure.
//!
//!  [`InvalidMonth`]: EngineError::InvalidMonth
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidCategory`]: EngineError::InvalidCategory
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification of an [`EngineError`], for callers that map errors
/// onto a transport (status codes, exit codes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    /// The store could not be reached. Retryable by the caller.
    StoreUnavailable,
    /// Any other store failure.
    Store,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMonth(_)
            | Self::InvalidAmount(_)
            | Self::InvalidCategory(_)
            | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Database(DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) => {
                ErrorKind::StoreUnavailable
            }
            Self::Database(_) => ErrorKind::Store,
        }
    }

    /// `true` when retrying the same call later may succeed.
    ///
    /// The engine never retries store outages itself.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StoreUnavailable
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidMonth(a), Self::InvalidMonth(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
