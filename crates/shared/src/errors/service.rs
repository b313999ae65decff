use crate::errors::{cache::CacheError, repository::RepositoryError};
use std::fmt;
use thiserror::Error;
use validator::ValidationErrors;

/// Client-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    InternalError,
}

/// Why a resale listing was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResaleRejection {
    NonPositivePrice,
    PriceAboveCeiling { price: i64, ceiling: i64 },
    /// Listing in a currency other than the ticket type's own.
    CurrencyMismatch { expected: String, got: String },
    AlreadyListed,
    AlreadyUsed,
}

impl fmt::Display for ResaleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResaleRejection::NonPositivePrice => write!(f, "resell price must be positive"),
            ResaleRejection::PriceAboveCeiling { price, ceiling } => {
                write!(f, "resell price {price} exceeds the allowed maximum {ceiling}")
            }
            ResaleRejection::CurrencyMismatch { expected, got } => {
                write!(f, "resell currency {got} does not match ticket currency {expected}")
            }
            ResaleRejection::AlreadyListed => write!(f, "ticket is already listed for resale"),
            ResaleRejection::AlreadyUsed => write!(f, "ticket has already been used"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepositoryError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resale rejected: {0}")]
    ResaleRejected(ResaleRejection),

    #[error(
        "Not enough tickets of type {ticket_type_id}: requested={requested}, available={available}"
    )]
    InsufficientAvailability {
        ticket_type_id: i32,
        requested: u32,
        available: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_)
            | ServiceError::BadRequest(_)
            | ServiceError::ResaleRejected(_) => ErrorKind::BadRequest,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) | ServiceError::InsufficientAvailability { .. } => {
                ErrorKind::Conflict
            }
            ServiceError::Repo(repo_err) => match repo_err {
                RepositoryError::NotFound => ErrorKind::NotFound,
                RepositoryError::Conflict(_) => ErrorKind::Conflict,
                RepositoryError::Sqlx(_) | RepositoryError::Custom(_) => ErrorKind::InternalError,
            },
            ServiceError::Cache(_) | ServiceError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let messages = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();

        ServiceError::Validation(messages)
    }
}
