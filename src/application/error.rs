use thiserror::Error;

use crate::domain::{ParcelId, TransitionRule};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0} does not exist")]
    NotFound(ParcelId),

    #[error("Invalid status transition for {id}: {rule}")]
    InvalidTransition { id: ParcelId, rule: TransitionRule },

    #[error("{0} was modified concurrently too many times, giving up")]
    Conflict(ParcelId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("User \"{0}\" not found. Run \"create-user {0} employee\" first")]
    UnknownIdentity(String),

    #[error("User \"{0}\" already exists in the wallet")]
    IdentityAlreadyExists(String),

    #[error("Admin identity not found. Run \"init\" first")]
    AdminNotEnrolled,

    #[error("Stored record for {key} is not a valid parcel: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::InvalidTransition { .. } => "INVALID_TRANSITION",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::InvalidArgument(_) => "INVALID_ARGUMENT",
            LedgerError::UnknownIdentity(_) => "UNKNOWN_IDENTITY",
            LedgerError::IdentityAlreadyExists(_) => "IDENTITY_EXISTS",
            LedgerError::AdminNotEnrolled => "ADMIN_NOT_ENROLLED",
            LedgerError::Corrupt { .. } | LedgerError::Storage(_) => "STORAGE",
        }
    }
}
