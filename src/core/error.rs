// Centralized error handling for the kiosk service

use crate::models::api::{ErrorResponse, API_VERSION};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Errors produced while turning a transport-encoded sample into a vector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Fingerprint is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("Expected a 256-byte (128 short) base64-encoded fingerprint, but its length was {actual} bytes")]
    WrongLength { actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("No enrolled users to match against")]
    EmptyPopulation,
}

/// Failures reported by the storage collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage read failed: {0}")]
    Read(String),

    #[error("Storage write failed: {0}")]
    Write(String),

    #[error("User not found in storage: {0}")]
    UnknownUser(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Drug {din} was not authorized by transaction {transaction_id}")]
    DinNotAuthorized { transaction_id: String, din: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Request-level errors returned to kiosk clients
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad version number: only version 0 allowed, got {0}")]
    UnsupportedVersion(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    MalformedFingerprint(#[from] CodecError),

    #[error("No enrolled users to match against")]
    EmptyPopulation,

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Drug {din} was not authorized by transaction {transaction_id}")]
    DinNotAuthorized { transaction_id: String, din: String },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl ApiError {
    /// Stable identifier of the error kind, sent alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::UnsupportedVersion(_) => "UnsupportedVersion",
            ApiError::MissingField(_) => "MissingField",
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::MalformedFingerprint(_) => "MalformedFingerprint",
            ApiError::EmptyPopulation => "EmptyPopulation",
            ApiError::UnknownTransaction(_) => "UnknownTransaction",
            ApiError::DinNotAuthorized { .. } => "DinNotAuthorized",
            ApiError::PersistenceFailure(_) => "PersistenceFailure",
            ApiError::StorageUnavailable(_) => "StorageUnavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedVersion(_)
            | ApiError::MissingField(_)
            | ApiError::InvalidRequest(_)
            | ApiError::MalformedFingerprint(_)
            | ApiError::DinNotAuthorized { .. } => StatusCode::BAD_REQUEST,
            ApiError::UnknownTransaction(_) => StatusCode::NOT_FOUND,
            ApiError::EmptyPopulation | ApiError::PersistenceFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::EmptyPopulation => ApiError::EmptyPopulation,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::StorageUnavailable(msg),
            other => ApiError::PersistenceFailure(other.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownTransaction(id) => ApiError::UnknownTransaction(id),
            LedgerError::DinNotAuthorized { transaction_id, din } => {
                ApiError::DinNotAuthorized { transaction_id, din }
            }
            LedgerError::Store(store) => store.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                version: API_VERSION.to_string(),
                success: false,
                error: self.kind().to_string(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        match self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        }
    }
}
