use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::schemas::ParticipantId;

/// Rejections of client input, raised before anything reaches storage.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("participant name must not be empty")]
    EmptyName,
    #[error("amount must be a positive number of at least 0.01")]
    InvalidAmount,
    #[error("an expense must be split between at least one participant")]
    EmptySplit,
    #[error("invalid group code: {0:?}")]
    InvalidCode(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("participant {0} paid for an expense and cannot be removed")]
    ParticipantIsPayer(ParticipantId),
    #[error("participant {0} is not part of this group")]
    UnknownParticipant(ParticipantId),
    #[error("group was modified concurrently, try again")]
    Concurrent,
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("balances do not add up to zero (sum = {sum})")]
    Inconsistent { sum: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Everything a request handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(err) => match err {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::UnknownParticipant(_) => StatusCode::BAD_REQUEST,
                StoreError::Conflict(_)
                | StoreError::ParticipantIsPayer(_)
                | StoreError::Concurrent => StatusCode::CONFLICT,
                StoreError::Database(_) | StoreError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}
