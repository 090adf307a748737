// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::StoreError;

/// Error codes for the roomq API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    NotFound,
    UpstreamError,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::UpstreamError => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: message.into() }))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error envelope: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures of the delegated-credential layer.
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    /// Malformed or incomplete request input.
    #[error("{0}")]
    Input(String),

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    /// Authorization code exchange failed (transport, status, or body).
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// Refresh-token grant failed (transport, status, or missing access token).
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The provider kept rejecting the owner's credentials after one refresh cycle.
    #[error("provider rejected credentials: {0}")]
    UpstreamAuthFailed(String),

    /// Transport failure, timeout, or an undecodable provider response.
    #[error("provider request failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(StoreError),
}

impl DelegateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Input(_) | Self::ExchangeFailed(_) => ErrorCode::BadRequest,
            Self::RoomNotFound(_) | Self::PrincipalNotFound(_) => ErrorCode::NotFound,
            Self::RefreshFailed(_) | Self::UpstreamAuthFailed(_) => ErrorCode::Unauthorized,
            Self::Upstream(_) => ErrorCode::UpstreamError,
            Self::Store(_) => ErrorCode::Internal,
        }
    }
}

impl From<StoreError> for DelegateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(id) => Self::RoomNotFound(id),
            StoreError::PrincipalNotFound(id) => Self::PrincipalNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<reqwest::Error> for DelegateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Upstream(format!("timed out: {err}"))
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

impl IntoResponse for DelegateError {
    fn into_response(self) -> Response {
        self.code().to_http_response(self.to_string()).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
