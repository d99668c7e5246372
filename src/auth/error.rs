// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Authentication error type.
///
/// Token problems (bad signature, expired, unknown subject) all surface as
/// `InvalidCredentials`; callers cannot tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential presented
    Unauthenticated,
    /// Token failed verification or names an unknown user
    InvalidCredentials,
    /// Login with unknown username or wrong password
    IncorrectLogin,
    /// Authenticated user is disabled
    InactiveUser,
    /// Registration for a username that already exists
    DuplicateUser,
    /// Internal error
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials | AuthError::IncorrectLogin => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InactiveUser | AuthError::DuplicateUser => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "Not authenticated"),
            AuthError::InvalidCredentials => write!(f, "Could not validate credentials"),
            AuthError::IncorrectLogin => write!(f, "Incorrect username or password"),
            AuthError::InactiveUser => write!(f, "Inactive user"),
            AuthError::DuplicateUser => write!(f, "Username already registered"),
            // Internal details stay in the logs.
            AuthError::Internal(_) => write!(f, "Internal server error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "internal authentication error");
        }

        let status = self.status_code();
        let mut response = ApiError::new(status, self.to_string()).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
