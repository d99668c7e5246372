// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate.
//!
//! Every protected request passes through [`authorize`]:
//!
//! ```text
//! Received -> TokenExtracted -> TokenVerified -> UserResolved -> Authorized
//!     |             |                |               |
//!     +-------------+----------------+---------------+--> Rejected(reason)
//! ```
//!
//! The gate only reads state. It never distinguishes "bad token" from
//! "token for a user we don't know".

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::{token::TokenService, AuthError};
use crate::{models::UserRecord, store::CredentialStore};

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively. A missing header, a different
/// scheme or an empty token all yield `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Resolve the caller of a request to an active user.
pub async fn authorize(
    headers: &HeaderMap,
    tokens: &TokenService,
    store: &dyn CredentialStore,
) -> Result<UserRecord, AuthError> {
    let Some(token) = bearer_token(headers) else {
        tracing::debug!("request rejected: no bearer credential");
        return Err(AuthError::Unauthenticated);
    };

    let subject = tokens.verify(token).map_err(|_| {
        tracing::debug!("request rejected: token failed verification");
        AuthError::InvalidCredentials
    })?;

    let user = store.get(&subject).await.map_err(|_| {
        tracing::debug!(subject = %subject, "request rejected: token subject not found");
        AuthError::InvalidCredentials
    })?;

    if user.disabled {
        tracing::debug!(username = %user.username, "request rejected: inactive user");
        return Err(AuthError::InactiveUser);
    }

    Ok(user)
}
