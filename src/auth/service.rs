// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login flows.

use chrono::TimeDelta;

use super::{
    password::PasswordHasher,
    token::{AccessToken, TokenService},
    AuthError,
};
use crate::{
    models::{RegisterRequest, UserRecord, UserView},
    store::{CredentialStore, StoreError},
};

/// Title-case a username for the default display name.
///
/// The first letter of every run of cased letters is upper-cased and the rest
/// are lower-cased; anything uncased starts a new run (`john_doe` -> `John_Doe`).
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        if c.is_lowercase() || c.is_uppercase() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Register a new user and return its public view.
pub async fn register(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    request: RegisterRequest,
) -> Result<UserView, AuthError> {
    let RegisterRequest {
        username,
        password,
        email,
        full_name,
    } = request;

    // Cheap early exit; the insert below is what actually enforces uniqueness.
    if store.get(&username).await.is_ok() {
        return Err(AuthError::DuplicateUser);
    }

    let password_hash = hasher
        .hash_blocking(password)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let record = UserRecord {
        email: non_empty(email).unwrap_or_else(|| format!("{username}@example.com")),
        full_name: non_empty(full_name).unwrap_or_else(|| title_case(&username)),
        username,
        password_hash,
        disabled: false,
    };
    let view = record.view();

    store.create(record).await.map_err(|e| match e {
        StoreError::AlreadyExists(_) => AuthError::DuplicateUser,
        StoreError::NotFound(_) => AuthError::Internal(e.to_string()),
    })?;

    tracing::info!(username = %view.username, "user registered");
    Ok(view)
}

/// Check credentials and mint an access token.
///
/// Unknown username and wrong password are the same failure.
pub async fn login(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    tokens: &TokenService,
    username: &str,
    password: String,
    ttl: TimeDelta,
) -> Result<AccessToken, AuthError> {
    let user = store.get(username).await.ok();

    let matched = hasher
        .verify_blocking(password, user.as_ref().map(|u| u.password_hash.clone()))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let user = match user {
        Some(user) if matched => user,
        _ => {
            tracing::info!(username = %username, "login rejected");
            return Err(AuthError::IncorrectLogin);
        }
    };

    tokens
        .issue(&user.username, ttl)
        .map_err(|e| AuthError::Internal(e.to_string()))
}
