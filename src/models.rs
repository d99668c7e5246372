// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API, plus the stored
//! [`UserRecord`]. Wire types derive `Serialize`/`Deserialize` and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! ## Public vs stored users
//!
//! [`UserRecord`] holds the bcrypt digest and deliberately does not implement
//! `Serialize`. Everything leaving the service goes through [`UserView`],
//! which has no digest field at all.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Users
// =============================================================================

/// A registered user as held by the credential store.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique, immutable identity key.
    pub username: String,
    /// bcrypt digest (salt embedded).
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub disabled: bool,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl UserRecord {
    /// Public projection of this record.
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// Public view of a user, returned by registration and `/users/me/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub disabled: bool,
}

impl From<&UserRecord> for UserView {
    fn from(record: &UserRecord) -> Self {
        Self {
            username: record.username.clone(),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            disabled: record.disabled,
        }
    }
}

impl From<UserRecord> for UserView {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            email: record.email,
            full_name: record.full_name,
            disabled: record.disabled,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /register/`.
#[derive(Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Defaults to `{username}@example.com`.
    #[serde(default)]
    pub email: Option<String>,
    /// Defaults to the title-cased username.
    #[serde(default)]
    pub full_name: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Body of `POST /token`.
#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
        }
    }
}

/// An item owned by the current user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Item {
    pub item_id: String,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}
