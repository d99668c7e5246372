// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer Gate - JWT Authentication Gateway
//!
//! Username/password registration, HS256 bearer token issuance, and a gate in
//! front of user-scoped and upstream pass-through endpoints.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `audit` - Per-request audit log
//! - `auth` - Password hashing, tokens, and the bearer gate
//! - `store` - Credential store
//! - `upstream` - Upstream JSON API client

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
pub mod upstream;
