// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Local username/password accounts with HS256 bearer tokens.
//!
//! ## Auth Flow
//!
//! 1. Client registers with `POST /register/` (password stored as a bcrypt digest)
//! 2. Client logs in with `POST /token` and receives a signed JWT (`sub` = username)
//! 3. Client sends `Authorization: Bearer <JWT>` on protected routes
//! 4. The gate:
//!    - verifies signature and expiry (no leeway)
//!    - resolves `sub` in the credential store
//!    - rejects disabled users
//!
//! ## Security
//!
//! - Signature, expiry and unknown-subject failures are reported identically
//! - Unknown-user logins still pay for one bcrypt verification
//! - Password digests never leave the store

pub mod error;
pub mod extractor;
pub mod gate;
pub mod password;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use extractor::{require_active_user, CurrentUser};
pub use gate::{authorize, bearer_token};
pub use password::{PasswordError, PasswordHasher};
pub use token::{AccessToken, Claims, TokenError, TokenService};
