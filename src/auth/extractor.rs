// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum glue for the authorization gate.
//!
//! The protected router runs [`require_active_user`] as a route layer; it
//! stores the resolved user in request extensions. Handlers then take the
//! user with the [`CurrentUser`] extractor:
//!
//! ```rust,ignore
//! async fn whoami(CurrentUser(user): CurrentUser) -> Json<UserView> {
//!     Json(user.view())
//! }
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::{gate::authorize, AuthError};
use crate::{models::UserRecord, state::AppState};

/// Middleware running the authorization gate before handler dispatch.
pub async fn require_active_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authorize(request.headers(), &state.tokens, state.store.as_ref()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated, active user.
///
/// Uses the user placed by [`require_active_user`] when present, otherwise
/// runs the gate itself.
pub struct CurrentUser(pub UserRecord);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserRecord>().cloned() {
            return Ok(CurrentUser(user));
        }

        let user = authorize(&parts.headers, &state.tokens, state.store.as_ref()).await?;
        Ok(CurrentUser(user))
    }
}
