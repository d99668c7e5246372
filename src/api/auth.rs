// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login endpoints.

use axum::{extract::State, Json};

use super::ApiJson;
use crate::{
    auth::{service, AuthError},
    models::{LoginRequest, RegisterRequest, TokenResponse, UserView},
    state::AppState,
};

/// Register a new user.
#[utoipa::path(
    post,
    path = "/register/",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = UserView),
        (status = 400, description = "Username already registered"),
        (status = 422, description = "Malformed request body"),
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<UserView>, AuthError> {
    let view = service::register(state.store.as_ref(), &state.hasher, request).await?;
    Ok(Json(view))
}

/// Exchange username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/token",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password"),
        (status = 422, description = "Malformed request body"),
    )
)]
pub async fn login_for_access_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let token = service::login(
        state.store.as_ref(),
        &state.hasher,
        &state.tokens,
        &request.username,
        request.password,
        state.access_token_ttl,
    )
    .await?;
    Ok(Json(TokenResponse::bearer(token.token)))
}
