// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated pass-through to the upstream JSON API.

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::warn;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    state::AppState,
    upstream::{UpstreamError, UpstreamResource},
};

async fn proxy(
    state: &AppState,
    username: &str,
    resource: UpstreamResource,
) -> Result<Json<Value>, ApiError> {
    match state.upstream.fetch(resource).await {
        Ok(body) => Ok(Json(body)),
        Err(err) => {
            match &err {
                UpstreamError::Unavailable(reason) => warn!(
                    username = %username,
                    resource = resource.path(),
                    error = %reason,
                    "Network error fetching from upstream"
                ),
                other => warn!(
                    username = %username,
                    resource = resource.path(),
                    error = %other,
                    "Error fetching from upstream"
                ),
            }
            Err(err.into_api_error(resource))
        }
    }
}

/// Fetch photos from the upstream API.
#[utoipa::path(
    get,
    path = "/photos",
    tag = "External",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Upstream photos, passed through"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Failed to fetch photos from external API"),
        (status = 503, description = "Could not connect to external photo API"),
    )
)]
pub async fn get_photos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, &user.username, UpstreamResource::Photos).await
}

/// Fetch posts from the upstream API.
#[utoipa::path(
    get,
    path = "/posts",
    tag = "External",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Upstream posts, passed through"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Failed to fetch posts from external API"),
        (status = 503, description = "Could not connect to external post API"),
    )
)]
pub async fn get_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    proxy(&state, &user.username, UpstreamResource::Posts).await
}
