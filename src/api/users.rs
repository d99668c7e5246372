// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::{
    auth::CurrentUser,
    models::{Item, UserView},
};

/// Get the current authenticated user's public profile.
#[utoipa::path(
    get,
    path = "/users/me/",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserView),
        (status = 400, description = "Inactive user"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn read_users_me(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(user.into())
}

/// List items owned by the current user.
#[utoipa::path(
    get,
    path = "/users/me/items/",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Owned items", body = [Item]),
        (status = 400, description = "Inactive user"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn read_own_items(CurrentUser(user): CurrentUser) -> Json<Vec<Item>> {
    Json(vec![Item {
        item_id: "Foo".to_string(),
        owner: user.username,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    fn user() -> UserRecord {
        UserRecord {
            username: "testuser_auth".to_string(),
            password_hash: "$2b$04$digest".to_string(),
            email: "testuser_auth@example.com".to_string(),
            full_name: "Testuser_Auth".to_string(),
            disabled: false,
        }
    }

    #[tokio::test]
    async fn me_returns_public_view() {
        let Json(view) = read_users_me(CurrentUser(user())).await;
        assert_eq!(view.username, "testuser_auth");
        assert_eq!(view.email, "testuser_auth@example.com");
    }

    #[tokio::test]
    async fn items_are_owned_by_caller() {
        let Json(items) = read_own_items(CurrentUser(user())).await;
        assert_eq!(
            items,
            vec![Item {
                item_id: "Foo".to_string(),
                owner: "testuser_auth".to_string(),
            }]
        );
    }
}
