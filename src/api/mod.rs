// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::FromRequest,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    audit::audit_requests,
    auth::require_active_user,
    error::ApiError,
    models::{Item, LoginRequest, RegisterRequest, TokenResponse, UserView, WelcomeResponse},
    state::AppState,
};

pub mod auth;
pub mod external;
pub mod health;
pub mod users;

/// `Json` extractor whose rejections use the API's `{"detail": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me/", get(users::read_users_me))
        .route("/users/me/items/", get(users::read_own_items))
        .route("/photos", get(external::get_photos))
        .route("/posts", get(external::get_posts))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_active_user,
        ));

    let public = Router::new()
        .route("/", get(health::root))
        .route("/health/live", get(health::liveness))
        .route("/register/", post(auth::register_user))
        .route("/token", post(auth::login_for_access_token));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state.clone())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(state, audit_requests)),
        )
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::liveness,
        auth::register_user,
        auth::login_for_access_token,
        users::read_users_me,
        users::read_own_items,
        external::get_photos,
        external::get_posts
    ),
    components(
        schemas(
            UserView,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            Item,
            WelcomeResponse,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Registration and token issuance"),
        (name = "Users", description = "Current user"),
        (name = "External", description = "Authenticated upstream pass-through"),
        (name = "Health", description = "Liveness and landing")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::TimeDelta;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        audit::{MemoryAuditSink, MAX_AUDITED_BODY_BYTES},
        auth::TokenService,
        upstream::{UpstreamError, UpstreamFetcher, UpstreamResource},
    };

    enum Outcome {
        Body(Value),
        Status(u16),
        Down,
    }

    struct StubUpstream {
        outcome: Outcome,
        calls: AtomicUsize,
    }

    impl StubUpstream {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamFetcher for StubUpstream {
        async fn fetch(&self, _resource: UpstreamResource) -> Result<Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Body(body) => Ok(body.clone()),
                Outcome::Status(status) => Err(UpstreamError::Status {
                    status: *status,
                    body: "Internal Server Error".to_string(),
                }),
                Outcome::Down => Err(UpstreamError::Unavailable("Network error occurred".to_string())),
            }
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn auth_token(state: &AppState, username: &str, disabled: bool) -> String {
        state.seed_user(username, "authpassword", disabled).await;
        state
            .tokens
            .issue(username, state.access_token_ttl)
            .unwrap()
            .token
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::for_tests());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn read_root() {
        let app = router(AppState::for_tests());
        let response = send(&app, get_with_token("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Welcome to the JWT Authentication API!"})
        );
    }

    #[tokio::test]
    async fn liveness_is_public() {
        let app = router(AppState::for_tests());
        let response = send(&app, get_with_token("/health/live", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn register_login_whoami_scenario() {
        let app = router(AppState::for_tests());

        let response = send(
            &app,
            post_json("/register/", json!({"username": "alice", "password": "secret123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["full_name"], "Alice");
        assert_eq!(body["disabled"], false);
        assert!(body.get("password_hash").is_none());
        assert!(body.get("hashed_password").is_none());

        let response = send(
            &app,
            post_json("/token", json!({"username": "alice", "password": "wrong"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(
            json_body(response).await,
            json!({"detail": "Incorrect username or password"})
        );

        let response = send(
            &app,
            post_json("/token", json!({"username": "alice", "password": "secret123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["token_type"], "bearer");
        let token = body["access_token"].as_str().unwrap().to_string();

        let response = send(&app, get_with_token("/users/me/", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["username"], "alice");
        assert!(!body.to_string().contains("$2"));

        let response = send(&app, get_with_token("/users/me/", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"detail": "Not authenticated"}));
    }

    #[tokio::test]
    async fn register_duplicate_returns_400() {
        let app = router(AppState::for_tests());
        let first = send(
            &app,
            post_json("/register/", json!({"username": "testuser2", "password": "password123"})),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = send(
            &app,
            post_json("/register/", json!({"username": "testuser2", "password": "another"})),
        )
        .await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(second).await,
            json!({"detail": "Username already registered"})
        );
    }

    #[tokio::test]
    async fn login_for_unknown_user_returns_401() {
        let app = router(AppState::for_tests());
        let response = send(
            &app,
            post_json("/token", json!({"username": "nonexistent", "password": "anypassword"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"detail": "Incorrect username or password"})
        );
    }

    #[tokio::test]
    async fn malformed_body_returns_422_detail() {
        let app = router(AppState::for_tests());
        let response = send(&app, post_json("/token", json!({"username": "alice"}))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn missing_content_type_returns_400_detail() {
        let app = router(AppState::for_tests());
        let request = Request::builder()
            .method("POST")
            .uri("/register/")
            .body(Body::from(
                json!({"username": "alice", "password": "secret123"}).to_string(),
            ))
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn oversized_login_body_returns_413_and_is_audited() {
        let sink = Arc::new(MemoryAuditSink::default());
        let app = router(AppState::for_tests().with_audit_sink(sink.clone()));
        let request = Request::builder()
            .method("POST")
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("x".repeat(MAX_AUDITED_BODY_BYTES + 1)))
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await, json!({"detail": "Request body too large"}));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].identity, "unauthenticated");
        assert_eq!(events[0].method, "POST");
        assert_eq!(events[0].route, "/token");
        assert_eq!(events[0].status, 413);
    }

    #[tokio::test]
    async fn invalid_token_returns_401() {
        let app = router(AppState::for_tests());
        let response = send(&app, get_with_token("/users/me/", Some("not.a.real.token"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(
            json_body(response).await,
            json!({"detail": "Could not validate credentials"})
        );
    }

    #[tokio::test]
    async fn expired_or_foreign_tokens_return_401() {
        let state = AppState::for_tests();
        state.seed_user("alice", "pw", false).await;
        let app = router(state.clone());

        let expired = state.tokens.issue("alice", TimeDelta::seconds(-1)).unwrap().token;
        let response = send(&app, get_with_token("/users/me/", Some(&expired))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let foreign = TokenService::new(b"some-other-secret")
            .issue("alice", TimeDelta::minutes(5))
            .unwrap()
            .token;
        let response = send(&app, get_with_token("/users/me/", Some(&foreign))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_unknown_user_returns_401() {
        let state = AppState::for_tests();
        let app = router(state.clone());
        let token = state.tokens.issue("ghost", TimeDelta::minutes(5)).unwrap().token;

        let response = send(&app, get_with_token("/users/me/", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"detail": "Could not validate credentials"})
        );
    }

    #[tokio::test]
    async fn disabled_user_returns_400() {
        let state = AppState::for_tests();
        let token = auth_token(&state, "disableduser_auth", true).await;
        let app = router(state);

        for uri in ["/users/me/", "/users/me/items/", "/posts"] {
            let response = send(&app, get_with_token(uri, Some(&token))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json_body(response).await, json!({"detail": "Inactive user"}));
        }
    }

    #[tokio::test]
    async fn read_own_items_success() {
        let state = AppState::for_tests();
        let token = auth_token(&state, "testuser_auth", false).await;
        let app = router(state);

        let response = send(&app, get_with_token("/users/me/items/", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{"item_id": "Foo", "owner": "testuser_auth"}])
        );
    }

    #[tokio::test]
    async fn photos_pass_upstream_body_through() {
        let upstream = StubUpstream::new(Outcome::Body(json!([
            {"id": 1, "title": "photo1", "url": "url1", "thumbnailUrl": "thumb1"}
        ])));
        let state = AppState::for_tests().with_upstream(upstream.clone());
        let token = auth_token(&state, "testuser_auth", false).await;
        let app = router(state);

        let response = send(&app, get_with_token("/photos", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{"id": 1, "title": "photo1", "url": "url1", "thumbnailUrl": "thumb1"}])
        );
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn posts_upstream_error_returns_500() {
        let upstream = StubUpstream::new(Outcome::Status(500));
        let state = AppState::for_tests().with_upstream(upstream.clone());
        let token = auth_token(&state, "testuser_auth", false).await;
        let app = router(state);

        let response = send(&app, get_with_token("/posts", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"detail": "Failed to fetch posts from external API"})
        );
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn posts_network_error_returns_503() {
        let upstream = StubUpstream::new(Outcome::Down);
        let state = AppState::for_tests().with_upstream(upstream.clone());
        let token = auth_token(&state, "testuser_auth", false).await;
        let app = router(state);

        let response = send(&app, get_with_token("/posts", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await,
            json!({"detail": "Could not connect to external post API"})
        );
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn photos_require_authentication_before_fetch() {
        let upstream = StubUpstream::new(Outcome::Body(json!([])));
        let app = router(AppState::for_tests().with_upstream(upstream.clone()));

        let response = send(&app, get_with_token("/photos", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"detail": "Not authenticated"}));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn audit_log_records_resolved_identity() {
        let sink = Arc::new(MemoryAuditSink::default());
        let state = AppState::for_tests().with_audit_sink(sink.clone());
        let app = router(state);

        send(
            &app,
            post_json("/register/", json!({"username": "alice", "password": "secret123"})),
        )
        .await;
        let response = send(
            &app,
            post_json("/token", json!({"username": "alice", "password": "secret123"})),
        )
        .await;
        let token = json_body(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();
        send(&app, get_with_token("/users/me/", Some(&token))).await;
        send(&app, get_with_token("/users/me/", None)).await;
        send(&app, get_with_token("/users/me/", Some("garbage"))).await;

        let events = sink.events();
        let summary: Vec<(&str, &str, &str, u16)> = events
            .iter()
            .map(|e| (e.identity.as_str(), e.method.as_str(), e.route.as_str(), e.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("alice", "POST", "/register/", 200),
                ("alice", "POST", "/token", 200),
                ("alice", "GET", "/users/me/", 200),
                ("unauthenticated", "GET", "/users/me/", 401),
                ("invalid_token", "GET", "/users/me/", 401),
            ]
        );
        assert!(events.iter().all(|e| e.duration_ms >= 0.0));

        let serialized = serde_json::to_string(&events).unwrap();
        assert!(!serialized.contains(&token));
        assert!(!serialized.contains("secret123"));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = router(AppState::for_tests());
        let response = send(&app, get_with_token("/api-doc/openapi.json", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"].get("/users/me/").is_some());
        assert!(doc["paths"].get("/token").is_some());
        assert!(doc["components"]["securitySchemes"].get("bearer").is_some());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(AppState::for_tests());
        let response = send(&app, get_with_token("/", None)).await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}
