// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request audit log.
//!
//! Every request produces one [`RequestAudit`] carrying who made it, what was
//! called, the resulting status and how long it took. Events go to an
//! [`AuditSink`]; the default sink writes them through `tracing`. Audit output
//! is best-effort and never affects the response.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::{auth::bearer_token, error::ApiError, state::AppState};

/// Largest login/registration body buffered to read the username.
/// Matches axum's default body limit for `Json`.
pub const MAX_AUDITED_BODY_BYTES: usize = 2 * 1024 * 1024;

pub const IDENTITY_UNAUTHENTICATED: &str = "unauthenticated";
pub const IDENTITY_INVALID_TOKEN: &str = "invalid_token";

/// One audited request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestAudit {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    /// Username, `unauthenticated` or `invalid_token`.
    pub identity: String,
    pub method: String,
    pub route: String,
    pub status: u16,
    pub duration_ms: f64,
}

impl RequestAudit {
    pub fn new(
        identity: impl Into<String>,
        method: &Method,
        route: impl Into<String>,
        status: u16,
        duration_ms: f64,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            identity: identity.into(),
            method: method.to_string(),
            route: route.into(),
            status,
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status < 400
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &RequestAudit);
}

/// How an audited request is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Succeeded,
    Failed,
}

impl AuditOutcome {
    pub fn of(event: &RequestAudit) -> Self {
        if event.succeeded() {
            AuditOutcome::Succeeded
        } else {
            AuditOutcome::Failed
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AuditOutcome::Succeeded => "API Request Succeeded",
            AuditOutcome::Failed => "API Request Failed",
        }
    }

    pub fn level(self) -> Level {
        match self {
            AuditOutcome::Succeeded => Level::INFO,
            AuditOutcome::Failed => Level::ERROR,
        }
    }
}

/// Writes audit events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &RequestAudit) {
        let outcome = AuditOutcome::of(event);
        let duration = format!("{:.2}ms", event.duration_ms);
        if outcome.level() == Level::INFO {
            tracing::info!(
                target: "audit",
                event_id = %event.event_id,
                user = %event.identity,
                endpoint = %event.route,
                method = %event.method,
                status = event.status,
                duration = %duration,
                "{}",
                outcome.message()
            );
        } else {
            tracing::error!(
                target: "audit",
                event_id = %event.event_id,
                user = %event.identity,
                endpoint = %event.route,
                method = %event.method,
                status = event.status,
                duration = %duration,
                "{}",
                outcome.message()
            );
        }
    }
}

/// Keeps events in memory; used to assert on audit output.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: std::sync::Mutex<Vec<RequestAudit>>,
}

#[cfg(test)]
impl MemoryAuditSink {
    pub fn events(&self) -> Vec<RequestAudit> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &RequestAudit) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Routes whose JSON body names the acting user.
fn names_user_in_body(method: &Method, path: &str) -> bool {
    *method == Method::POST && (path == "/token" || path == "/register/")
}

fn username_from_body(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value.get("username")?.as_str().map(str::to_string)
}

/// Middleware auditing every request.
pub async fn audit_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = request.uri().path().to_string();

    let mut identity = match bearer_token(request.headers()) {
        Some(token) => state
            .tokens
            .verify(token)
            .unwrap_or_else(|_| IDENTITY_INVALID_TOKEN.to_string()),
        None => IDENTITY_UNAUTHENTICATED.to_string(),
    };

    let request = if names_user_in_body(&method, &route) {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(_) => {
                let response = ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                    .into_response();
                emit(&state, identity, &method, route, &response, start);
                return response;
            }
        };
        if let Some(username) = username_from_body(&bytes) {
            identity = username;
        }
        Request::from_parts(parts, Body::from(bytes))
    } else {
        request
    };

    let response = next.run(request).await;
    emit(&state, identity, &method, route, &response, start);
    response
}

fn emit(
    state: &AppState,
    identity: String,
    method: &Method,
    route: String,
    response: &Response,
    start: Instant,
) {
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let event = RequestAudit::new(identity, method, route, response.status().as_u16(), duration_ms);
    state.audit.record(&event);
}
