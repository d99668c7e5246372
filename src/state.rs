// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::TimeDelta;

use crate::{
    audit::{AuditSink, TracingAuditSink},
    auth::{PasswordError, PasswordHasher, TokenService},
    config::AppConfig,
    store::{CredentialStore, InMemoryCredentialStore},
    upstream::{HttpUpstream, UpstreamFetcher},
};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("failed to build upstream HTTP client: {0}")]
    Upstream(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub hasher: PasswordHasher,
    pub tokens: TokenService,
    pub upstream: Arc<dyn UpstreamFetcher>,
    pub audit: Arc<dyn AuditSink>,
    /// Lifetime of tokens issued by `POST /token`.
    pub access_token_ttl: TimeDelta,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
        upstream: Arc<dyn UpstreamFetcher>,
        access_token_ttl: TimeDelta,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            upstream,
            audit: Arc::new(TracingAuditSink),
            access_token_ttl,
        }
    }

    /// Wire the production components from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let upstream = HttpUpstream::new(config.upstream_base_url.clone(), config.upstream_timeout)?;

        Ok(Self::new(
            Arc::new(InMemoryCredentialStore::new()),
            hasher,
            TokenService::new(config.secret_key.as_bytes()),
            Arc::new(upstream),
            config.access_token_ttl,
        ))
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_upstream(mut self, upstream: Arc<dyn UpstreamFetcher>) -> Self {
        self.upstream = upstream;
        self
    }
}

#[cfg(test)]
impl AppState {
    /// Low-cost state for tests. The upstream points at a closed local port.
    pub fn for_tests() -> Self {
        let upstream = HttpUpstream::new(
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            std::time::Duration::from_secs(1),
        )
        .unwrap();

        Self::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::new(4).unwrap(),
            TokenService::new(b"test-secret-key"),
            Arc::new(upstream),
            TimeDelta::minutes(crate::config::DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES),
        )
    }

    /// Insert a user directly, bypassing registration.
    pub async fn seed_user(&self, username: &str, password: &str, disabled: bool) {
        let record = crate::models::UserRecord {
            username: username.to_string(),
            password_hash: self.hasher.hash(password).unwrap(),
            email: format!("{username}@example.com"),
            full_name: crate::auth::service::title_case(username),
            disabled,
        };
        self.store.create(record).await.unwrap();
    }
}
