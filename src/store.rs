// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store.
//!
//! Users live for the lifetime of the process only. Handlers never touch the
//! map directly; they go through the [`CredentialStore`] trait held in
//! [`AppState`](crate::state::AppState), so another backend can be dropped in
//! without changing the auth flows.

use std::collections::{hash_map::Entry, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::UserRecord;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("user {0:?} already exists")]
    AlreadyExists(String),

    #[error("user {0:?} not found")]
    NotFound(String),
}

/// Username-keyed user storage.
///
/// `create` and `get` must be linearizable: a successful `create` is visible
/// to every later `get`, and at most one of several concurrent `create` calls
/// for the same username succeeds.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new record. Fails without mutation if the username is taken.
    async fn create(&self, record: UserRecord) -> Result<(), StoreError>;

    async fn get(&self, username: &str) -> Result<UserRecord, StoreError>;

    /// Administrative toggle; not reachable from any HTTP route.
    async fn set_disabled(&self, username: &str, disabled: bool) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.entry(record.username.clone()) {
            Entry::Occupied(entry) => Err(StoreError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, username: &str) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }

    async fn set_disabled(&self, username: &str, disabled: bool) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(username.to_string()))?;
        record.disabled = disabled;
        Ok(())
    }
}
