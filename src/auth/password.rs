// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing.
//!
//! bcrypt digests embed their own random salt, so hashing the same plaintext
//! twice yields different digests. The `*_blocking` variants move the work onto
//! Tokio's blocking pool so request tasks never stall a runtime worker.

use std::sync::Arc;

use tokio::task;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Salted one-way password hasher.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Digest verified against when the claimed user does not exist, so both
    /// login failure paths spend the same bcrypt work.
    decoy: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost (4..=31).
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let decoy = bcrypt::hash("decoy-password-for-unknown-users", cost)?;
        Ok(Self {
            cost,
            decoy: Arc::from(decoy),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check `plaintext` against `digest`.
    ///
    /// bcrypt compares digests in constant time. A malformed digest is a plain
    /// mismatch.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }

    /// Burn one verification's worth of work and report a mismatch.
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.decoy);
        false
    }

    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        task::spawn_blocking(move || hasher.hash(&plaintext)).await?
    }

    /// Verify on the blocking pool. `None` digest runs the decoy comparison.
    pub async fn verify_blocking(
        &self,
        plaintext: String,
        digest: Option<String>,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        let matched = task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&plaintext, &digest),
            None => hasher.verify_decoy(&plaintext),
        })
        .await?;
        Ok(matched)
    }
}
