// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token issuance and verification (HS256 JWT).
//!
//! Tokens are self-contained: nothing is stored server-side and a token is
//! valid iff its signature verifies under the server secret and its `exp` is
//! strictly in the future.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// A freshly minted bearer token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Bad encoding, bad signature, wrong algorithm or expired. Deliberately
    /// carries no detail.
    #[error("invalid token")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies access tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: TimeDelta) -> Result<AccessToken, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(AccessToken {
            token,
            subject: claims.sub,
            expires_at,
        })
    }

    /// Return the claims of a valid token.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        // jsonwebtoken accepts `exp == now`; expiry here is strict.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }

    /// Return the subject of a valid token.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }
}
