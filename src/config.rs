// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment at startup (after an optional
//! `.env` file has been loaded). A missing signing secret or an unparseable
//! value aborts startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SECRET_KEY` | HS256 signing secret for access tokens | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ACCESS_TOKEN_EXPIRE_MINUTES` | Lifetime of login-issued tokens | `30` |
//! | `BCRYPT_COST` | bcrypt work factor | `12` |
//! | `UPSTREAM_BASE_URL` | Root of the proxied JSON API | `https://jsonplaceholder.typicode.com` |
//! | `UPSTREAM_TIMEOUT_SECS` | Upstream request timeout | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, net::SocketAddr, time::Duration};

use chrono::TimeDelta;
use url::Url;

pub const SECRET_KEY_ENV: &str = "SECRET_KEY";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ACCESS_TOKEN_EXPIRE_MINUTES_ENV: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const UPSTREAM_BASE_URL_ENV: &str = "UPSTREAM_BASE_URL";
pub const UPSTREAM_TIMEOUT_SECS_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
/// Lifetime of tokens issued by `POST /token`.
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SECRET_KEY environment variable not set. Please set it in your .env file or as a system environment variable.")]
    MissingSecret,

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Fully resolved startup configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub secret_key: String,
    pub bind_addr: SocketAddr,
    pub access_token_ttl: TimeDelta,
    pub bcrypt_cost: u32,
    pub upstream_base_url: Url,
    pub upstream_timeout: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("secret_key", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("upstream_base_url", &self.upstream_base_url.as_str())
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let secret_key = get(SECRET_KEY_ENV).ok_or(ConfigError::MissingSecret)?;

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                    reason: e.to_string(),
                })?;

        let minutes = parse_or(
            get(ACCESS_TOKEN_EXPIRE_MINUTES_ENV),
            ACCESS_TOKEN_EXPIRE_MINUTES_ENV,
            DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        )?;
        if minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: ACCESS_TOKEN_EXPIRE_MINUTES_ENV,
                value: minutes.to_string(),
                reason: "must be a positive number of minutes".to_string(),
            });
        }
        let access_token_ttl =
            TimeDelta::try_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
                name: ACCESS_TOKEN_EXPIRE_MINUTES_ENV,
                value: minutes.to_string(),
                reason: "out of range".to_string(),
            })?;

        let bcrypt_cost = parse_or(get(BCRYPT_COST_ENV), BCRYPT_COST_ENV, bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: BCRYPT_COST_ENV,
                value: bcrypt_cost.to_string(),
                reason: "bcrypt cost must be between 4 and 31".to_string(),
            });
        }

        let raw_url = get(UPSTREAM_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());
        let upstream_base_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: UPSTREAM_BASE_URL_ENV,
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let timeout_secs = parse_or(
            get(UPSTREAM_TIMEOUT_SECS_ENV),
            UPSTREAM_TIMEOUT_SECS_ENV,
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;

        Ok(Self {
            secret_key,
            bind_addr,
            access_token_ttl,
            bcrypt_cost,
            upstream_base_url,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
