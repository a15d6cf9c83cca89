// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! typed [`AppConfig`] loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_DOMAIN` | Identity provider domain, e.g. `tenant.auth0.com` | Required |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Required |
//! | `DATA_DIR` | Root directory for persistent storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//!
//! The token issuer and the JWKS endpoint are both derived from
//! `AUTH_DOMAIN`: the issuer is `https://{domain}/` and the key set is
//! fetched from `https://{domain}/.well-known/jwks.json`.

use std::env;
use std::path::PathBuf;

use url::Url;

/// Environment variable name for the identity provider domain.
pub const AUTH_DOMAIN_ENV: &str = "AUTH_DOMAIN";

/// Environment variable name for the expected JWT audience.
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";

/// Environment variable name for the persistent data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// File name of the redb database inside the data directory.
const DB_FILE_NAME: &str = "posts.redb";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },
}

// ============================================================================
// AppConfig
// ============================================================================

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Expected `iss` claim, `https://{domain}/`.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// JWKS endpoint, `https://{domain}/.well-known/jwks.json`.
    pub jwks_url: String,
    /// Root directory for persistent storage.
    pub data_dir: PathBuf,
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
}

impl AppConfig {
    /// Loads configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let domain = require_env(AUTH_DOMAIN_ENV)?;
        let audience = require_env(AUTH_AUDIENCE_ENV)?;
        let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var(PORT_ENV) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
                var: PORT_ENV,
                message: format!("{raw:?} is not a valid port number"),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Self::from_values(&domain, &audience, PathBuf::from(data_dir), host, port)
    }

    /// Builds a configuration from already-resolved values.
    ///
    /// The issuer and JWKS endpoint are derived from `domain` here, so every
    /// construction path agrees on the derivation.
    pub fn from_values(
        domain: &str,
        audience: &str,
        data_dir: PathBuf,
        host: String,
        port: u16,
    ) -> Result<Self, ConfigError> {
        let jwks_url = format!("https://{domain}/.well-known/jwks.json");
        Url::parse(&jwks_url).map_err(|err| ConfigError::InvalidVar {
            var: AUTH_DOMAIN_ENV,
            message: format!("{domain:?} does not yield a valid JWKS endpoint: {err}"),
        })?;

        Ok(Self {
            issuer: format!("https://{domain}/"),
            audience: audience.to_string(),
            jwks_url,
            data_dir,
            host,
            port,
        })
    }

    /// Path of the redb database file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ConfigError::MissingVar(name)),
    }
}
