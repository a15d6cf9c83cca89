// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! JWKS (JSON Web Key Set) fetching and persistent caching.
//!
//! The identity provider's key set is fetched over HTTPS and cached in the
//! embedded database so it survives restarts. Two records make up a cache
//! entry:
//!
//! - `jwks`: the key set exactly as fetched (raw JSON bytes)
//! - `jwks_ttl`: expiry as a u64 little-endian Unix timestamp, 24 hours
//!   from the fetch that wrote it
//!
//! ## Degraded mode
//!
//! Store failures never fail a request. A record that is missing, the
//! wrong shape, or unreadable counts as a cache miss and triggers a fetch;
//! a write that fails is logged and dropped, so the freshly fetched set is
//! served unpersisted and the next request fetches again.
//!
//! There is no cross-request lock: concurrent cache misses each fetch and
//! each write the same records, which is harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;

use crate::store::KeyValueStore;

use super::error::AuthError;

/// Store record holding the serialized key set.
const JWKS_RECORD: &str = "jwks";

/// Store record holding the cache expiry timestamp.
const JWKS_TTL_RECORD: &str = "jwks_ttl";

/// How long a fetched key set stays fresh (24 hours).
const FRESHNESS_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Upper bound on a JWKS fetch, connection included.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a key set came from, so the verifier knows whether a fresh
/// fetch could still turn up a missing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySetOrigin {
    /// Served from the persistent cache.
    Cache,
    /// Fetched from the identity provider during this request.
    Fetched,
}

/// JWKS cache backed by a persistent key-value store.
#[derive(Clone)]
pub struct JwksCache {
    /// JWKS endpoint URL
    jwks_url: String,
    /// Persistent record store
    store: Arc<dyn KeyValueStore>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksCache {
    /// Create a new JWKS cache.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.auth.example.com/.well-known/jwks.json`)
    /// - `store`: Record store the cached set is persisted in
    pub fn new(jwks_url: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            store,
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Get the key set, preferring the persistent cache.
    ///
    /// On a cache miss the set is fetched, persisted, and reported as
    /// [`KeySetOrigin::Fetched`].
    pub async fn key_set(&self) -> Result<(JwkSet, KeySetOrigin), AuthError> {
        if let Some(set) = self.cached_set() {
            return Ok((set, KeySetOrigin::Cache));
        }

        let (set, raw) = self.fetch().await?;
        self.persist(&raw);
        Ok((set, KeySetOrigin::Fetched))
    }

    /// Get the key set straight from the identity provider, bypassing
    /// the cache. The fetched set still replaces the cached records.
    pub async fn key_set_fresh(&self) -> Result<JwkSet, AuthError> {
        let (set, raw) = self.fetch().await?;
        self.persist(&raw);
        Ok(set)
    }

    /// Whether a fresh cache entry exists, without parsing or fetching.
    pub fn has_fresh_entry(&self) -> bool {
        match self.read_expiry() {
            Some(expiry) => expiry > Utc::now().timestamp() as u64,
            None => false,
        }
    }

    /// Read the cached set, or `None` on any kind of miss.
    fn cached_set(&self) -> Option<JwkSet> {
        let expiry = self.read_expiry()?;
        if expiry <= Utc::now().timestamp() as u64 {
            return None;
        }

        let raw = match self.store.get(JWKS_RECORD) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read jwks record, treating as cache miss");
                return None;
            }
        };

        match serde_json::from_slice::<JwkSet>(&raw) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(error = %e, "cached jwks bytes are not a valid key set, refetching");
                None
            }
        }
    }

    /// Read the expiry record. Absent, unreadable, or wrongly-sized
    /// records all come back as `None`.
    fn read_expiry(&self) -> Option<u64> {
        let raw = match self.store.get(JWKS_TTL_RECORD) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read jwks_ttl record, treating as cache miss");
                return None;
            }
        };

        let bytes: [u8; 8] = raw.as_slice().try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    /// Fetch the key set from the endpoint, returning it parsed along
    /// with the raw bytes as served.
    async fn fetch(&self) -> Result<(JwkSet, Vec<u8>), AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let raw = response
            .bytes()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        // Parse before persisting so a half-served body never lands in the store
        let set: JwkSet = serde_json::from_slice(&raw)
            .map_err(|e| AuthError::JwksFetchError(format!("invalid key set body: {e}")))?;

        Ok((set, raw.to_vec()))
    }

    /// Write the cache records. Failures are logged and swallowed; the
    /// request that fetched the set proceeds with it either way.
    fn persist(&self, raw: &[u8]) {
        if let Err(e) = self.store.set(JWKS_RECORD, raw) {
            tracing::warn!(error = %e, "failed to persist jwks record, next request will refetch");
            // The ttl must not advance unless the bytes landed, or an old
            // set would be served as fresh
            return;
        }

        let expiry = Utc::now().timestamp() as u64 + FRESHNESS_WINDOW_SECS;
        if let Err(e) = self.store.set(JWKS_TTL_RECORD, &expiry.to_le_bytes()) {
            tracing::warn!(error = %e, "failed to persist jwks_ttl record, next request will refetch");
        }
    }
}

/// Find the key with the given kid in a key set.
pub(super) fn find_key<'a>(set: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    set.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert an RSA JWK to a DecodingKey.
///
/// Tokens are pinned to RS256, so only RSA key material is usable.
pub(super) fn rsa_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}"))),
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
