// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Bearer token verification.
//!
//! The pipeline, in order: bearer extraction, header decode with the
//! algorithm pinned to RS256, key resolution by kid (with one forced
//! refresh if a cached set does not know the kid), then signature,
//! issuer, audience, and time-window validation in a single decode.
//!
//! Tokens whose header asks for any algorithm other than RS256, `none`
//! included, are rejected before any key material is consulted.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::VerifiedClaims;
use super::error::AuthError;
use super::jwks::{find_key, rsa_decoding_key, JwksCache, KeySetOrigin};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Verify a bearer token against the JWKS cache and the expected
/// issuer and audience.
pub async fn verify_token(
    token: &str,
    jwks: &JwksCache,
    issuer: &str,
    audience: &str,
) -> Result<VerifiedClaims, AuthError> {
    // Decode header to pin the algorithm and find the kid
    let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
    if header.alg != Algorithm::RS256 {
        return Err(AuthError::MalformedToken);
    }
    let kid = header.kid.ok_or(AuthError::MalformedToken)?;

    // Resolve the signing key
    let (set, origin) = jwks.key_set().await?;
    let decoding_key = match find_key(&set, &kid) {
        Some(jwk) => rsa_decoding_key(jwk)?,
        None if origin == KeySetOrigin::Cache => {
            // A cached set may predate a key rotation; look exactly once
            // at a freshly fetched set before giving up
            let fresh = jwks.key_set_fresh().await?;
            match find_key(&fresh, &kid) {
                Some(jwk) => rsa_decoding_key(jwk)?,
                None => return Err(AuthError::UnknownKeyId),
            }
        }
        None => return Err(AuthError::UnknownKeyId),
    };

    // Build validation
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_nbf = true;
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);

    // Decode and validate token
    let token_data =
        decode::<VerifiedClaims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "aud" => AuthError::InvalidAudience,
                "iss" => AuthError::InvalidIssuer,
                _ => AuthError::MalformedToken,
            },
            _ => AuthError::MalformedToken,
        })?;

    Ok(token_data.claims)
}
