// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Verified JWT claims.
//!
//! The identity provider issues standard OIDC claims plus whatever custom
//! claims the deployment configures. The standard ones get typed fields;
//! everything else lands in the residual `extra` map so no claim is lost
//! between verification and the handler that wants it.

use std::collections::HashMap;

use serde::Deserialize;

/// The `aud` claim, which RFC 7519 allows to be a single string or an
/// array of strings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience value.
    One(String),
    /// Multiple audience values.
    Many(Vec<String>),
}

impl Audience {
    /// Whether `aud` names the given audience.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(value) => value == audience,
            Audience::Many(values) => values.iter().any(|v| v == audience),
        }
    }
}

/// Claims from a token that passed signature and claim validation.
///
/// Only produced by the verifier; handlers receiving this can trust every
/// field. `sub` identifies the caller and is what ownership checks compare
/// against.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedClaims {
    /// Subject: the canonical user identifier.
    pub sub: String,

    /// Issuer: the identity provider that signed the token.
    pub iss: String,

    /// Audience the token was minted for.
    pub aud: Audience,

    /// Expiration timestamp (Unix seconds).
    pub exp: i64,

    /// Issued-at timestamp (optional).
    #[serde(default)]
    pub iat: Option<i64>,

    /// Not-before timestamp (optional).
    #[serde(default)]
    pub nbf: Option<i64>,

    /// Authorized party (optional).
    #[serde(default)]
    pub azp: Option<String>,

    /// Any remaining claims, preserved as raw JSON values.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_single_audience() {
        let claims: VerifiedClaims = serde_json::from_value(json!({
            "sub": "user-1",
            "iss": "https://auth.example.com/",
            "aud": "codeshare-api",
            "exp": 1700003600,
        }))
        .unwrap();

        assert_eq!(claims.aud, Audience::One("codeshare-api".to_string()));
        assert!(claims.aud.contains("codeshare-api"));
        assert!(!claims.aud.contains("other-api"));
    }

    #[test]
    fn deserializes_audience_list() {
        let claims: VerifiedClaims = serde_json::from_value(json!({
            "sub": "user-1",
            "iss": "https://auth.example.com/",
            "aud": ["codeshare-api", "codeshare-admin"],
            "exp": 1700003600,
        }))
        .unwrap();

        assert!(claims.aud.contains("codeshare-api"));
        assert!(claims.aud.contains("codeshare-admin"));
        assert!(!claims.aud.contains("something-else"));
    }

    #[test]
    fn residual_claims_land_in_extra() {
        let claims: VerifiedClaims = serde_json::from_value(json!({
            "sub": "user-1",
            "iss": "https://auth.example.com/",
            "aud": "codeshare-api",
            "exp": 1700003600,
            "iat": 1700000000,
            "azp": "spa-client",
            "scope": "read:posts write:posts",
            "plan": {"tier": "pro"},
        }))
        .unwrap();

        assert_eq!(claims.iat, Some(1700000000));
        assert_eq!(claims.azp.as_deref(), Some("spa-client"));
        assert_eq!(
            claims.extra.get("scope"),
            Some(&json!("read:posts write:posts"))
        );
        assert_eq!(claims.extra.get("plan"), Some(&json!({"tier": "pro"})));
        // Typed fields must not be duplicated into the residual map
        assert!(!claims.extra.contains_key("sub"));
        assert!(!claims.extra.contains_key("exp"));
    }

    #[test]
    fn missing_subject_is_rejected() {
        let result = serde_json::from_value::<VerifiedClaims>(json!({
            "iss": "https://auth.example.com/",
            "aud": "codeshare-api",
            "exp": 1700003600,
        }));
        assert!(result.is_err());
    }
}
