// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Shared RSA fixtures for auth tests.
//!
//! Generating 2048-bit RSA keys is slow, so the fixture key pairs are
//! generated once per test binary and shared through `OnceLock`s. The
//! "foreign" key exists so signature tests can sign with a key whose
//! public half is not in the served JWKS.

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use rand::thread_rng;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};

/// Issuer baked into fixture tokens and verifier configs.
pub const TEST_ISSUER: &str = "https://auth.codeshare.test/";

/// Audience baked into fixture tokens and verifier configs.
pub const TEST_AUDIENCE: &str = "codeshare-api";

struct TestKey {
    private_pem: String,
    n_b64: String,
    e_b64: String,
}

fn generate_key() -> TestKey {
    let mut rng = thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("private key");
    let public_key = RsaPublicKey::from(&private_key);
    TestKey {
        private_pem: private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private key pem")
            .to_string(),
        n_b64: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
        e_b64: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
    }
}

fn signing_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(generate_key)
}

fn foreign_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(generate_key)
}

/// JWKS body exposing the fixture public key under a single kid.
pub fn test_jwks_json(kid: &str) -> Value {
    test_jwks_json_with_kids(&[kid])
}

/// JWKS body exposing the fixture public key under several kids, the way
/// a provider mid-rotation serves old and new keys side by side.
pub fn test_jwks_json_with_kids(kids: &[&str]) -> Value {
    let key = signing_key();
    let keys: Vec<Value> = kids
        .iter()
        .map(|kid| {
            json!({
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": kid,
                "n": key.n_b64,
                "e": key.e_b64,
            })
        })
        .collect();
    json!({ "keys": keys })
}

/// Standard claims accepted by the fixture verifier config, expiring an
/// hour from now.
pub fn base_claims(sub: &str) -> Value {
    json!({
        "sub": sub,
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "iat": get_current_timestamp(),
        "exp": get_current_timestamp() + 3600,
    })
}

/// Sign claims with the fixture key under the given kid.
pub fn sign_token(kid: &str, claims: &Value) -> String {
    sign_with(signing_key(), Algorithm::RS256, kid, claims)
}

/// Sign claims with a key the served JWKS does not contain.
pub fn sign_token_with_foreign_key(kid: &str, claims: &Value) -> String {
    sign_with(foreign_key(), Algorithm::RS256, kid, claims)
}

/// Sign claims with HS256 to exercise algorithm pinning.
pub fn sign_hs256_token(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(b"shared-secret")).expect("token")
}

/// Build a token whose header claims `alg: none`, with no signature.
pub fn unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("payload json"));
    format!("{header}.{payload}.")
}

/// Sign claims with the fixture key but no kid header.
pub fn sign_token_without_kid(claims: &Value) -> String {
    let header = Header::new(Algorithm::RS256);
    let key = EncodingKey::from_rsa_pem(signing_key().private_pem.as_bytes()).expect("encoding key");
    encode(&header, claims, &key).expect("token")
}

fn sign_with(key: &TestKey, alg: Algorithm, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(alg);
    header.kid = Some(kid.to_string());
    let encoding_key = EncodingKey::from_rsa_pem(key.private_pem.as_bytes()).expect("encoding key");
    encode(&header, claims, &encoding_key).expect("token")
}
