// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! # Authorization Module
//!
//! Request-scoped authorization for the post API.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider and sends
//!    `Authorization: Bearer <JWT>`
//! 2. The gate middleware:
//!    - Resolves the RS256 signing key from the provider's JWKS,
//!      served from the persistent cache when fresh
//!    - Verifies signature, issuer, audience, expiry, and not-before
//!    - Attaches [`VerifiedClaims`] to the request
//! 3. Handlers compare `sub` against resource owners before mutating
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - Tokens are pinned to RS256; `none` and HMAC headers are rejected
//!   before any key lookup
//! - The JWKS cache lives in the embedded database and survives restarts;
//!   entries expire after 24 hours
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod jwks;
pub mod middleware;
pub mod ownership;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use claims::{Audience, VerifiedClaims};
pub use error::AuthError;
pub use jwks::{JwksCache, KeySetOrigin};
pub use middleware::{require_auth, Auth};
pub use ownership::{OwnedResource, OwnershipEnforcer};
