// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Ownership enforcement for resource mutations.
//!
//! A verified token only proves who the caller is. Whether they may touch
//! a given resource is decided here, by comparing the token's subject with
//! the resource's recorded owner. Handlers run this check before any write
//! reaches the store.

use super::claims::VerifiedClaims;
use super::error::AuthError;

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's subject id.
    fn owner_id(&self) -> &str;
}

/// Trait for enforcing ownership against verified claims.
pub trait OwnershipEnforcer {
    /// Verify that the caller owns this resource.
    ///
    /// # Errors
    /// Returns [`AuthError::NotOwner`] if the token's subject is not the
    /// resource's owner.
    fn verify_ownership(&self, claims: &VerifiedClaims) -> Result<(), AuthError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, claims: &VerifiedClaims) -> Result<(), AuthError> {
        if self.owner_id() == claims.sub {
            Ok(())
        } else {
            Err(AuthError::NotOwner)
        }
    }
}
