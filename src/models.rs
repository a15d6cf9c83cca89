// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! # API Data Models
//!
//! This module defines the post resource and its request shapes. All types
//! derive `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation.
//!
//! ## Post Anatomy
//!
//! A post is a piece of shared code: either a permalink range into a
//! repository or a pasted snippet, plus whatever the author wants to say
//! about it. Posts carry the author's subject id so ownership checks can
//! compare it against the verified token.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::OwnedResource;

// =============================================================================
// Post Enums
// =============================================================================

/// What the `data` field of a post holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PostKind {
    /// A permalink into a repository with a line range.
    PermalinkRange,
    /// A pasted snippet of code.
    Code,
}

/// Who can see a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostVisibility {
    /// Visible to everyone.
    Public,
    /// Visible to the author's followers only.
    Followers,
}

// =============================================================================
// Post Models
// =============================================================================

/// A shared piece of code, attributed to its author.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Post {
    /// Unique identifier, allocated by the store.
    pub id: u64,
    /// Subject id of the author (matches the token's `sub` claim).
    pub author_id: String,
    /// Commentary the author attached to the shared code.
    pub content: String,
    /// What `data` holds.
    pub kind: PostKind,
    /// The permalink or pasted code itself.
    pub data: String,
    /// Who can see this post.
    pub visibility: PostVisibility,
    /// When the post was created.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When the post was last modified.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl OwnedResource for Post {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

/// Request body for creating or replacing a post.
///
/// Identity fields (`id`, timestamps) are never client-supplied; the store
/// assigns them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostDraft {
    /// Subject id of the author. Must match the caller's token.
    pub author_id: String,
    /// Commentary for the shared code.
    pub content: String,
    /// What `data` holds.
    pub kind: PostKind,
    /// The permalink or pasted code itself.
    pub data: String,
    /// Who can see the post.
    pub visibility: PostVisibility,
}

impl PostDraft {
    /// Check required fields, reporting every failure in one message.
    pub fn validate(&self) -> Result<(), String> {
        let mut errs = Vec::new();

        if self.author_id.is_empty() {
            errs.push("field 'author_id' is required");
        }
        if self.content.is_empty() {
            errs.push("field 'content' is required");
        }
        if self.data.is_empty() {
            errs.push("field 'data' is required");
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs.join("; "))
        }
    }
}

impl OwnedResource for PostDraft {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

// =============================================================================
// Tests
// =============================================================================
