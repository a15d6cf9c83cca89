// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Embedded post database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `posts`: post id → serialized Post (JSON bytes)
//! - `meta`: counter records (e.g., "next_post_id" → u64 little-endian)
//! - `auth_cache`: key → value bytes for the JWKS cache

use std::path::Path;

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::models::{Post, PostDraft};

use super::{KeyValueStore, StoreError, StoreResult};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: post id → serialized Post (JSON bytes).
const POSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("posts");

/// Counter records: name → value bytes (e.g., "next_post_id" → u64 LE).
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Auth-layer records: key → value bytes ("jwks", "jwks_ttl").
const AUTH_CACHE: TableDefinition<&str, &[u8]> = TableDefinition::new("auth_cache");

/// Meta record holding the next post id to allocate.
const NEXT_POST_ID: &str = "next_post_id";

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID database holding posts and auth cache records.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(POSTS)?;
            let _ = write_txn.open_table(META)?;
            let _ = write_txn.open_table(AUTH_CACHE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap readiness probe: can we open a read transaction?
    pub fn is_healthy(&self) -> bool {
        match self.db.begin_read() {
            Ok(txn) => txn.open_table(META).is_ok(),
            Err(_) => false,
        }
    }

    // =========================================================================
    // Post CRUD
    // =========================================================================

    /// Insert a new post, allocating its id from the counter in the same
    /// transaction so concurrent inserts never share an id.
    pub fn insert_post(&self, draft: &PostDraft) -> StoreResult<Post> {
        let write_txn = self.db.begin_write()?;
        let post = {
            let mut meta = write_txn.open_table(META)?;

            // Read the counter, dropping the guard before writing it back
            let id = {
                match meta.get(NEXT_POST_ID)? {
                    Some(v) => {
                        let bytes = v.value();
                        if bytes.len() >= 8 {
                            u64::from_le_bytes(bytes[..8].try_into().unwrap())
                        } else {
                            1
                        }
                    }
                    None => 1,
                }
            };
            meta.insert(NEXT_POST_ID, (id + 1).to_le_bytes().as_slice())?;

            let now = Utc::now();
            let post = Post {
                id,
                author_id: draft.author_id.clone(),
                content: draft.content.clone(),
                kind: draft.kind,
                data: draft.data.clone(),
                visibility: draft.visibility,
                created_at: now,
                updated_at: now,
            };

            let mut posts = write_txn.open_table(POSTS)?;
            posts.insert(post.id, serde_json::to_vec(&post)?.as_slice())?;
            post
        };
        write_txn.commit()?;
        Ok(post)
    }

    /// Look up a single post by id.
    pub fn post(&self, id: u64) -> StoreResult<Option<Post>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS)?;
        match table.get(id)? {
            Some(value) => {
                let post: Post = serde_json::from_slice(value.value())?;
                Ok(Some(post))
            }
            None => Ok(None),
        }
    }

    /// Paginated listing of posts in ascending id order.
    pub fn list_posts(&self, limit: usize, offset: usize) -> StoreResult<Vec<Post>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS)?;

        let mut posts = Vec::new();
        for entry in table.iter()?.skip(offset) {
            if posts.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            posts.push(serde_json::from_slice(value.value())?);
        }
        Ok(posts)
    }

    /// Replace the mutable fields of a stored post.
    ///
    /// Identity fields (`id`, `author_id`, `created_at`) are preserved from
    /// the stored row; callers enforce who may reach this point.
    pub fn update_post(&self, id: u64, draft: &PostDraft) -> StoreResult<Post> {
        let write_txn = self.db.begin_write()?;
        let post = {
            let mut table = write_txn.open_table(POSTS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Post {id}")))?;
                existing.value().to_vec()
            };

            let mut post: Post = serde_json::from_slice(&existing_bytes)?;
            post.content = draft.content.clone();
            post.kind = draft.kind;
            post.data = draft.data.clone();
            post.visibility = draft.visibility;
            post.updated_at = Utc::now();

            table.insert(id, serde_json::to_vec(&post)?.as_slice())?;
            post
        };
        write_txn.commit()?;
        Ok(post)
    }

    /// Delete a post by id.
    pub fn delete_post(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(POSTS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("Post {id}")))
        }
    }
}

// =============================================================================
// Auth cache records
// =============================================================================

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUTH_CACHE)?;
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUTH_CACHE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
