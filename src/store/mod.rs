// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Persistence layer backed by redb (pure Rust, ACID).
//!
//! Two concerns share one database file:
//!
//! - Post storage: the feed's posts plus the id counter, owned by
//!   [`Database`].
//! - Auth cache records: opaque byte records written through the
//!   [`KeyValueStore`] trait, so the JWKS cache never needs to know it is
//!   talking to redb.

mod database;

pub use database::Database;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Key-Value Seam
// =============================================================================

/// Byte-oriented record store for small auth-layer state.
///
/// Readers must treat any record they cannot interpret as absent; the
/// store never guarantees a record was written by the current build.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the record stored under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write (or overwrite) the record stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

// =============================================================================
// Test Doubles
// =============================================================================
