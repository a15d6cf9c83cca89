// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

use std::sync::Arc;

use crate::auth::JwksCache;
use crate::config::AppConfig;
use crate::store::{Database, KeyValueStore};

/// Shared application state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub jwks: JwksCache,
}

impl AppState {
    /// Wires the JWKS cache to the database so verification keys survive
    /// restarts alongside the posts.
    pub fn new(config: AppConfig, db: Database) -> Self {
        let db = Arc::new(db);
        let kv: Arc<dyn KeyValueStore> = db.clone();
        let jwks = JwksCache::new(config.jwks_url.clone(), kv);
        Self {
            config: Arc::new(config),
            db,
            jwks,
        }
    }
}
