// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Codeshare Post API - Authenticated Code-Sharing Service
//!
//! This crate provides the post service of Codeshare: CRUD over shared
//! code snippets and permalinks, guarded by RS256 bearer-token
//! verification against the identity provider's JWKS, with verification
//! keys cached in the embedded redb store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer-token verification and ownership (RS256/JWKS)
//! - `store` - Embedded persistence (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
