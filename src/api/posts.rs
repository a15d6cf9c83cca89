// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Post management API endpoints.
//!
//! CRUD over shared code posts. All routes sit behind the bearer-token
//! gate; mutating operations additionally require the token subject to
//! own the post they touch.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::{Auth, OwnershipEnforcer},
    error::ApiError,
    models::{Post, PostDraft},
    state::AppState,
    store::StoreError,
};

const DEFAULT_PAGE_LIMIT: i64 = 5;
const MAX_PAGE_LIMIT: i64 = 25;
const MAX_PAGE_OFFSET: i64 = 10_000;

/// Query parameters for the post list.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Maximum number of posts to return (default: 5, capped at 25).
    #[param(default = 5, minimum = 0, maximum = 25)]
    #[serde(default, deserialize_with = "lenient_i64")]
    pub limit: Option<i64>,
    /// Number of posts to skip (default: 0, capped at 10000).
    #[param(default = 0, minimum = 0, maximum = 10000)]
    #[serde(default, deserialize_with = "lenient_i64")]
    pub offset: Option<i64>,
}

impl PageQuery {
    /// Resolves to a concrete `(limit, offset)` pair, clamping values
    /// outside the supported window.
    pub fn resolve(&self) -> (usize, usize) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(0, MAX_PAGE_LIMIT);
        let offset = self.offset.unwrap_or(0).clamp(0, MAX_PAGE_OFFSET);
        (limit as usize, offset as usize)
    }
}

/// Unparsable values fall back to the default instead of rejecting the
/// whole request.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Create a new post attributed to the authenticated user.
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    security(("bearer_auth" = [])),
    request_body = PostDraft,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Body failed validation"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "author_id does not match the token subject"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_post(
    Auth(claims): Auth,
    State(state): State<AppState>,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Post>), ApiError> {
    draft.validate().map_err(ApiError::bad_request)?;

    // Ownership before any persistence call
    draft
        .verify_ownership(&claims)
        .map_err(|_| ApiError::forbidden("You do not have permission to perform this action"))?;

    let post = state.db.insert_post(&draft).map_err(|e| {
        tracing::error!(error = %e, "Failed to insert post");
        ApiError::internal("Failed to store post")
    })?;

    let location = format!("/api/posts/{}", post.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(post),
    ))
}

/// List posts in id order, paged by `limit` and `offset`.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of posts", body = [Post]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let (limit, offset) = page.resolve();
    let posts = state.db.list_posts(limit, offset).map_err(|e| {
        tracing::error!(error = %e, "Failed to list posts");
        ApiError::internal("Failed to access storage")
    })?;
    Ok(Json(posts))
}

/// Fetch a single post by id.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(
        ("id" = u64, Path, description = "Identifier of the post")
    ),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn read_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .db
        .post(id)
        .map_err(|e| {
            tracing::error!(error = %e, post_id = id, "Failed to read post");
            ApiError::internal("Failed to access storage")
        })?
        .ok_or_else(|| ApiError::not_found(format!("Post {id} not found")))?;
    Ok(Json(post))
}

/// Replace the content of an existing post.
///
/// The stored post must belong to the token subject, and the submitted
/// body may only attribute the post to that same subject, so `author_id`
/// can never change hands through this endpoint.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(
        ("id" = u64, Path, description = "Identifier of the post to update")
    ),
    request_body = PostDraft,
    responses(
        (status = 200, description = "Updated post", body = Post),
        (status = 400, description = "Body failed validation"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this post"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_post(
    Auth(claims): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(draft): Json<PostDraft>,
) -> Result<Json<Post>, ApiError> {
    draft.validate().map_err(ApiError::bad_request)?;

    let existing = state
        .db
        .post(id)
        .map_err(|e| {
            tracing::error!(error = %e, post_id = id, "Failed to read post");
            ApiError::internal("Failed to access storage")
        })?
        .ok_or_else(|| ApiError::not_found(format!("Post {id} not found")))?;

    // Verify ownership of both the stored post and the submitted body
    existing
        .verify_ownership(&claims)
        .map_err(|_| ApiError::forbidden("You don't have permission to modify this post"))?;
    draft
        .verify_ownership(&claims)
        .map_err(|_| ApiError::forbidden("You do not have permission to perform this action"))?;

    let updated = state.db.update_post(id, &draft).map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found(format!("Post {id} not found")),
        other => {
            tracing::error!(error = %other, post_id = id, "Failed to update post");
            ApiError::internal("Failed to update post")
        }
    })?;
    Ok(Json(updated))
}

/// Delete a post owned by the authenticated user.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(
        ("id" = u64, Path, description = "Identifier of the post to delete")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this post"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    Auth(claims): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let existing = state
        .db
        .post(id)
        .map_err(|e| {
            tracing::error!(error = %e, post_id = id, "Failed to read post");
            ApiError::internal("Failed to access storage")
        })?
        .ok_or_else(|| ApiError::not_found(format!("Post {id} not found")))?;

    existing
        .verify_ownership(&claims)
        .map_err(|_| ApiError::forbidden("You don't have permission to delete this post"))?;

    state.db.delete_post(id).map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found(format!("Post {id} not found")),
        other => {
            tracing::error!(error = %other, post_id = id, "Failed to delete post");
            ApiError::internal("Failed to delete post")
        }
    })?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    use crate::auth::testutil::{base_claims, TEST_AUDIENCE};
    use crate::auth::VerifiedClaims;
    use crate::config::AppConfig;
    use crate::models::{PostKind, PostVisibility};
    use crate::store::Database;

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_values(
            "auth.codeshare.test",
            TEST_AUDIENCE,
            dir.path().to_path_buf(),
            "127.0.0.1".to_string(),
            0,
        )
        .unwrap();
        let db = Database::open(&config.db_path()).unwrap();
        (AppState::new(config, db), dir)
    }

    fn claims_for(sub: &str) -> VerifiedClaims {
        serde_json::from_value(base_claims(sub)).unwrap()
    }

    fn draft_for(author: &str) -> PostDraft {
        PostDraft {
            author_id: author.to_string(),
            content: "Look at this off-by-one".to_string(),
            kind: PostKind::PermalinkRange,
            data: "https://codeshare.example/f/42#L10-L20".to_string(),
            visibility: PostVisibility::Public,
        }
    }

    #[tokio::test]
    async fn create_post_persists_and_points_at_the_new_resource() {
        let (state, _dir) = test_state();

        let (status, headers, Json(post)) = create_post(
            Auth(claims_for("alice")),
            State(state.clone()),
            Json(draft_for("alice")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[0].0, header::LOCATION);
        assert_eq!(headers[0].1, format!("/api/posts/{}", post.id));
        assert_eq!(post.id, 1);
        assert_eq!(post.author_id, "alice");
        assert_eq!(post.created_at, post.updated_at);

        let stored = state.db.post(post.id).unwrap().unwrap();
        assert_eq!(stored, post);
    }

    #[tokio::test]
    async fn create_post_for_someone_else_is_forbidden_and_writes_nothing() {
        let (state, _dir) = test_state();

        let err = create_post(
            Auth(claims_for("alice")),
            State(state.clone()),
            Json(draft_for("bob")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(state.db.post(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn create_post_reports_every_invalid_field() {
        let (state, _dir) = test_state();
        let draft = PostDraft {
            author_id: String::new(),
            content: String::new(),
            kind: PostKind::Code,
            data: String::new(),
            visibility: PostVisibility::Public,
        };

        let err = create_post(Auth(claims_for("alice")), State(state), Json(draft))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("author_id"));
        assert!(err.message.contains("content"));
        assert!(err.message.contains("data"));
    }

    #[tokio::test]
    async fn list_posts_returns_inserted_posts_in_id_order() {
        let (state, _dir) = test_state();
        for _ in 0..3 {
            state.db.insert_post(&draft_for("alice")).unwrap();
        }

        let Json(posts) = list_posts(
            State(state),
            Query(PageQuery {
                limit: None,
                offset: None,
            }),
        )
        .await
        .unwrap();

        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn read_post_missing_is_not_found() {
        let (state, _dir) = test_state();
        let err = read_post(State(state), Path(99)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Post 99 not found");
    }

    #[tokio::test]
    async fn update_post_by_owner_replaces_content_but_not_identity() {
        let (state, _dir) = test_state();
        let created = state.db.insert_post(&draft_for("alice")).unwrap();

        let mut draft = draft_for("alice");
        draft.content = "Actually it was off by two".to_string();
        let Json(updated) = update_post(
            Auth(claims_for("alice")),
            State(state),
            Path(created.id),
            Json(draft),
        )
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.author_id, "alice");
        assert_eq!(updated.content, "Actually it was off by two");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_post_by_non_owner_is_forbidden_and_changes_nothing() {
        let (state, _dir) = test_state();
        let created = state.db.insert_post(&draft_for("alice")).unwrap();

        let err = update_post(
            Auth(claims_for("bob")),
            State(state.clone()),
            Path(created.id),
            Json(draft_for("bob")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let stored = state.db.post(created.id).unwrap().unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn update_post_cannot_reassign_the_author() {
        let (state, _dir) = test_state();
        let created = state.db.insert_post(&draft_for("alice")).unwrap();

        let err = update_post(
            Auth(claims_for("alice")),
            State(state.clone()),
            Path(created.id),
            Json(draft_for("bob")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(state.db.post(created.id).unwrap().unwrap().author_id, "alice");
    }

    #[tokio::test]
    async fn update_post_missing_is_not_found() {
        let (state, _dir) = test_state();
        let err = update_post(
            Auth(claims_for("alice")),
            State(state),
            Path(7),
            Json(draft_for("alice")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_post_by_owner_removes_it() {
        let (state, _dir) = test_state();
        let created = state.db.insert_post(&draft_for("alice")).unwrap();

        let status = delete_post(Auth(claims_for("alice")), State(state.clone()), Path(created.id))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.db.post(created.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_post_by_non_owner_is_forbidden_and_keeps_the_row() {
        let (state, _dir) = test_state();
        let created = state.db.insert_post(&draft_for("alice")).unwrap();

        let err = delete_post(Auth(claims_for("bob")), State(state.clone()), Path(created.id))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(state.db.post(created.id).unwrap().is_some());
    }

    #[test]
    fn page_query_parses_leniently() {
        let uri: Uri = "/api/posts?limit=abc&offset=7".parse().unwrap();
        let Query(page) = Query::<PageQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(page.limit, None);
        assert_eq!(page.offset, Some(7));
        assert_eq!(page.resolve(), (5, 7));

        let uri: Uri = "/api/posts".parse().unwrap();
        let Query(page) = Query::<PageQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(page.resolve(), (5, 0));
    }

    #[test]
    fn page_query_clamps_abusive_values() {
        let page = PageQuery {
            limit: Some(500),
            offset: Some(-3),
        };
        assert_eq!(page.resolve(), (25, 0));

        let page = PageQuery {
            limit: Some(-1),
            offset: Some(50_000),
        };
        assert_eq!(page.resolve(), (0, 10_000));
    }
}
