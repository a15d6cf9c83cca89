// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    models::{Post, PostDraft, PostKind, PostVisibility},
    state::AppState,
};

pub mod health;
pub mod posts;

pub fn router(state: AppState) -> Router {
    // Every post route sits behind the bearer-token gate; health probes
    // and the API docs stay public.
    let post_routes = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::read_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/api", post_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        posts::create_post,
        posts::list_posts,
        posts::read_post,
        posts::update_post,
        posts::delete_post,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Post,
            PostDraft,
            PostKind,
            PostVisibility,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Posts", description = "Shared code post management"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;
