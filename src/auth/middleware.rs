// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Codeshare

//! Authorization gate for protected routes.
//!
//! Protected routers sit behind [`require_auth`], which verifies the
//! bearer token once per request and stashes the resulting
//! [`VerifiedClaims`] in request extensions. Handlers receive them
//! through the [`Auth`] extractor, which verifies on its own when no
//! middleware ran (handler-level tests rely on this).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

use super::claims::VerifiedClaims;
use super::error::AuthError;
use super::verifier::{bearer_token, verify_token};

/// Gate middleware: verify the bearer token and attach the claims.
///
/// # Usage
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/posts", get(list_posts))
///     .route_layer(axum::middleware::from_fn_with_state(
///         state.clone(),
///         require_auth,
///     ));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = {
        let token = match bearer_token(request.headers()) {
            Ok(token) => token,
            Err(e) => return e.into_response(),
        };

        match verify_token(token, &state.jwks, &state.config.issuer, &state.config.audience).await
        {
            Ok(claims) => claims,
            Err(e) => return e.into_response(),
        }
    };

    // Hand the claims to handlers through request extensions
    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Extractor for verified claims.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_post(
///     State(state): State<AppState>,
///     Auth(claims): Auth,
///     Json(draft): Json<PostDraft>,
/// ) -> Result<Json<Post>, ApiError> {
///     // claims.sub identifies the caller
/// }
/// ```
pub struct Auth(pub VerifiedClaims);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if the gate middleware already verified this request
        if let Some(claims) = parts.extensions.get::<VerifiedClaims>().cloned() {
            return Ok(Auth(claims));
        }

        let token = bearer_token(&parts.headers)?;
        let claims =
            verify_token(token, &state.jwks, &state.config.issuer, &state.config.audience).await?;
        Ok(Auth(claims))
    }
}
