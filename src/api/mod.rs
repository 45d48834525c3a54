// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{Health, PortalSessionInfo, SessionInfo, SharedResourceInfo, SiteAccess},
    state::AppState,
};

pub mod health;
pub mod portal;
pub mod session;
pub mod shared;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/v1/session", get(session::session_info))
        .route("/v1/admin/session", get(session::admin_session_info))
        .route("/portal/v1/session", get(portal::portal_session_info))
        .route("/portal/v1/sites/{site_id}", get(portal::get_site))
        .route("/shared/{token}", get(shared::shared_resource))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        session::session_info,
        session::admin_session_info,
        portal::portal_session_info,
        portal::get_site,
        shared::shared_resource
    ),
    components(
        schemas(
            Health,
            SessionInfo,
            PortalSessionInfo,
            SiteAccess,
            SharedResourceInfo
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Session", description = "Tenant console sessions"),
        (name = "Portal", description = "Client portal sessions and scoped resources"),
        (name = "Shared", description = "Share-link access")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (_dir, state) = AppState::for_tests();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
