// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Client portal endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::PortalAuth,
    error::ApiError,
    models::{PortalSessionInfo, SiteAccess},
    state::AppState,
    storage::AccessGrantRepository,
};

#[utoipa::path(
    get,
    path = "/portal/v1/session",
    tag = "Portal",
    responses(
        (status = 200, body = PortalSessionInfo),
        (status = 401, description = "Credential untrustworthy or identity unresolvable"),
        (status = 403, description = "Workspace or user not active"),
    )
)]
pub async fn portal_session_info(PortalAuth(ctx): PortalAuth) -> Json<PortalSessionInfo> {
    Json(PortalSessionInfo::from(&ctx))
}

#[utoipa::path(
    get,
    path = "/portal/v1/sites/{site_id}",
    params(("site_id" = String, Path, description = "Site identifier")),
    tag = "Portal",
    responses(
        (status = 200, body = SiteAccess),
        (status = 403, description = "Site not granted to the caller's workspace"),
    )
)]
pub async fn get_site(
    PortalAuth(ctx): PortalAuth,
    Path(site_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SiteAccess>, ApiError> {
    // The token verified; scope is a separate question. A workspace only
    // sees sites it holds a grant for.
    let granted = AccessGrantRepository::new(&state.db)
        .has_access(&ctx.client_workspace_id, "site", &site_id)
        .map_err(|err| ApiError::internal(format!("Access check failed: {err}")))?;

    if !granted {
        return Err(ApiError::forbidden(
            "Resource is not available to this workspace",
        ));
    }

    Ok(Json(SiteAccess {
        request_id: ctx.request_id,
        site_id,
        workspace_id: ctx.client_workspace_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use chrono::Utc;

    fn ctx(workspace_id: &str) -> crate::auth::PortalContext {
        crate::auth::PortalContext {
            request_id: "req-p".to_string(),
            client_user_id: "user_ext_1".to_string(),
            client_user_db_id: "u-db-1".to_string(),
            client_workspace_id: workspace_id.to_string(),
            client_role: "viewer".to_string(),
            client_user_name: "Robin Vega".to_string(),
            method: Method::GET,
            path: "/portal/v1/sites/site-1".to_string(),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn granted_workspace_reads_its_site() {
        let (_dir, state) = AppState::for_tests();
        AccessGrantRepository::new(&state.db)
            .grant("ws-a", "site", "site-1")
            .unwrap();

        let result = get_site(
            PortalAuth(ctx("ws-a")),
            Path("site-1".to_string()),
            State(state),
        )
        .await
        .unwrap();
        assert_eq!(result.0.workspace_id, "ws-a");
        assert_eq!(result.0.site_id, "site-1");
    }

    #[tokio::test]
    async fn verified_identity_from_another_workspace_is_forbidden() {
        let (_dir, state) = AppState::for_tests();
        // site-1 belongs to workspace A; the caller authenticated as
        // workspace B with a perfectly valid token.
        AccessGrantRepository::new(&state.db)
            .grant("ws-a", "site", "site-1")
            .unwrap();

        let err = get_site(
            PortalAuth(ctx("ws-b")),
            Path("site-1".to_string()),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn portal_session_echoes_context() {
        let Json(info) = portal_session_info(PortalAuth(ctx("ws-a"))).await;
        assert_eq!(info.workspace_id, "ws-a");
        assert_eq!(info.role, "viewer");
        assert_eq!(info.user_name, "Robin Vega");
    }
}
