// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Tenant console session endpoints.

use axum::Json;

use crate::{
    auth::{require_tenant_role, AuthRejection, TenantAuth, TenantRole},
    models::SessionInfo,
};

#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses(
        (status = 200, body = SessionInfo),
        (status = 401, description = "Credential is untrustworthy"),
        (status = 403, description = "No active organisation"),
    )
)]
pub async fn session_info(TenantAuth(ctx): TenantAuth) -> Json<SessionInfo> {
    Json(SessionInfo::from(&ctx))
}

#[utoipa::path(
    get,
    path = "/v1/admin/session",
    tag = "Session",
    responses(
        (status = 200, body = SessionInfo),
        (status = 403, description = "Role below manager"),
    )
)]
pub async fn admin_session_info(
    TenantAuth(ctx): TenantAuth,
) -> Result<Json<SessionInfo>, AuthRejection> {
    require_tenant_role(&ctx.role, TenantRole::Manager)
        .map_err(|error| AuthRejection::new(error, ctx.request_id.clone()))?;
    Ok(Json(SessionInfo::from(&ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use chrono::Utc;

    fn ctx(role: &str) -> crate::auth::TenantContext {
        crate::auth::TenantContext {
            request_id: "req-1".to_string(),
            user_id: "user_1".to_string(),
            org_id: "org_1".to_string(),
            role: role.to_string(),
            method: Method::GET,
            path: "/v1/session".to_string(),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn session_echoes_context() {
        let Json(info) = session_info(TenantAuth(ctx("inspector"))).await;
        assert_eq!(info.user_id, "user_1");
        assert_eq!(info.org_id, "org_1");
        assert_eq!(info.role, "inspector");
    }

    #[tokio::test]
    async fn admin_session_requires_manager() {
        assert!(admin_session_info(TenantAuth(ctx("inspector"))).await.is_err());
        assert!(admin_session_info(TenantAuth(ctx("manager"))).await.is_ok());
        // Historical spelling counts as the same role.
        assert!(admin_session_info(TenantAuth(ctx("org:admin"))).await.is_ok());
    }
}
