// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! API response models.

use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{PortalContext, ResourceAccessContext, TenantContext};

/// Tenant session summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionInfo {
    pub request_id: String,
    pub user_id: String,
    pub org_id: String,
    pub role: String,
}

impl From<&TenantContext> for SessionInfo {
    fn from(ctx: &TenantContext) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            user_id: ctx.user_id.clone(),
            org_id: ctx.org_id.clone(),
            role: ctx.role.clone(),
        }
    }
}

/// Portal session summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PortalSessionInfo {
    pub request_id: String,
    pub user_id: String,
    pub user_name: String,
    pub workspace_id: String,
    pub role: String,
}

impl From<&PortalContext> for PortalSessionInfo {
    fn from(ctx: &PortalContext) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            user_id: ctx.client_user_id.clone(),
            user_name: ctx.client_user_name.clone(),
            workspace_id: ctx.client_workspace_id.clone(),
            role: ctx.client_role.clone(),
        }
    }
}

/// Resource summary returned for a verified share link.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SharedResourceInfo {
    pub request_id: String,
    pub link_id: String,
    pub workspace_id: String,
    pub resource_type: String,
    pub resource_id: String,
}

impl From<&ResourceAccessContext> for SharedResourceInfo {
    fn from(ctx: &ResourceAccessContext) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            link_id: ctx.link_id.clone(),
            workspace_id: ctx.client_workspace_id.clone(),
            resource_type: ctx.resource_type.to_string(),
            resource_id: ctx.resource_id.clone(),
        }
    }
}

/// Scoped site access acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SiteAccess {
    pub request_id: String,
    pub site_id: String,
    pub workspace_id: String,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Health {
    pub status: &'static str,
}
