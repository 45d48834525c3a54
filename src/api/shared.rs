// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Share-link endpoint.

use axum::Json;

use crate::{auth::SharedAccess, models::SharedResourceInfo};

#[utoipa::path(
    get,
    path = "/shared/{token}",
    params(("token" = String, Path, description = "Share-link token")),
    tag = "Shared",
    responses(
        (status = 200, body = SharedResourceInfo),
        (status = 404, description = "Link not found or no longer active"),
    )
)]
pub async fn shared_resource(SharedAccess(ctx): SharedAccess) -> Json<SharedResourceInfo> {
    Json(SharedResourceInfo::from(&ctx))
}
