// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

use axum::Json;

use crate::models::Health;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = Health))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
