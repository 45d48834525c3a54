// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Request metadata helpers shared by the guards.

use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method};

/// Longest user-agent string persisted in audit metadata.
const USER_AGENT_MAX_BYTES: usize = 256;

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, super::error::AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(super::error::AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| super::error::AuthError::InvalidAuthHeader)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(super::error::AuthError::InvalidAuthHeader)?
        .trim();
    if token.is_empty() {
        return Err(super::error::AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Correlation id for the request.
///
/// The request-id layer stamps `x-request-id` before routing; a fresh UUID
/// covers requests that arrive without one (tests, direct invocations).
pub fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// First hop of `x-forwarded-for`, if present.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// User agent, truncated for storage.
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .map(|ua| {
            let mut end = ua.len().min(USER_AGENT_MAX_BYTES);
            while !ua.is_char_boundary(end) {
                end -= 1;
            }
            ua[..end].to_string()
        })
}

/// Whether the method mutates state (refused under the maintenance lock).
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
