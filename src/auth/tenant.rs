// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Tenant-console authentication.
//!
//! [`TenantGuard`] runs the provider-side pipeline: maintenance lock, bearer
//! extraction, claims verification against the tenant trust domain, and
//! derivation of a [`TenantContext`]. The organisation id in the context
//! comes exclusively from verified claims; nothing is ever read from the
//! request body, query, or headers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Method};
use chrono::{DateTime, Utc};

use super::error::{AuthError, AuthRejection};
use super::request::{bearer_token, is_mutating, request_id};
use super::roles::TenantRole;
use super::verifier::ClaimsVerifier;
use crate::state::AppState;

/// Provider-side identity for one request.
///
/// Deliberately a distinct nominal type from [`super::portal::PortalContext`]
/// even though both carry request metadata; the compiler is the first line of
/// defense against cross-tenant confusion.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub request_id: String,
    pub user_id: String,
    pub org_id: String,
    /// Role string from the verified org claim; interpreted by the role
    /// authorizer, never trusted as-is
    pub role: String,
    pub method: Method,
    pub path: String,
    pub started_at: DateTime<Utc>,
}

/// Guard for the tenant console trust domain.
pub struct TenantGuard {
    verifier: ClaimsVerifier,
    write_lock: Arc<AtomicBool>,
}

impl TenantGuard {
    pub fn new(verifier: ClaimsVerifier, write_lock: Arc<AtomicBool>) -> Self {
        Self { verifier, write_lock }
    }

    /// Authenticate a request against the tenant domain.
    pub async fn authenticate(&self, parts: &Parts) -> Result<TenantContext, AuthError> {
        // Cheapest check first: the maintenance lock needs no token work.
        if self.write_lock.load(Ordering::Relaxed) && is_mutating(&parts.method) {
            return Err(AuthError::WriteLocked);
        }

        let token = bearer_token(&parts.headers)?;
        let claims = self.verifier.verify(token).await?;

        let user_id = claims
            .subject
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError::MissingSubject)?;

        // A token without an organisation is valid but unusable here; the
        // failure is more specific than a generic auth error.
        let org = claims.org.ok_or(AuthError::NoActiveOrganisation)?;
        let role = org
            .role
            .unwrap_or_else(|| TenantRole::Inspector.to_string());

        let context = TenantContext {
            request_id: request_id(parts),
            user_id,
            org_id: org.org_id,
            role,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            started_at: Utc::now(),
        };
        tracing::debug!(
            request_id = %context.request_id,
            org_id = %context.org_id,
            "tenant authentication succeeded"
        );
        Ok(context)
    }
}

/// Extractor requiring tenant authentication.
///
/// ```rust,ignore
/// async fn handler(TenantAuth(ctx): TenantAuth) -> impl IntoResponse {
///     // ctx.org_id scopes every downstream query
/// }
/// ```
pub struct TenantAuth(pub TenantContext);

impl FromRequestParts<AppState> for TenantAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match state.tenant_guard.authenticate(parts).await {
            Ok(context) => Ok(TenantAuth(context)),
            Err(error) => {
                let request_id = request_id(parts);
                tracing::warn!(
                    request_id = %request_id,
                    error_code = error.error_code(),
                    "tenant authentication failed"
                );
                Err(AuthRejection::new(error, request_id))
            }
        }
    }
}
