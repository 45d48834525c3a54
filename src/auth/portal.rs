// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Client-portal authentication.
//!
//! A parallel pipeline to the tenant guard with its own trust domain
//! configuration and its own key-set cache. After claims verification the
//! guard resolves internal records: the workspace behind the external org id
//! and the portal user scoped to that workspace. The resulting
//! [`PortalContext`] is a distinct nominal type from the tenant context.
//!
//! The last-access timestamp write is detached: it runs on its own task,
//! its errors are logged and swallowed, and the request never waits for it.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Method};
use chrono::{DateTime, Utc};

use super::error::{AuthError, AuthRejection};
use super::request::{bearer_token, request_id};
use super::verifier::ClaimsVerifier;
use crate::state::AppState;
use crate::storage::{AuthDatabase, PortalUserRepository, WorkspaceRepository, WorkspaceStatus};

/// Client-side identity for one request.
#[derive(Debug, Clone)]
pub struct PortalContext {
    pub request_id: String,
    /// External user id as issued by the portal identity provider
    pub client_user_id: String,
    /// Internal portal-user record id
    pub client_user_db_id: String,
    /// Internal workspace id
    pub client_workspace_id: String,
    /// Role string from the user record (not from the token)
    pub client_role: String,
    pub client_user_name: String,
    pub method: Method,
    pub path: String,
    pub started_at: DateTime<Utc>,
}

/// Guard for the client portal trust domain.
pub struct PortalGuard {
    verifier: ClaimsVerifier,
    db: Arc<AuthDatabase>,
}

impl PortalGuard {
    pub fn new(verifier: ClaimsVerifier, db: Arc<AuthDatabase>) -> Self {
        Self { verifier, db }
    }

    /// Authenticate a request against the portal domain and resolve the
    /// internal workspace and user records.
    pub async fn authenticate(&self, parts: &Parts) -> Result<PortalContext, AuthError> {
        let token = bearer_token(&parts.headers)?;
        let claims = self.verifier.verify(token).await?;

        let external_user_id = claims
            .subject
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        let org = claims.org.ok_or(AuthError::WorkspaceNotFound)?;

        let workspace = WorkspaceRepository::new(&self.db)
            .get_by_external_org_id(&org.org_id)
            .map_err(|err| {
                tracing::error!(error = %err, "workspace lookup failed");
                AuthError::WorkspaceNotFound
            })?
            .ok_or(AuthError::WorkspaceNotFound)?;

        if workspace.status != WorkspaceStatus::Active {
            // Surfacing the actual status makes support triage possible
            // without weakening the workspace-existence check above.
            return Err(AuthError::WorkspaceInactive(workspace.status.to_string()));
        }

        let user = PortalUserRepository::new(&self.db)
            .get(&workspace.id, &external_user_id)
            .map_err(|err| {
                tracing::error!(error = %err, "portal user lookup failed");
                AuthError::PortalUserNotFound
            })?
            .ok_or(AuthError::PortalUserNotFound)?;

        if !user.active {
            return Err(AuthError::PortalUserInactive);
        }

        self.record_last_access(workspace.id.clone(), external_user_id.clone());

        let context = PortalContext {
            request_id: request_id(parts),
            client_user_id: external_user_id,
            client_user_db_id: user.id,
            client_workspace_id: workspace.id,
            client_role: user.role,
            client_user_name: user.display_name,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            started_at: Utc::now(),
        };
        tracing::debug!(
            request_id = %context.request_id,
            workspace_id = %context.client_workspace_id,
            "portal authentication succeeded"
        );
        Ok(context)
    }

    /// Fire-and-forget last-access accounting. Never awaited, never retried
    /// inline; a failure is a log line, not a request failure.
    fn record_last_access(&self, workspace_id: String, external_user_id: String) {
        let db = Arc::clone(&self.db);
        tokio::spawn(async move {
            let result = PortalUserRepository::new(&db).touch_last_access(
                &workspace_id,
                &external_user_id,
                Utc::now(),
            );
            if let Err(err) = result {
                tracing::warn!(
                    error = %err,
                    workspace_id = %workspace_id,
                    "last-access write failed"
                );
            }
        });
    }
}

/// Extractor requiring portal authentication.
pub struct PortalAuth(pub PortalContext);

impl FromRequestParts<AppState> for PortalAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match state.portal_guard.authenticate(parts).await {
            Ok(context) => Ok(PortalAuth(context)),
            Err(error) => {
                let request_id = request_id(parts);
                tracing::warn!(
                    request_id = %request_id,
                    error_code = error.error_code(),
                    "portal authentication failed"
                );
                Err(AuthRejection::new(error, request_id))
            }
        }
    }
}
