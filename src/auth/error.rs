// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Authentication and authorization errors.
//!
//! The taxonomy follows the boundary's fail-closed rules: anything that makes
//! the credential itself untrustworthy (malformed, expired, bad signature,
//! unknown key, unreachable key set) is a 401; a valid credential whose
//! subject lacks the required organisation, workspace, status or role is a
//! 403; share-link failures are a uniform 404 so that the existence of a
//! specific link cannot be inferred from the response; the maintenance write
//! lock is a 503.
//!
//! Messages are category-level only. They never include which claim or key
//! lookup failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication/authorization failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>` or the token is empty
    InvalidAuthHeader,
    /// Token does not have three base64url segments or a segment is undecodable
    MalformedToken,
    /// Token header names an algorithm other than the approved one
    UnsupportedAlgorithm,
    /// Token header carries no `kid`
    MissingKeyId,
    /// Signature does not verify against the selected public key
    SignatureInvalid,
    /// Token expired (beyond clock skew)
    Expired,
    /// Token not yet valid (beyond clock skew)
    NotYetValid,
    /// Issuer claim does not satisfy the domain's issuer rule
    IssuerMismatch,
    /// Authorized-party claim missing or not in the domain allow-list
    UnauthorizedParty,
    /// Key-set endpoint unreachable, non-2xx, or returned no keys
    KeySetUnavailable,
    /// Key set fetched but the requested `kid` is not in it
    SigningKeyNotFound,
    /// Verified token carries no subject
    MissingSubject,
    /// Verified tenant token carries no organisation identity
    NoActiveOrganisation,
    /// No workspace record matches the verified portal token
    WorkspaceNotFound,
    /// Workspace exists but is not active; carries the actual status for triage
    WorkspaceInactive(String),
    /// No portal user record matches the verified portal token
    PortalUserNotFound,
    /// Portal user exists but is deactivated
    PortalUserInactive,
    /// Context role is below the required role
    InsufficientRole,
    /// Resource is not granted to the caller's workspace
    OutOfScope,
    /// Share link absent, expired, or exhausted (deliberately uniform)
    LinkNotUsable,
    /// Maintenance write lock refuses mutating requests
    WriteLocked,
}

impl AuthError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm => "unsupported_algorithm",
            AuthError::MissingKeyId => "missing_key_id",
            AuthError::SignatureInvalid => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::IssuerMismatch => "invalid_issuer",
            AuthError::UnauthorizedParty => "unauthorized_party",
            AuthError::KeySetUnavailable => "key_set_unavailable",
            AuthError::SigningKeyNotFound => "signing_key_not_found",
            AuthError::MissingSubject => "missing_subject",
            AuthError::NoActiveOrganisation => "no_active_organisation",
            AuthError::WorkspaceNotFound => "workspace_not_found",
            AuthError::WorkspaceInactive(_) => "workspace_inactive",
            AuthError::PortalUserNotFound => "portal_user_not_found",
            AuthError::PortalUserInactive => "portal_user_inactive",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::OutOfScope => "out_of_scope",
            AuthError::LinkNotUsable => "link_not_usable",
            AuthError::WriteLocked => "write_locked",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::UnsupportedAlgorithm
            | AuthError::MissingKeyId
            | AuthError::SignatureInvalid
            | AuthError::Expired
            | AuthError::NotYetValid
            | AuthError::IssuerMismatch
            | AuthError::UnauthorizedParty
            | AuthError::KeySetUnavailable
            | AuthError::SigningKeyNotFound
            | AuthError::MissingSubject
            | AuthError::WorkspaceNotFound
            | AuthError::PortalUserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::NoActiveOrganisation
            | AuthError::WorkspaceInactive(_)
            | AuthError::PortalUserInactive
            | AuthError::InsufficientRole
            | AuthError::OutOfScope => StatusCode::FORBIDDEN,
            AuthError::LinkNotUsable => StatusCode::NOT_FOUND,
            AuthError::WriteLocked => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::UnsupportedAlgorithm => write!(f, "Token algorithm is not supported"),
            AuthError::MissingKeyId => write!(f, "Token header has no key id"),
            AuthError::SignatureInvalid => write!(f, "Token signature is invalid"),
            AuthError::Expired => write!(f, "Token has expired"),
            AuthError::NotYetValid => write!(f, "Token is not yet valid"),
            AuthError::IssuerMismatch => write!(f, "Token issuer is invalid"),
            AuthError::UnauthorizedParty => write!(f, "Token authorized party is not accepted"),
            AuthError::KeySetUnavailable => write!(f, "Verification keys are unavailable"),
            AuthError::SigningKeyNotFound => write!(f, "No matching verification key"),
            AuthError::MissingSubject => write!(f, "Token carries no subject"),
            AuthError::NoActiveOrganisation => write!(f, "No active organisation"),
            AuthError::WorkspaceNotFound => write!(f, "Workspace not found"),
            AuthError::WorkspaceInactive(status) => {
                write!(f, "Workspace is not active (status: {status})")
            }
            AuthError::PortalUserNotFound => write!(f, "Portal user not found"),
            AuthError::PortalUserInactive => write!(f, "Portal user is deactivated"),
            AuthError::InsufficientRole => write!(f, "Insufficient role for this operation"),
            AuthError::OutOfScope => write!(f, "Resource is not available to this workspace"),
            AuthError::LinkNotUsable => write!(f, "Share link not found or no longer active"),
            AuthError::WriteLocked => {
                write!(f, "Service is in maintenance mode; writes are disabled")
            }
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AuthRejection { error: self, request_id: None }.into_response()
    }
}

/// An [`AuthError`] paired with the request id it occurred under.
///
/// Extractors produce this so every error response correlates back to the
/// request without the guards themselves having to thread ids around.
#[derive(Debug)]
pub struct AuthRejection {
    pub error: AuthError,
    pub request_id: Option<String>,
}

impl AuthRejection {
    pub fn new(error: AuthError, request_id: impl Into<String>) -> Self {
        Self { error, request_id: Some(request_id.into()) }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = Json(AuthErrorBody {
            error: self.error.to_string(),
            error_code: self.error.error_code().to_string(),
            request_id: self.request_id,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn untrustworthy_credential_returns_401() {
        for err in [
            AuthError::MalformedToken,
            AuthError::SignatureInvalid,
            AuthError::Expired,
            AuthError::KeySetUnavailable,
            AuthError::SigningKeyNotFound,
            AuthError::WorkspaceNotFound,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{err}");
        }
    }

    #[test]
    fn valid_credential_without_privilege_returns_403() {
        for err in [
            AuthError::NoActiveOrganisation,
            AuthError::WorkspaceInactive("suspended".into()),
            AuthError::PortalUserInactive,
            AuthError::InsufficientRole,
            AuthError::OutOfScope,
        ] {
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN, "{err}");
        }
    }

    #[test]
    fn link_not_usable_returns_404() {
        assert_eq!(AuthError::LinkNotUsable.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn write_locked_returns_503() {
        assert_eq!(AuthError::WriteLocked.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn rejection_body_carries_request_id() {
        let response = AuthRejection::new(AuthError::Expired, "req-123").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "token_expired");
        assert_eq!(body["request_id"], "req-123");
    }

    #[test]
    fn workspace_inactive_surfaces_status() {
        let err = AuthError::WorkspaceInactive("archived".into());
        assert!(err.to_string().contains("archived"));
    }
}
