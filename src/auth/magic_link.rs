// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Magic-link verification.
//!
//! Share links carry a high-entropy plaintext token in the URL path. The
//! verifier hashes the plaintext and performs every lookup by digest, so the
//! secret is never persisted or indexed. Absence, expiry, exhaustion, and
//! too-short tokens all produce the same response; a caller cannot learn
//! whether a particular link ever existed.
//!
//! Access accounting (the use-count increment plus audit metadata) happens
//! inside one conditional write in the repository; see
//! [`crate::storage::MagicLinkRepository::redeem`].

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::{request::Parts, Method};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::error::{AuthError, AuthRejection};
use super::request::{client_ip, request_id, user_agent};
use crate::state::AppState;
use crate::storage::{AccessMetadata, AuthDatabase, MagicLinkRepository, RedeemOutcome, ResourceType};

/// Tokens shorter than this are rejected without a database round-trip.
pub const MIN_TOKEN_LENGTH: usize = 32;

/// Scoped access derived from a verified magic link.
#[derive(Debug, Clone)]
pub struct ResourceAccessContext {
    pub request_id: String,
    pub link_id: String,
    pub client_workspace_id: String,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub method: Method,
    pub path: String,
    pub started_at: DateTime<Utc>,
}

/// Verifier for hash-addressed, limited-use share links.
pub struct MagicLinkVerifier {
    db: Arc<AuthDatabase>,
    ip_pepper: Vec<u8>,
}

impl MagicLinkVerifier {
    pub fn new(db: Arc<AuthDatabase>, ip_pepper: impl Into<Vec<u8>>) -> Self {
        Self { db, ip_pepper: ip_pepper.into() }
    }

    /// Digest of a plaintext token: base64url SHA-256.
    ///
    /// This is the only form of the token that ever reaches storage.
    pub fn token_digest(token: &str) -> String {
        Base64UrlUnpadded::encode_string(&Sha256::digest(token.as_bytes()))
    }

    /// One-way hash of a caller IP for audit metadata.
    fn hash_ip(&self, ip: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.ip_pepper)
            .expect("HMAC accepts any key length");
        mac.update(ip.as_bytes());
        Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes())
    }

    /// Verify a plaintext path token and consume one use of the link.
    pub fn verify(&self, parts: &Parts, token: &str) -> Result<ResourceAccessContext, AuthError> {
        if token.len() < MIN_TOKEN_LENGTH {
            return Err(AuthError::LinkNotUsable);
        }

        let digest = Self::token_digest(token);
        let meta = AccessMetadata {
            ip_hash: client_ip(&parts.headers).map(|ip| self.hash_ip(&ip)),
            user_agent: user_agent(&parts.headers),
        };

        let outcome = MagicLinkRepository::new(&self.db)
            .redeem(&digest, Utc::now(), meta)
            .map_err(|err| {
                tracing::error!(error = %err, "magic link redemption failed");
                AuthError::LinkNotUsable
            })?;

        let request_id = request_id(parts);
        match outcome {
            RedeemOutcome::Redeemed(link) => {
                tracing::debug!(
                    request_id = %request_id,
                    link_id = %link.id,
                    "magic link accepted"
                );
                Ok(ResourceAccessContext {
                    request_id,
                    link_id: link.id,
                    client_workspace_id: link.workspace_id,
                    resource_type: link.resource_type,
                    resource_id: link.resource_id,
                    method: parts.method.clone(),
                    path: parts.uri.path().to_string(),
                    started_at: Utc::now(),
                })
            }
            outcome => {
                // NotFound, Expired, and Exhausted answer identically.
                tracing::debug!(request_id = %request_id, ?outcome, "magic link refused");
                Err(AuthError::LinkNotUsable)
            }
        }
    }
}

/// Extractor for share-link routes with a `{token}` path segment.
pub struct SharedAccess(pub ResourceAccessContext);

impl FromRequestParts<AppState> for SharedAccess {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(token) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::new(AuthError::LinkNotUsable, request_id(parts)))?;

        match state.magic_links.verify(parts, &token) {
            Ok(context) => Ok(SharedAccess(context)),
            Err(error) => {
                let request_id = request_id(parts);
                tracing::warn!(
                    request_id = %request_id,
                    error_code = error.error_code(),
                    "magic link verification failed"
                );
                Err(AuthRejection::new(error, request_id))
            }
        }
    }
}
