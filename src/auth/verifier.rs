// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Signed-token verification against a trust domain.
//!
//! Verification is deliberately explicit rather than delegated to a JWT
//! validation call: the token is split, the header inspected, the signature
//! checked over the exact `header.payload` bytes with the selected public
//! key, and each claim validated in turn. Every failure is terminal; no
//! partial claims ever escape.

use chrono::Utc;
use ring::signature::{RsaPublicKeyComponents, RSA_PKCS1_2048_8192_SHA256};

use super::claims::{RawClaims, SignedClaims};
use super::error::AuthError;
use super::keyset::KeySetCache;
use super::token::RawToken;

/// Clock skew tolerance applied to `exp` and `nbf` (300 seconds).
pub const CLOCK_SKEW_LEEWAY_SECS: i64 = 300;

/// The only signature algorithm either trust domain accepts.
const APPROVED_ALGORITHM: &str = "RS256";

/// How a domain matches the issuer claim.
#[derive(Debug, Clone)]
pub enum IssuerRule {
    /// Issuer must equal the configured value exactly (portal domain).
    Exact(String),
    /// Issuer must contain the configured fragment (tenant domain; the
    /// provider runs per-environment issuer hosts under one suffix).
    Contains(String),
}

impl IssuerRule {
    fn matches(&self, issuer: &str) -> bool {
        match self {
            IssuerRule::Exact(expected) => issuer == expected,
            IssuerRule::Contains(fragment) => issuer.contains(fragment.as_str()),
        }
    }
}

/// How a domain treats the `azp` claim against its allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizedPartyPolicy {
    /// `azp` may be absent; when present it must be allow-listed.
    AllowListWhenPresent,
    /// `azp` must be present and allow-listed.
    Required,
}

/// Per-domain verification configuration.
///
/// One instance per trust domain. The allow-list is never empty; startup
/// refuses a domain without one.
#[derive(Debug, Clone)]
pub struct TrustDomainConfig {
    pub issuer: IssuerRule,
    pub authorized_parties: Vec<String>,
    pub azp_policy: AuthorizedPartyPolicy,
}

/// Verifies signed tokens for one trust domain.
pub struct ClaimsVerifier {
    config: TrustDomainConfig,
    keys: KeySetCache,
}

impl ClaimsVerifier {
    pub fn new(config: TrustDomainConfig, keys: KeySetCache) -> Self {
        Self { config, keys }
    }

    /// Verify a compact token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<SignedClaims, AuthError> {
        self.verify_at(token, Utc::now().timestamp()).await
    }

    async fn verify_at(&self, token: &str, now: i64) -> Result<SignedClaims, AuthError> {
        let raw = RawToken::split(token)?;

        let header = raw.header()?;
        if header.alg != APPROVED_ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm);
        }
        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MissingKeyId)?;

        let key = self.keys.get_key(&kid).await?;

        let signature = raw.signature_bytes()?;
        RsaPublicKeyComponents { n: key.n.as_slice(), e: key.e.as_slice() }
            .verify(
                &RSA_PKCS1_2048_8192_SHA256,
                raw.signing_input().as_bytes(),
                &signature,
            )
            .map_err(|_| AuthError::SignatureInvalid)?;

        let payload = raw.payload_bytes()?;
        let claims: RawClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

        validate_claims(&claims, &self.config, now)
    }
}

/// Validate time, issuer, and authorized-party claims.
fn validate_claims(
    claims: &RawClaims,
    config: &TrustDomainConfig,
    now: i64,
) -> Result<SignedClaims, AuthError> {
    let expires_at = claims.exp.ok_or(AuthError::MalformedToken)?;
    if expires_at + CLOCK_SKEW_LEEWAY_SECS < now {
        return Err(AuthError::Expired);
    }

    if let Some(not_before) = claims.nbf {
        if not_before - CLOCK_SKEW_LEEWAY_SECS > now {
            return Err(AuthError::NotYetValid);
        }
    }

    let issuer = claims.iss.as_deref().ok_or(AuthError::IssuerMismatch)?;
    if !config.issuer.matches(issuer) {
        return Err(AuthError::IssuerMismatch);
    }

    match (&claims.azp, config.azp_policy) {
        (None, AuthorizedPartyPolicy::AllowListWhenPresent) => {}
        (None, AuthorizedPartyPolicy::Required) => return Err(AuthError::UnauthorizedParty),
        (Some(azp), _) => {
            if !config.authorized_parties.iter().any(|p| p == azp) {
                return Err(AuthError::UnauthorizedParty);
            }
        }
    }

    Ok(SignedClaims {
        subject: claims.sub.clone(),
        issuer: issuer.to_string(),
        expires_at,
        not_before: claims.nbf,
        authorized_party: claims.azp.clone(),
        session_id: claims.sid.clone(),
        org: claims.org_identity(),
    })
}
