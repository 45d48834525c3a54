// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Verified claims and the dual organisation claim shapes.
//!
//! The identity provider has issued tokens with two organisation claim
//! layouts over its lifetime: an older flat pair (`org_id` / `org_role`) and
//! a newer nested object (`o: {id, rol}`). Both are reconciled here into one
//! canonical [`OrgIdentity`] so that nothing downstream ever re-inspects the
//! raw shape.

use serde::Deserialize;

/// Nested organisation object (newer token layout).
#[derive(Debug, Clone, Deserialize)]
pub struct NestedOrgClaim {
    pub id: String,
    #[serde(default)]
    pub rol: Option<String>,
}

/// Claim payload as it appears on the wire.
///
/// Time claims are Unix timestamps in seconds. Either organisation shape may
/// be present; [`RawClaims::org_identity`] is the only reader.
#[derive(Debug, Clone, Deserialize)]
pub struct RawClaims {
    /// Subject (external user id)
    #[serde(default)]
    pub sub: Option<String>,
    /// Issuer
    #[serde(default)]
    pub iss: Option<String>,
    /// Expiration timestamp
    #[serde(default)]
    pub exp: Option<i64>,
    /// Not-before timestamp
    #[serde(default)]
    pub nbf: Option<i64>,
    /// Authorized party
    #[serde(default)]
    pub azp: Option<String>,
    /// Session id
    #[serde(default)]
    pub sid: Option<String>,
    /// Flat organisation id (older layout)
    #[serde(default)]
    pub org_id: Option<String>,
    /// Flat organisation role (older layout)
    #[serde(default)]
    pub org_role: Option<String>,
    /// Nested organisation object (newer layout)
    #[serde(default)]
    pub o: Option<NestedOrgClaim>,
}

impl RawClaims {
    /// Reconcile the two organisation claim shapes into one canonical pair.
    ///
    /// The nested shape wins when both are present (it is what current tokens
    /// carry; the flat fields linger on long-lived sessions).
    pub fn org_identity(&self) -> Option<OrgIdentity> {
        if let Some(nested) = &self.o {
            return Some(OrgIdentity {
                org_id: nested.id.clone(),
                role: nested.rol.clone(),
            });
        }
        self.org_id.as_ref().map(|id| OrgIdentity {
            org_id: id.clone(),
            role: self.org_role.clone(),
        })
    }
}

/// Canonical organisation identity, independent of wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgIdentity {
    pub org_id: String,
    /// Role string as issued; interpretation happens in the role authorizer.
    pub role: Option<String>,
}

/// Claims that survived cryptographic and temporal validation.
///
/// Produced only by the claims verifier; construction elsewhere would bypass
/// signature checking, so the fields stay read-only outside this module tree.
#[derive(Debug, Clone)]
pub struct SignedClaims {
    /// Subject as issued; the guards enforce its presence because each
    /// pipeline reports the failure differently.
    pub subject: Option<String>,
    pub issuer: String,
    pub expires_at: i64,
    pub not_before: Option<i64>,
    pub authorized_party: Option<String>,
    pub session_id: Option<String>,
    pub org: Option<OrgIdentity>,
}
