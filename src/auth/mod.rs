// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! # Authentication Module
//!
//! Every request enters the platform through one of three doors:
//!
//! 1. **Tenant console** (`Authorization: Bearer <token>`): signed tokens
//!    from the provider-side identity space, verified by [`TenantGuard`]
//!    into a [`TenantContext`].
//! 2. **Client portal** (`Authorization: Bearer <token>`): signed tokens
//!    from a fully separate identity space, verified by [`PortalGuard`]
//!    into a [`PortalContext`] after workspace and user resolution.
//! 3. **Share links** (path token): hash-addressed limited-use tokens,
//!    verified by [`MagicLinkVerifier`] into a [`ResourceAccessContext`].
//!
//! ## Security
//!
//! - The two signed-token domains never share issuer, allow-list, or key
//!   cache; their contexts are distinct nominal types so a handler cannot
//!   accept one where the other is required
//! - Signatures are checked with raw RSA primitives over the exact signed
//!   bytes; clock skew tolerance is 300 seconds
//! - Key-set fetch failures fail closed: an unreachable key endpoint means
//!   requests are refused, never waved through
//! - Organisation and workspace ids come only from verified claims and
//!   resolved records, never from request bodies, queries, or headers

pub mod claims;
pub mod error;
pub mod keyset;
pub mod magic_link;
pub mod portal;
pub mod request;
pub mod roles;
pub mod tenant;
pub mod token;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_keys;

pub use claims::{OrgIdentity, SignedClaims};
pub use error::{AuthError, AuthRejection};
pub use keyset::{HttpKeySetFetcher, KeySetCache, KeySetFetcher};
pub use magic_link::{MagicLinkVerifier, ResourceAccessContext, SharedAccess};
pub use portal::{PortalAuth, PortalContext, PortalGuard};
pub use roles::{
    require_portal_role, require_tenant_role, PortalRole, TenantRole,
};
pub use tenant::{TenantAuth, TenantContext, TenantGuard};
pub use verifier::{
    AuthorizedPartyPolicy, ClaimsVerifier, IssuerRule, TrustDomainConfig,
};
