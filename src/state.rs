// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::auth::{MagicLinkVerifier, PortalGuard, TenantGuard};
use crate::storage::AuthDatabase;

/// Shared application state.
///
/// The two guards own their separate verifiers and key caches; nothing here
/// is shared between the tenant and portal trust domains except the process
/// they run in.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<AuthDatabase>,
    pub tenant_guard: Arc<TenantGuard>,
    pub portal_guard: Arc<PortalGuard>,
    pub magic_links: Arc<MagicLinkVerifier>,
    /// Maintenance write lock; mutating requests are refused while set.
    pub write_lock: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        db: Arc<AuthDatabase>,
        tenant_guard: TenantGuard,
        portal_guard: PortalGuard,
        magic_links: MagicLinkVerifier,
        write_lock: Arc<AtomicBool>,
    ) -> Self {
        Self {
            db,
            tenant_guard: Arc::new(tenant_guard),
            portal_guard: Arc::new(portal_guard),
            magic_links: Arc::new(magic_links),
            write_lock,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State wired to an on-disk test database and static key sets.
    pub(crate) fn for_tests() -> (tempfile::TempDir, Self) {
        use crate::auth::test_keys::{jwk_set, StaticKeySetFetcher};
        use crate::auth::{
            AuthorizedPartyPolicy, ClaimsVerifier, IssuerRule, KeySetCache, TrustDomainConfig,
        };

        let dir = tempfile::TempDir::new().expect("temp dir");
        let db = Arc::new(
            AuthDatabase::open(&dir.path().join("auth.redb")).expect("test database opens"),
        );

        let tenant_config = TrustDomainConfig {
            issuer: IssuerRule::Contains("sitewarden.test".into()),
            authorized_parties: vec!["https://console.sitewarden.test".into()],
            azp_policy: AuthorizedPartyPolicy::AllowListWhenPresent,
        };
        let portal_config = TrustDomainConfig {
            issuer: IssuerRule::Exact("https://id.portal.sitewarden.test".into()),
            authorized_parties: vec!["https://portal.sitewarden.test".into()],
            azp_policy: AuthorizedPartyPolicy::Required,
        };

        let write_lock = Arc::new(AtomicBool::new(false));
        let state = Self::new(
            Arc::clone(&db),
            TenantGuard::new(
                ClaimsVerifier::new(
                    tenant_config,
                    KeySetCache::new(StaticKeySetFetcher::new(jwk_set(&["tenant-key"]))),
                ),
                Arc::clone(&write_lock),
            ),
            PortalGuard::new(
                ClaimsVerifier::new(
                    portal_config,
                    KeySetCache::new(StaticKeySetFetcher::new(jwk_set(&["portal-key"]))),
                ),
                Arc::clone(&db),
            ),
            MagicLinkVerifier::new(db, Vec::new()),
            write_lock,
        );
        (dir, state)
    }
}
