// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sitewarden_server::api::router;
use sitewarden_server::auth::{
    ClaimsVerifier, HttpKeySetFetcher, KeySetCache, MagicLinkVerifier, PortalGuard, TenantGuard,
};
use sitewarden_server::config::{LogFormat, Settings};
use sitewarden_server::state::AppState;
use sitewarden_server::storage::AuthDatabase;

#[tokio::main]
async fn main() {
    // Fail closed before anything listens: a partially configured trust
    // domain must never serve traffic.
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(settings.log_format);

    let db = match AuthDatabase::open(&settings.data_dir.join("authz.redb")) {
        Ok(db) => Arc::new(db),
        Err(err) => {
            tracing::error!(error = %err, "failed to open authorization database");
            std::process::exit(1);
        }
    };

    // One verifier and one key cache per trust domain; never shared.
    let tenant_keys = KeySetCache::new(Arc::new(HttpKeySetFetcher::new(
        settings.tenant.jwks_url.clone(),
    )));
    let portal_keys = KeySetCache::new(Arc::new(HttpKeySetFetcher::new(
        settings.portal.jwks_url.clone(),
    )));

    let write_lock = Arc::new(AtomicBool::new(settings.maintenance_mode));
    let state = AppState::new(
        Arc::clone(&db),
        TenantGuard::new(
            ClaimsVerifier::new(settings.tenant_trust_config(), tenant_keys),
            Arc::clone(&write_lock),
        ),
        PortalGuard::new(
            ClaimsVerifier::new(settings.portal_trust_config(), portal_keys),
            Arc::clone(&db),
        ),
        MagicLinkVerifier::new(Arc::clone(&db), settings.audit_ip_pepper.clone()),
        write_lock,
    );

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    if settings.maintenance_mode {
        tracing::warn!("maintenance mode active: mutating requests will be refused");
    }
    tracing::info!(%addr, "SiteWarden server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown_signal.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .expect("server failed");
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
