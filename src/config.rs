// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Both trust
//! domains must be fully configured or the process refuses to start; a
//! partially configured identity domain is an authentication failure, not a
//! degraded mode.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory for the embedded authorization database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TENANT_IDP_ISSUER` | Fragment the tenant token issuer must contain | Required |
//! | `TENANT_IDP_JWKS_URL` | Tenant-domain JWKS endpoint | Required |
//! | `TENANT_IDP_AUTHORIZED_PARTIES` | Comma-separated tenant `azp` allow-list | Required |
//! | `PORTAL_IDP_ISSUER` | Exact issuer for portal tokens | Required |
//! | `PORTAL_IDP_JWKS_URL` | Portal-domain JWKS endpoint | Required |
//! | `PORTAL_IDP_AUTHORIZED_PARTIES` | Comma-separated portal `azp` allow-list | Required |
//! | `MAINTENANCE_MODE` | `1`/`true` refuses mutating requests | off |
//! | `AUDIT_IP_PEPPER` | HMAC key for hashing caller IPs in audit metadata | empty |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use url::Url;

use crate::auth::{AuthorizedPartyPolicy, IssuerRule, TrustDomainConfig};

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TENANT_ISSUER_ENV: &str = "TENANT_IDP_ISSUER";
pub const TENANT_JWKS_URL_ENV: &str = "TENANT_IDP_JWKS_URL";
pub const TENANT_AUTHORIZED_PARTIES_ENV: &str = "TENANT_IDP_AUTHORIZED_PARTIES";
pub const PORTAL_ISSUER_ENV: &str = "PORTAL_IDP_ISSUER";
pub const PORTAL_JWKS_URL_ENV: &str = "PORTAL_IDP_JWKS_URL";
pub const PORTAL_AUTHORIZED_PARTIES_ENV: &str = "PORTAL_IDP_AUTHORIZED_PARTIES";
pub const MAINTENANCE_MODE_ENV: &str = "MAINTENANCE_MODE";
pub const AUDIT_IP_PEPPER_ENV: &str = "AUDIT_IP_PEPPER";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value in {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// One trust domain's identity-provider settings.
#[derive(Debug, Clone)]
pub struct TrustDomainSettings {
    pub issuer: String,
    pub jwks_url: String,
    pub authorized_parties: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Fully validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: std::path::PathBuf,
    pub log_format: LogFormat,
    pub maintenance_mode: bool,
    pub audit_ip_pepper: Vec<u8>,
    pub tenant: TrustDomainSettings,
    pub portal: TrustDomainSettings,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary lookup (environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|err| ConfigError::Invalid {
                var: PORT_ENV,
                reason: err.to_string(),
            })?,
            None => 8080,
        };
        let data_dir = lookup(DATA_DIR_ENV)
            .unwrap_or_else(|| "/data".to_string())
            .into();

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    reason: format!("expected 'json' or 'pretty', got '{other}'"),
                })
            }
        };

        let maintenance_mode = matches!(
            lookup(MAINTENANCE_MODE_ENV).as_deref(),
            Some("1") | Some("true")
        );
        let audit_ip_pepper = lookup(AUDIT_IP_PEPPER_ENV)
            .unwrap_or_default()
            .into_bytes();

        let tenant = trust_domain(
            &lookup,
            TENANT_ISSUER_ENV,
            TENANT_JWKS_URL_ENV,
            TENANT_AUTHORIZED_PARTIES_ENV,
        )?;
        let portal = trust_domain(
            &lookup,
            PORTAL_ISSUER_ENV,
            PORTAL_JWKS_URL_ENV,
            PORTAL_AUTHORIZED_PARTIES_ENV,
        )?;

        Ok(Self {
            host,
            port,
            data_dir,
            log_format,
            maintenance_mode,
            audit_ip_pepper,
            tenant,
            portal,
        })
    }

    /// Verification config for the tenant console domain.
    ///
    /// Issuer matching is by containment (per-environment issuer hosts share
    /// one suffix) and a token may omit `azp`; a present `azp` must be
    /// allow-listed.
    pub fn tenant_trust_config(&self) -> TrustDomainConfig {
        TrustDomainConfig {
            issuer: IssuerRule::Contains(self.tenant.issuer.clone()),
            authorized_parties: self.tenant.authorized_parties.clone(),
            azp_policy: AuthorizedPartyPolicy::AllowListWhenPresent,
        }
    }

    /// Verification config for the client portal domain.
    ///
    /// Issuer matching is exact and `azp` is mandatory; the portal surface
    /// faces third parties.
    pub fn portal_trust_config(&self) -> TrustDomainConfig {
        TrustDomainConfig {
            issuer: IssuerRule::Exact(self.portal.issuer.clone()),
            authorized_parties: self.portal.authorized_parties.clone(),
            azp_policy: AuthorizedPartyPolicy::Required,
        }
    }
}

fn trust_domain<F>(
    lookup: &F,
    issuer_var: &'static str,
    jwks_var: &'static str,
    parties_var: &'static str,
) -> Result<TrustDomainSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let issuer = required(lookup, issuer_var)?;
    let jwks_url = required(lookup, jwks_var)?;
    Url::parse(&jwks_url).map_err(|err| ConfigError::Invalid {
        var: jwks_var,
        reason: err.to_string(),
    })?;

    let parties_raw = required(lookup, parties_var)?;
    let authorized_parties: Vec<String> = parties_raw
        .split(',')
        .map(str::trim)
        .filter(|party| !party.is_empty())
        .map(str::to_owned)
        .collect();
    if authorized_parties.is_empty() {
        return Err(ConfigError::Invalid {
            var: parties_var,
            reason: "allow-list must contain at least one party".to_string(),
        });
    }

    Ok(TrustDomainSettings { issuer, jwks_url, authorized_parties })
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(var))
}
