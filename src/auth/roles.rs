// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Role hierarchies for authorization.
//!
//! Two independent total orders, one per identity space:
//!
//! - Tenant console: `inspector < manager < admin`
//! - Client portal: `viewer < contributor < admin`
//!
//! Role strings come straight from tokens or user records; an unrecognized
//! string maps to level 0 and therefore fails any check above the floor.
//! Tenant roles additionally accept the historical `org:`-prefixed spelling
//! (`org:admin` and `admin` compare equal).

use super::error::AuthError;

/// Tenant-console roles, lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantRole {
    Inspector,
    Manager,
    Admin,
}

impl TenantRole {
    /// Ordinal privilege level (1-based; 0 is reserved for unknown strings).
    pub fn level(self) -> u8 {
        match self {
            TenantRole::Inspector => 1,
            TenantRole::Manager => 2,
            TenantRole::Admin => 3,
        }
    }

    /// Parse a role string, accepting both historical spellings
    /// (case-insensitive, optional `org:` prefix).
    pub fn parse(s: &str) -> Option<TenantRole> {
        let normalized = s.trim().to_lowercase();
        let name = normalized.strip_prefix("org:").unwrap_or(&normalized);
        match name {
            "inspector" => Some(TenantRole::Inspector),
            "manager" => Some(TenantRole::Manager),
            "admin" => Some(TenantRole::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for TenantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantRole::Inspector => write!(f, "inspector"),
            TenantRole::Manager => write!(f, "manager"),
            TenantRole::Admin => write!(f, "admin"),
        }
    }
}

/// Client-portal roles, lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalRole {
    Viewer,
    Contributor,
    Admin,
}

impl PortalRole {
    /// Ordinal privilege level (1-based; 0 is reserved for unknown strings).
    pub fn level(self) -> u8 {
        match self {
            PortalRole::Viewer => 1,
            PortalRole::Contributor => 2,
            PortalRole::Admin => 3,
        }
    }

    /// Parse a role string (case-insensitive).
    pub fn parse(s: &str) -> Option<PortalRole> {
        match s.trim().to_lowercase().as_str() {
            "viewer" => Some(PortalRole::Viewer),
            "contributor" => Some(PortalRole::Contributor),
            "admin" => Some(PortalRole::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for PortalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortalRole::Viewer => write!(f, "viewer"),
            PortalRole::Contributor => write!(f, "contributor"),
            PortalRole::Admin => write!(f, "admin"),
        }
    }
}

/// Level of a tenant role string; unknown strings are level 0.
pub fn tenant_role_level(role: &str) -> u8 {
    TenantRole::parse(role).map(TenantRole::level).unwrap_or(0)
}

/// Level of a portal role string; unknown strings are level 0.
pub fn portal_role_level(role: &str) -> u8 {
    PortalRole::parse(role).map(PortalRole::level).unwrap_or(0)
}

/// Require a tenant role of at least `required`.
pub fn require_tenant_role(role: &str, required: TenantRole) -> Result<(), AuthError> {
    if tenant_role_level(role) >= required.level() {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

/// Require a portal role of at least `required`.
pub fn require_portal_role(role: &str, required: PortalRole) -> Result<(), AuthError> {
    if portal_role_level(role) >= required.level() {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_hierarchy_is_total() {
        assert!(tenant_role_level("inspector") < tenant_role_level("manager"));
        assert!(tenant_role_level("manager") < tenant_role_level("admin"));
    }

    #[test]
    fn prefixed_and_unprefixed_spellings_compare_equal() {
        assert_eq!(tenant_role_level("org:admin"), tenant_role_level("admin"));
        assert_eq!(tenant_role_level("org:manager"), tenant_role_level("Manager"));
        assert_eq!(tenant_role_level("ORG:INSPECTOR"), tenant_role_level("inspector"));
    }

    #[test]
    fn unknown_tenant_role_is_level_zero() {
        assert_eq!(tenant_role_level("superuser"), 0);
        assert_eq!(tenant_role_level(""), 0);
        assert!(require_tenant_role("superuser", TenantRole::Inspector).is_err());
    }

    #[test]
    fn admin_passes_all_tenant_checks() {
        for required in [TenantRole::Inspector, TenantRole::Manager, TenantRole::Admin] {
            assert!(require_tenant_role("admin", required).is_ok());
        }
    }

    #[test]
    fn inspector_fails_manager_check() {
        assert_eq!(
            require_tenant_role("inspector", TenantRole::Manager).unwrap_err(),
            AuthError::InsufficientRole
        );
    }

    #[test]
    fn portal_hierarchy_is_total() {
        assert!(portal_role_level("viewer") < portal_role_level("contributor"));
        assert!(portal_role_level("contributor") < portal_role_level("admin"));
    }

    #[test]
    fn portal_roles_do_not_accept_tenant_spellings() {
        assert_eq!(portal_role_level("inspector"), 0);
        assert_eq!(portal_role_level("org:admin"), 0);
    }

    #[test]
    fn portal_checks_enforce_minimum() {
        assert!(require_portal_role("contributor", PortalRole::Viewer).is_ok());
        assert!(require_portal_role("viewer", PortalRole::Contributor).is_err());
    }
}
