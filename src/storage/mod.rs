// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! # Authorization Storage Module
//!
//! Persistent records the authentication boundary reads and mutates, backed
//! by an embedded redb database:
//!
//! - workspaces (client organisations behind the portal)
//! - portal users (scoped to a workspace)
//! - magic links (keyed by token digest, never deleted)
//! - access grants (workspace → resource scope)
//!
//! Business entities (sites, assets, inspections, defects, incidents) live in
//! the platform's primary store and are not modeled here.

pub mod database;
pub mod repository;

pub use database::{AuthDatabase, StorageError, StorageResult};
pub use repository::{
    AccessGrantRepository, AccessMetadata, MagicLinkRepository, PortalUserRepository,
    RedeemOutcome, ResourceType, StoredMagicLink, StoredPortalUser, StoredWorkspace,
    WorkspaceRepository, WorkspaceStatus,
};
