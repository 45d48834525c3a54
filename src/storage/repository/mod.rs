// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Repositories over the embedded authorization database, one per record
//! type.

pub mod access_grants;
pub mod magic_links;
pub mod portal_users;
pub mod workspaces;

pub use access_grants::AccessGrantRepository;
pub use magic_links::{
    AccessMetadata, MagicLinkRepository, RedeemOutcome, ResourceType, StoredMagicLink,
};
pub use portal_users::{PortalUserRepository, StoredPortalUser};
pub use workspaces::{StoredWorkspace, WorkspaceRepository, WorkspaceStatus};
