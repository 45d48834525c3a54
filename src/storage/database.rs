// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Embedded authorization database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `workspaces`: external_org_id → serialized StoredWorkspace
//! - `portal_users`: composite key (workspace_id|external_user_id) → serialized StoredPortalUser
//! - `magic_links`: token_digest → serialized StoredMagicLink
//! - `access_grants`: composite key (workspace_id|resource_type|resource_id) → grant timestamp
//!
//! redb serializes write transactions, which is what makes the magic-link
//! use-count increment a single indivisible conditional write.

use std::path::Path;

use redb::{Database, TableDefinition};

/// Primary table: external org id → serialized workspace (JSON bytes).
pub(crate) const WORKSPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("workspaces");

/// Portal users: composite key `workspace_id|external_user_id` → JSON bytes.
pub(crate) const PORTAL_USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("portal_users");

/// Magic links: token digest (base64url SHA-256 of the plaintext) → JSON bytes.
/// The plaintext token is never stored or indexed.
pub(crate) const MAGIC_LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("magic_links");

/// Access grants: composite key `workspace_id|resource_type|resource_id` →
/// grant timestamp (RFC 3339 bytes).
pub(crate) const ACCESS_GRANTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("access_grants");

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Build a composite key for the portal_users table.
pub(crate) fn portal_user_key(workspace_id: &str, external_user_id: &str) -> String {
    format!("{workspace_id}|{external_user_id}")
}

/// Build a composite key for the access_grants table.
pub(crate) fn access_grant_key(
    workspace_id: &str,
    resource_type: &str,
    resource_id: &str,
) -> String {
    format!("{workspace_id}|{resource_type}|{resource_id}")
}

/// Embedded ACID database holding the records the authorization boundary
/// reads and mutates.
pub struct AuthDatabase {
    db: Database,
}

impl AuthDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WORKSPACES)?;
            let _ = write_txn.open_table(PORTAL_USERS)?;
            let _ = write_txn.open_table(MAGIC_LINKS)?;
            let _ = write_txn.open_table(ACCESS_GRANTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn raw(&self) -> &Database {
        &self.db
    }
}
