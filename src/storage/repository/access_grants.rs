// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Access-grant repository.
//!
//! Grants answer one question: does workspace W have access to resource
//! (type, id)? Handlers consult this after authentication so a verified
//! portal identity from workspace A cannot read resources owned by
//! workspace B.

use chrono::Utc;

use super::super::database::{access_grant_key, AuthDatabase, StorageResult, ACCESS_GRANTS};
use redb::{ReadableDatabase, ReadableTable};

/// Repository for workspace→resource access grants.
pub struct AccessGrantRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> AccessGrantRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Record that a workspace may access a resource. Idempotent.
    pub fn grant(
        &self,
        workspace_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> StorageResult<()> {
        let key = access_grant_key(workspace_id, resource_type, resource_id);
        let granted_at = Utc::now().to_rfc3339();
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(ACCESS_GRANTS)?;
            table.insert(key.as_str(), granted_at.as_bytes())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Scoped existence query: is the resource granted to the workspace?
    pub fn has_access(
        &self,
        workspace_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> StorageResult<bool> {
        let key = access_grant_key(workspace_id, resource_type, resource_id);
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(ACCESS_GRANTS)?;
        Ok(table.get(key.as_str())?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, AuthDatabase) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = AuthDatabase::open(&dir.path().join("auth.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn grant_then_check() {
        let (_dir, db) = test_db();
        let repo = AccessGrantRepository::new(&db);

        repo.grant("ws-a", "site", "site-1").unwrap();

        assert!(repo.has_access("ws-a", "site", "site-1").unwrap());
        // Another workspace does not inherit the grant.
        assert!(!repo.has_access("ws-b", "site", "site-1").unwrap());
        // Nor another resource in the same workspace.
        assert!(!repo.has_access("ws-a", "site", "site-2").unwrap());
    }

    #[test]
    fn grant_is_idempotent() {
        let (_dir, db) = test_db();
        let repo = AccessGrantRepository::new(&db);

        repo.grant("ws-a", "defect", "d-1").unwrap();
        repo.grant("ws-a", "defect", "d-1").unwrap();
        assert!(repo.has_access("ws-a", "defect", "d-1").unwrap());
    }
}
