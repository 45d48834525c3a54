// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Workspace repository.
//!
//! A workspace is the internal record behind a client organisation. Portal
//! tokens reference it by the identity provider's external org id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::database::{AuthDatabase, StorageError, StorageResult, WORKSPACES};
use redb::{ReadableDatabase, ReadableTable};

/// Lifecycle status of a client workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Active,
    Suspended,
    Archived,
}

impl std::fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceStatus::Active => write!(f, "active"),
            WorkspaceStatus::Suspended => write!(f, "suspended"),
            WorkspaceStatus::Archived => write!(f, "archived"),
        }
    }
}

/// Workspace record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredWorkspace {
    /// Internal workspace identifier (UUID)
    pub id: String,
    /// External org id from the portal identity provider
    pub external_org_id: String,
    /// Display name
    pub name: String,
    /// Lifecycle status; only `active` workspaces may authenticate
    pub status: WorkspaceStatus,
    /// When the workspace was created
    pub created_at: DateTime<Utc>,
}

/// Repository for workspace records.
pub struct WorkspaceRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> WorkspaceRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Create a workspace keyed by its external org id.
    pub fn create(&self, workspace: &StoredWorkspace) -> StorageResult<()> {
        let json = serde_json::to_vec(workspace)?;
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(WORKSPACES)?;
            if table.get(workspace.external_org_id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Workspace {}",
                    workspace.external_org_id
                )));
            }
            table.insert(workspace.external_org_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a workspace by the identity provider's external org id.
    pub fn get_by_external_org_id(
        &self,
        external_org_id: &str,
    ) -> StorageResult<Option<StoredWorkspace>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(WORKSPACES)?;
        match table.get(external_org_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Update an existing workspace.
    pub fn update(&self, workspace: &StoredWorkspace) -> StorageResult<()> {
        let json = serde_json::to_vec(workspace)?;
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(WORKSPACES)?;
            if table.get(workspace.external_org_id.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!(
                    "Workspace {}",
                    workspace.external_org_id
                )));
            }
            table.insert(workspace.external_org_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
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

    fn workspace(external_org_id: &str, status: WorkspaceStatus) -> StoredWorkspace {
        StoredWorkspace {
            id: uuid::Uuid::new_v4().to_string(),
            external_org_id: external_org_id.to_string(),
            name: "Acme Facilities".to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_workspace() {
        let (_dir, db) = test_db();
        let repo = WorkspaceRepository::new(&db);

        let ws = workspace("org_ext_1", WorkspaceStatus::Active);
        repo.create(&ws).unwrap();

        let loaded = repo.get_by_external_org_id("org_ext_1").unwrap().unwrap();
        assert_eq!(loaded, ws);
    }

    #[test]
    fn missing_workspace_is_none() {
        let (_dir, db) = test_db();
        let repo = WorkspaceRepository::new(&db);
        assert!(repo.get_by_external_org_id("org_nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_external_org_id_rejected() {
        let (_dir, db) = test_db();
        let repo = WorkspaceRepository::new(&db);

        repo.create(&workspace("org_dup", WorkspaceStatus::Active)).unwrap();
        let result = repo.create(&workspace("org_dup", WorkspaceStatus::Active));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn update_changes_status() {
        let (_dir, db) = test_db();
        let repo = WorkspaceRepository::new(&db);

        let mut ws = workspace("org_upd", WorkspaceStatus::Active);
        repo.create(&ws).unwrap();

        ws.status = WorkspaceStatus::Suspended;
        repo.update(&ws).unwrap();

        let loaded = repo.get_by_external_org_id("org_upd").unwrap().unwrap();
        assert_eq!(loaded.status, WorkspaceStatus::Suspended);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&WorkspaceStatus::Suspended).unwrap(),
            "\"suspended\""
        );
        assert_eq!(WorkspaceStatus::Archived.to_string(), "archived");
    }
}
