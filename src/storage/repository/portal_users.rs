// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Portal user repository.
//!
//! Portal users are scoped to a workspace: the same external user id may
//! exist in several workspaces with different roles, so all lookups key on
//! the `(workspace_id, external_user_id)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::database::{
    portal_user_key, AuthDatabase, StorageError, StorageResult, PORTAL_USERS,
};
use redb::{ReadableDatabase, ReadableTable};

/// Portal user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredPortalUser {
    /// Internal user identifier (UUID)
    pub id: String,
    /// External user id from the portal identity provider
    pub external_user_id: String,
    /// Internal workspace the user belongs to
    pub workspace_id: String,
    /// Display name
    pub display_name: String,
    /// Portal role string (`viewer`, `contributor`, `admin`)
    pub role: String,
    /// Deactivated users keep their record but cannot authenticate
    pub active: bool,
    /// When the user was created
    pub created_at: DateTime<Utc>,
    /// Last successful authentication, maintained best-effort
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access_at: Option<DateTime<Utc>>,
}

/// Repository for portal user records.
pub struct PortalUserRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> PortalUserRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Create a portal user.
    pub fn create(&self, user: &StoredPortalUser) -> StorageResult<()> {
        let key = portal_user_key(&user.workspace_id, &user.external_user_id);
        let json = serde_json::to_vec(user)?;
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(PORTAL_USERS)?;
            if table.get(key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("Portal user {key}")));
            }
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a user scoped to a workspace.
    pub fn get(
        &self,
        workspace_id: &str,
        external_user_id: &str,
    ) -> StorageResult<Option<StoredPortalUser>> {
        let key = portal_user_key(workspace_id, external_user_id);
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(PORTAL_USERS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Update an existing user.
    pub fn update(&self, user: &StoredPortalUser) -> StorageResult<()> {
        let key = portal_user_key(&user.workspace_id, &user.external_user_id);
        let json = serde_json::to_vec(user)?;
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(PORTAL_USERS)?;
            if table.get(key.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("Portal user {key}")));
            }
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Record a successful authentication for the user.
    ///
    /// Callers treat this as best-effort accounting; it is invoked from a
    /// detached task and its failure never reaches the request path.
    pub fn touch_last_access(
        &self,
        workspace_id: &str,
        external_user_id: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let key = portal_user_key(workspace_id, external_user_id);
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(PORTAL_USERS)?;
            let existing: Option<Vec<u8>> =
                table.get(key.as_str())?.map(|value| value.value().to_vec());
            let Some(bytes) = existing else {
                return Err(StorageError::NotFound(format!("Portal user {key}")));
            };
            let mut user: StoredPortalUser = serde_json::from_slice(&bytes)?;
            user.last_access_at = Some(at);
            let json = serde_json::to_vec(&user)?;
            table.insert(key.as_str(), json.as_slice())?;
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

    fn user(workspace_id: &str, external_user_id: &str) -> StoredPortalUser {
        StoredPortalUser {
            id: uuid::Uuid::new_v4().to_string(),
            external_user_id: external_user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            display_name: "Jamie Park".to_string(),
            role: "contributor".to_string(),
            active: true,
            created_at: Utc::now(),
            last_access_at: None,
        }
    }

    #[test]
    fn create_and_get_scoped_user() {
        let (_dir, db) = test_db();
        let repo = PortalUserRepository::new(&db);

        repo.create(&user("ws-1", "user_ext_1")).unwrap();

        assert!(repo.get("ws-1", "user_ext_1").unwrap().is_some());
        // Same external id under a different workspace is a different record.
        assert!(repo.get("ws-2", "user_ext_1").unwrap().is_none());
    }

    #[test]
    fn same_external_id_in_two_workspaces() {
        let (_dir, db) = test_db();
        let repo = PortalUserRepository::new(&db);

        let mut a = user("ws-1", "user_shared");
        a.role = "viewer".to_string();
        let mut b = user("ws-2", "user_shared");
        b.role = "admin".to_string();
        repo.create(&a).unwrap();
        repo.create(&b).unwrap();

        assert_eq!(repo.get("ws-1", "user_shared").unwrap().unwrap().role, "viewer");
        assert_eq!(repo.get("ws-2", "user_shared").unwrap().unwrap().role, "admin");
    }

    #[test]
    fn touch_last_access_sets_timestamp() {
        let (_dir, db) = test_db();
        let repo = PortalUserRepository::new(&db);

        repo.create(&user("ws-1", "user_touch")).unwrap();
        let at = Utc::now();
        repo.touch_last_access("ws-1", "user_touch", at).unwrap();

        let loaded = repo.get("ws-1", "user_touch").unwrap().unwrap();
        assert_eq!(loaded.last_access_at, Some(at));
    }

    #[test]
    fn touch_missing_user_is_not_found() {
        let (_dir, db) = test_db();
        let repo = PortalUserRepository::new(&db);
        let result = repo.touch_last_access("ws-1", "user_ghost", Utc::now());
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
