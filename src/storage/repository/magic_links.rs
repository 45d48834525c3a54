// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Magic-link repository.
//!
//! Links are keyed by the digest of their plaintext token; the plaintext is
//! never persisted. Records are never deleted: expiry is a timestamp check
//! and exhaustion a counter check, so a revoked and a never-issued link are
//! indistinguishable to a caller.
//!
//! `redeem` is the concurrency-critical operation. It runs the whole
//! check-and-increment inside one redb write transaction; redb serializes
//! writers, so under N concurrent redemptions of a link with `max_uses = 1`
//! exactly one transaction observes `use_count < max_uses`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::database::{AuthDatabase, StorageError, StorageResult, MAGIC_LINKS};
use redb::{ReadableDatabase, ReadableTable};

/// Resource kinds a magic link can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Site,
    Asset,
    Inspection,
    Defect,
    Incident,
    Report,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Site => write!(f, "site"),
            ResourceType::Asset => write!(f, "asset"),
            ResourceType::Inspection => write!(f, "inspection"),
            ResourceType::Defect => write!(f, "defect"),
            ResourceType::Incident => write!(f, "incident"),
            ResourceType::Report => write!(f, "report"),
        }
    }
}

/// Magic-link record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMagicLink {
    /// Unique link identifier (UUID)
    pub id: String,
    /// Workspace the linked resource belongs to
    pub workspace_id: String,
    /// Kind of linked resource
    pub resource_type: ResourceType,
    /// Identifier of the linked resource
    pub resource_id: String,
    /// Digest of the plaintext token (base64url SHA-256)
    pub token_digest: String,
    /// Hard expiry
    pub expires_at: DateTime<Utc>,
    /// Maximum number of successful accesses
    pub max_uses: u32,
    /// Successful accesses so far; monotonically non-decreasing,
    /// never exceeds `max_uses`
    pub use_count: u32,
    /// When the link was created
    pub created_at: DateTime<Utc>,
    /// First successful access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_accessed_at: Option<DateTime<Utc>>,
    /// Most recent successful access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// HMAC digest of the most recent caller IP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access_ip_hash: Option<String>,
    /// Most recent caller user agent, truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access_user_agent: Option<String>,
}

/// Result of a redemption attempt.
///
/// The verifier collapses every non-`Redeemed` outcome into one uniform
/// error; the distinction exists for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    Redeemed(StoredMagicLink),
    NotFound,
    Expired,
    Exhausted,
}

/// Audit metadata captured alongside a successful redemption.
#[derive(Debug, Clone, Default)]
pub struct AccessMetadata {
    pub ip_hash: Option<String>,
    pub user_agent: Option<String>,
}

/// Repository for magic-link records.
pub struct MagicLinkRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> MagicLinkRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Create a link keyed by its token digest.
    pub fn create(&self, link: &StoredMagicLink) -> StorageResult<()> {
        let json = serde_json::to_vec(link)?;
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(MAGIC_LINKS)?;
            if table.get(link.token_digest.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("Magic link {}", link.id)));
            }
            table.insert(link.token_digest.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a link by token digest.
    pub fn get_by_digest(&self, digest: &str) -> StorageResult<Option<StoredMagicLink>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(MAGIC_LINKS)?;
        match table.get(digest)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Atomically check and consume one use of the link.
    ///
    /// Equivalent to
    /// `UPDATE magic_links SET use_count = use_count + 1, ... WHERE
    /// token_digest = ? AND use_count < max_uses` — the lookup, the guard
    /// conditions, and the increment all commit or abort together.
    pub fn redeem(
        &self,
        digest: &str,
        now: DateTime<Utc>,
        meta: AccessMetadata,
    ) -> StorageResult<RedeemOutcome> {
        let write_txn = self.db.raw().begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(MAGIC_LINKS)?;
            let existing: Option<Vec<u8>> =
                table.get(digest)?.map(|value| value.value().to_vec());

            match existing {
                None => RedeemOutcome::NotFound,
                Some(bytes) => {
                    let mut link: StoredMagicLink = serde_json::from_slice(&bytes)?;
                    if now > link.expires_at {
                        RedeemOutcome::Expired
                    } else if link.use_count >= link.max_uses {
                        RedeemOutcome::Exhausted
                    } else {
                        link.use_count += 1;
                        if link.first_accessed_at.is_none() {
                            link.first_accessed_at = Some(now);
                        }
                        link.last_accessed_at = Some(now);
                        link.last_access_ip_hash = meta.ip_hash;
                        link.last_access_user_agent = meta.user_agent;

                        let json = serde_json::to_vec(&link)?;
                        table.insert(digest, json.as_slice())?;
                        RedeemOutcome::Redeemed(link)
                    }
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> (tempfile::TempDir, AuthDatabase) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = AuthDatabase::open(&dir.path().join("auth.redb")).unwrap();
        (dir, db)
    }

    fn link(digest: &str, max_uses: u32) -> StoredMagicLink {
        StoredMagicLink {
            id: uuid::Uuid::new_v4().to_string(),
            workspace_id: "ws-1".to_string(),
            resource_type: ResourceType::Defect,
            resource_id: "defect-7".to_string(),
            token_digest: digest.to_string(),
            expires_at: Utc::now() + Duration::hours(24),
            max_uses,
            use_count: 0,
            created_at: Utc::now(),
            first_accessed_at: None,
            last_accessed_at: None,
            last_access_ip_hash: None,
            last_access_user_agent: None,
        }
    }

    #[test]
    fn redeem_increments_and_records_audit_metadata() {
        let (_dir, db) = test_db();
        let repo = MagicLinkRepository::new(&db);
        repo.create(&link("digest-a", 3)).unwrap();

        let now = Utc::now();
        let meta = AccessMetadata {
            ip_hash: Some("iphash".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        };
        let outcome = repo.redeem("digest-a", now, meta).unwrap();

        let RedeemOutcome::Redeemed(updated) = outcome else {
            panic!("expected redemption");
        };
        assert_eq!(updated.use_count, 1);
        assert_eq!(updated.first_accessed_at, Some(now));
        assert_eq!(updated.last_accessed_at, Some(now));
        assert_eq!(updated.last_access_ip_hash.as_deref(), Some("iphash"));
    }

    #[test]
    fn redeem_unknown_digest_is_not_found() {
        let (_dir, db) = test_db();
        let repo = MagicLinkRepository::new(&db);
        let outcome = repo
            .redeem("digest-missing", Utc::now(), AccessMetadata::default())
            .unwrap();
        assert_eq!(outcome, RedeemOutcome::NotFound);
    }

    #[test]
    fn redeem_expired_link_fails_without_increment() {
        let (_dir, db) = test_db();
        let repo = MagicLinkRepository::new(&db);

        let mut expired = link("digest-exp", 3);
        expired.expires_at = Utc::now() - Duration::minutes(1);
        repo.create(&expired).unwrap();

        let outcome = repo
            .redeem("digest-exp", Utc::now(), AccessMetadata::default())
            .unwrap();
        assert_eq!(outcome, RedeemOutcome::Expired);
        assert_eq!(repo.get_by_digest("digest-exp").unwrap().unwrap().use_count, 0);
    }

    #[test]
    fn redeem_stops_at_max_uses() {
        let (_dir, db) = test_db();
        let repo = MagicLinkRepository::new(&db);
        repo.create(&link("digest-max", 2)).unwrap();

        for _ in 0..2 {
            let outcome = repo
                .redeem("digest-max", Utc::now(), AccessMetadata::default())
                .unwrap();
            assert!(matches!(outcome, RedeemOutcome::Redeemed(_)));
        }

        let outcome = repo
            .redeem("digest-max", Utc::now(), AccessMetadata::default())
            .unwrap();
        assert_eq!(outcome, RedeemOutcome::Exhausted);
        assert_eq!(repo.get_by_digest("digest-max").unwrap().unwrap().use_count, 2);
    }

    #[test]
    fn first_access_timestamp_is_stable_across_uses() {
        let (_dir, db) = test_db();
        let repo = MagicLinkRepository::new(&db);
        repo.create(&link("digest-first", 2)).unwrap();

        let first = Utc::now();
        repo.redeem("digest-first", first, AccessMetadata::default()).unwrap();
        let second = first + Duration::minutes(5);
        repo.redeem("digest-first", second, AccessMetadata::default()).unwrap();

        let loaded = repo.get_by_digest("digest-first").unwrap().unwrap();
        assert_eq!(loaded.first_accessed_at, Some(first));
        assert_eq!(loaded.last_accessed_at, Some(second));
    }

    #[test]
    fn duplicate_digest_rejected() {
        let (_dir, db) = test_db();
        let repo = MagicLinkRepository::new(&db);
        repo.create(&link("digest-dup", 1)).unwrap();
        assert!(matches!(
            repo.create(&link("digest-dup", 1)),
            Err(StorageError::AlreadyExists(_))
        ));
    }
}
