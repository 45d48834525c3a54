// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Verification key-set fetching and caching.
//!
//! Each trust domain owns one [`KeySetCache`] instance; the tenant and portal
//! caches must never be shared. The cache holds an immutable snapshot of the
//! published key set for a fixed TTL. A `kid` that is absent from a fresh
//! snapshot triggers exactly one forced refetch (key rotation just happened);
//! a snapshot that has already spent its forced refetch answers further
//! unknown `kid`s with [`AuthError::SigningKeyNotFound`] until the TTL
//! expires.
//!
//! All fetch failures are fail-closed: the caller treats them as an
//! authentication failure, never as "no keys configured".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use tokio::sync::RwLock;

use super::error::AuthError;

/// Key-set snapshot TTL (1 hour).
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(3600);

/// Public RSA verification key, decoded from its JWK form.
///
/// `n` and `e` are big-endian bytes ready for raw signature verification.
#[derive(Debug, Clone)]
pub struct RsaVerificationKey {
    pub kid: String,
    pub n: Vec<u8>,
    pub e: Vec<u8>,
}

/// Source of a trust domain's published key set.
///
/// The production implementation is [`HttpKeySetFetcher`]; tests substitute
/// an in-memory source.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch_keys(&self) -> Result<JwkSet, AuthError>;
}

/// Fetches a JWKS document over HTTPS.
pub struct HttpKeySetFetcher {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, url = %self.url, "key set fetch failed");
                AuthError::KeySetUnavailable
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), url = %self.url, "key set endpoint returned non-success");
            return Err(AuthError::KeySetUnavailable);
        }

        response.json::<JwkSet>().await.map_err(|err| {
            tracing::warn!(error = %err, url = %self.url, "key set response was not a JWKS document");
            AuthError::KeySetUnavailable
        })
    }
}

struct CachedKeySet {
    keys: HashMap<String, RsaVerificationKey>,
    fetched_at: Instant,
    /// Whether this snapshot has already spent its one forced refetch.
    miss_refreshed: bool,
}

/// TTL cache over a [`KeySetFetcher`].
pub struct KeySetCache {
    fetcher: Arc<dyn KeySetFetcher>,
    ttl: Duration,
    cache: RwLock<Option<CachedKeySet>>,
}

impl KeySetCache {
    pub fn new(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self::with_ttl(fetcher, DEFAULT_KEY_SET_TTL)
    }

    pub fn with_ttl(fetcher: Arc<dyn KeySetFetcher>, ttl: Duration) -> Self {
        Self { fetcher, ttl, cache: RwLock::new(None) }
    }

    /// Return the verification key for `kid`.
    ///
    /// Fetches the key set when the cache is cold or stale. A `kid` missing
    /// from a fresh snapshot forces one refetch before failing with
    /// [`AuthError::SigningKeyNotFound`].
    pub async fn get_key(&self, kid: &str) -> Result<RsaVerificationKey, AuthError> {
        // Fast path: fresh snapshot under the read lock.
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.ttl {
                    if let Some(key) = entry.keys.get(kid) {
                        return Ok(key.clone());
                    }
                    if entry.miss_refreshed {
                        return Err(AuthError::SigningKeyNotFound);
                    }
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Re-check under the write lock: a concurrent request may have
        // refreshed the snapshot while we waited.
        let forced = match &*cache {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                if let Some(key) = entry.keys.get(kid) {
                    return Ok(key.clone());
                }
                if entry.miss_refreshed {
                    return Err(AuthError::SigningKeyNotFound);
                }
                true
            }
            _ => false,
        };

        if forced {
            tracing::debug!(kid, "key id missing from fresh key set, forcing refetch");
        }

        let keys = self.fetch_and_index().await?;
        let found = keys.get(kid).cloned();
        *cache = Some(CachedKeySet {
            keys,
            fetched_at: Instant::now(),
            // A regular fetch that still misses the kid counts as the
            // snapshot's forced refetch; no back-to-back double fetch.
            miss_refreshed: forced || found.is_none(),
        });

        found.ok_or(AuthError::SigningKeyNotFound)
    }

    async fn fetch_and_index(&self) -> Result<HashMap<String, RsaVerificationKey>, AuthError> {
        let jwks = self.fetcher.fetch_keys().await?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.as_deref() else {
                continue;
            };
            if let AlgorithmParameters::RSA(rsa) = &jwk.algorithm {
                match decode_component(&rsa.n).and_then(|n| {
                    decode_component(&rsa.e).map(|e| RsaVerificationKey {
                        kid: kid.to_string(),
                        n,
                        e,
                    })
                }) {
                    Ok(key) => {
                        keys.insert(kid.to_string(), key);
                    }
                    Err(_) => {
                        tracing::warn!(kid, "skipping undecodable key in key set");
                    }
                }
            }
        }

        // An empty key array means the endpoint is misbehaving, not that the
        // domain has no keys.
        if keys.is_empty() {
            return Err(AuthError::KeySetUnavailable);
        }
        Ok(keys)
    }
}

fn decode_component(component: &str) -> Result<Vec<u8>, AuthError> {
    Base64UrlUnpadded::decode_vec(component).map_err(|_| AuthError::KeySetUnavailable)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::test_keys::jwk_set;

    /// Fetcher that serves a fixed sequence of responses and counts calls.
    struct ScriptedFetcher {
        responses: std::sync::Mutex<Vec<Result<JwkSet, AuthError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<Result<JwkSet, AuthError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeySetFetcher for ScriptedFetcher {
        async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            }
        }
    }

    #[tokio::test]
    async fn known_kid_is_served_from_cache() {
        let fetcher = ScriptedFetcher::new(vec![Ok(jwk_set(&["key-1"]))]);
        let cache = KeySetCache::new(fetcher.clone());

        assert_eq!(cache.get_key("key-1").await.unwrap().kid, "key-1");
        assert_eq!(cache.get_key("key-1").await.unwrap().kid, "key-1");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_kid_forces_exactly_one_refetch() {
        let fetcher = ScriptedFetcher::new(vec![Ok(jwk_set(&["key-1"]))]);
        let cache = KeySetCache::new(fetcher.clone());

        // Warm the cache.
        cache.get_key("key-1").await.unwrap();
        assert_eq!(fetcher.calls(), 1);

        // Unknown kid: one forced refetch, then failure.
        let err = cache.get_key("rotated-key").await.unwrap_err();
        assert_eq!(err, AuthError::SigningKeyNotFound);
        assert_eq!(fetcher.calls(), 2);

        // A second unknown kid within the TTL window does not refetch again.
        let err = cache.get_key("another-key").await.unwrap_err();
        assert_eq!(err, AuthError::SigningKeyNotFound);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn forced_refetch_picks_up_rotated_key() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(jwk_set(&["key-1"])),
            Ok(jwk_set(&["key-1", "key-2"])),
        ]);
        let cache = KeySetCache::new(fetcher.clone());

        cache.get_key("key-1").await.unwrap();
        // key-2 appeared at the endpoint after rotation; the forced refetch
        // finds it.
        assert_eq!(cache.get_key("key-2").await.unwrap().kid, "key-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn stale_snapshot_is_refetched() {
        let fetcher = ScriptedFetcher::new(vec![Ok(jwk_set(&["key-1"]))]);
        let cache = KeySetCache::with_ttl(fetcher.clone(), Duration::ZERO);

        cache.get_key("key-1").await.unwrap();
        cache.get_key("key-1").await.unwrap();
        // TTL of zero: every lookup refetches.
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_unavailable() {
        let fetcher = ScriptedFetcher::new(vec![Err(AuthError::KeySetUnavailable)]);
        let cache = KeySetCache::new(fetcher.clone());

        let err = cache.get_key("key-1").await.unwrap_err();
        assert_eq!(err, AuthError::KeySetUnavailable);
    }

    #[tokio::test]
    async fn empty_key_array_is_unavailable() {
        let fetcher = ScriptedFetcher::new(vec![Ok(jwk_set(&[]))]);
        let cache = KeySetCache::new(fetcher.clone());

        let err = cache.get_key("key-1").await.unwrap_err();
        assert_eq!(err, AuthError::KeySetUnavailable);
    }

    #[tokio::test]
    async fn miss_on_initial_fetch_consumes_forced_refetch() {
        let fetcher = ScriptedFetcher::new(vec![Ok(jwk_set(&["key-1"]))]);
        let cache = KeySetCache::new(fetcher.clone());

        // Cold cache, unknown kid: the initial fetch already misses, so no
        // second fetch follows.
        let err = cache.get_key("unknown").await.unwrap_err();
        assert_eq!(err, AuthError::SigningKeyNotFound);
        assert_eq!(fetcher.calls(), 1);
    }
}
