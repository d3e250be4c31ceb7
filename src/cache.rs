//! Incremental Build Cache
//!
//! Keyed memoized computation: given a key and a fingerprint over the
//! computation's inputs, return the previous result when nothing changed,
//! otherwise run the supplied computation and store its outcome. The reuse
//! decision is atomic per key, so two concurrent rebuilds of the same entity
//! never run the computation (and its network fetch) twice.
//!
//! Reuse is keyed strictly on the fingerprint, never on wall-clock freshness.

use crate::error::MetadataError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Content fingerprint over the inputs of a cached computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest a sequence of input parts into one fingerprint
    ///
    /// Parts are length-delimited, so `["ab", "c"]` and `["a", "bc"]`
    /// produce different fingerprints.
    pub fn digest<I, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            let bytes = part.as_ref();
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct CacheEntry<V> {
    fingerprint: Fingerprint,
    value: V,
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

/// Fingerprint-keyed memo cache with per-key atomic reuse decisions
pub struct MemoCache<V> {
    slots: RwLock<HashMap<String, Slot<V>>>,
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, key: &str) -> Slot<V> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Return the cached value when the fingerprint matches, otherwise run
    /// `compute` and store its result
    ///
    /// The per-key lock is held across the computation; a failed computation
    /// leaves the previous entry untouched so the next run retries.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        fingerprint: Fingerprint,
        compute: F,
    ) -> Result<V, MetadataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, MetadataError>>,
    {
        let slot = self.slot(key).await;
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if entry.fingerprint == fingerprint {
                debug!(key, "cache hit, reusing previous result");
                return Ok(entry.value.clone());
            }
            debug!(key, "fingerprint changed, recomputing");
        }

        let value = compute().await?;
        *guard = Some(CacheEntry {
            fingerprint,
            value: value.clone(),
        });
        Ok(value)
    }

    /// Drop the entry for a key
    pub async fn invalidate(&self, key: &str) {
        let mut slots = self.slots.write().await;
        slots.remove(key);
    }

    /// Number of keys with a slot (cached or in flight)
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

impl<V: Clone> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fp(parts: &[&str]) -> Fingerprint {
        Fingerprint::digest(parts.iter().map(|p| p.as_bytes()))
    }

    #[test]
    fn test_fingerprint_is_length_delimited() {
        assert_ne!(fp(&["ab", "c"]), fp(&["a", "bc"]));
        assert_eq!(fp(&["a", "b"]), fp(&["a", "b"]));
    }

    #[test]
    fn test_same_fingerprint_skips_recompute() {
        tokio_test::block_on(async {
            let cache: MemoCache<u32> = MemoCache::new();
            let calls = AtomicUsize::new(0);

            for _ in 0..3 {
                let value = cache
                    .get_or_compute("countries", fp(&["v1"]), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(7)
                    })
                    .await
                    .unwrap();
                assert_eq!(value, 7);
            }
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn test_changed_fingerprint_recomputes() {
        tokio_test::block_on(async {
            let cache: MemoCache<u32> = MemoCache::new();
            let calls = AtomicUsize::new(0);

            let mut compute = || {
                calls.fetch_add(1, Ordering::SeqCst);
                calls.load(Ordering::SeqCst) as u32
            };

            let first = cache
                .get_or_compute("countries", fp(&["v1"]), || async { Ok(compute()) })
                .await
                .unwrap();
            let second = cache
                .get_or_compute("countries", fp(&["v2"]), || async { Ok(compute()) })
                .await
                .unwrap();

            assert_eq!(first, 1);
            assert_eq!(second, 2);
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        });
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        tokio_test::block_on(async {
            let cache: MemoCache<u32> = MemoCache::new();

            let err = cache
                .get_or_compute("countries", fp(&["v1"]), || async {
                    Err(MetadataError::Fetch("boom".to_string()))
                })
                .await
                .unwrap_err();
            assert!(matches!(err, MetadataError::Fetch(_)));

            let value = cache
                .get_or_compute("countries", fp(&["v1"]), || async { Ok(9) })
                .await
                .unwrap();
            assert_eq!(value, 9);
        });
    }

    #[test]
    fn test_invalidate_drops_entry() {
        tokio_test::block_on(async {
            let cache: MemoCache<u32> = MemoCache::new();
            let calls = AtomicUsize::new(0);

            let compute = || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            };
            cache
                .get_or_compute("countries", fp(&["v1"]), compute)
                .await
                .unwrap();
            cache.invalidate("countries").await;
            cache
                .get_or_compute("countries", fp(&["v1"]), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await
                .unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 2);
            assert_eq!(cache.len().await, 1);
        });
    }
}
