//! Content-addressed memoisation of finished summaries.
//!
//! A summary is a pure function of the snapshot, the customization and the generator, so a hit
//! never changes observable output. It does make repeated requests identical even when the
//! narrative backend is not.

use crate::model::{CustomizationParameters, EhrSnapshot, StructuredSummary};
use crate::{SummaryError, SummaryResult};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SHA-256 of the canonical JSON of one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hex: String,
    seed: u64,
}

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// First eight bytes of the digest, used to seed the narrative backend.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[derive(Serialize)]
struct KeyMaterial<'a> {
    snapshot: &'a EhrSnapshot,
    params: &'a CustomizationParameters,
    generator: &'a str,
}

/// Content-addressed key of one summary request.
///
/// # Errors
///
/// Returns [`SummaryError::Serialization`] if the request cannot be written as JSON.
pub fn cache_key(
    snapshot: &EhrSnapshot,
    params: &CustomizationParameters,
    generator_id: &str,
) -> SummaryResult<CacheKey> {
    let material = KeyMaterial {
        snapshot,
        params,
        generator: generator_id,
    };
    let json = serde_json::to_vec(&material).map_err(SummaryError::Serialization)?;
    let digest = Sha256::digest(&json);

    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    Ok(CacheKey {
        hex: hex::encode(digest),
        seed: u64::from_be_bytes(seed_bytes),
    })
}

/// Bounded in-memory cache with oldest-first eviction. Capacity 0 stores nothing.
#[derive(Debug)]
pub struct SummaryCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, StructuredSummary>,
    order: VecDeque<CacheKey>,
}

impl SummaryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &CacheKey) -> Option<StructuredSummary> {
        self.lock().entries.get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, summary: StructuredSummary) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), summary).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A panic while holding the lock cannot leave the map half-updated, so a poisoned lock is
    /// still usable.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatientOverview;
    use summary_types::Audience;

    fn summary(text: &str) -> StructuredSummary {
        StructuredSummary {
            patient_overview: PatientOverview {
                summary: text.into(),
            },
            ..StructuredSummary::default()
        }
    }

    #[test]
    fn test_key_depends_on_every_input() {
        let snapshot = EhrSnapshot::default();
        let params = CustomizationParameters::default();
        let base = cache_key(&snapshot, &params, "template").expect("key");

        assert_eq!(base, cache_key(&snapshot, &params, "template").expect("key"));
        assert_eq!(base.as_str().len(), 64);
        assert_ne!(base, cache_key(&snapshot, &params, "remote:gpt-4o-mini").expect("key"));

        let nurse = CustomizationParameters {
            audience: Audience::Nurse,
            ..params
        };
        assert_ne!(base, cache_key(&snapshot, &nurse, "template").expect("key"));

        let other = EhrSnapshot {
            demographics: "40-year-old female".into(),
            ..EhrSnapshot::default()
        };
        assert_ne!(base, cache_key(&other, &params, "template").expect("key"));
    }

    #[test]
    fn test_key_hashes_the_serialised_request() {
        let snapshot = EhrSnapshot::default();
        let params = CustomizationParameters::default();
        let key = cache_key(&snapshot, &params, "template").expect("key");

        let material = KeyMaterial {
            snapshot: &snapshot,
            params: &params,
            generator: "template",
        };
        let json = serde_json::to_vec(&material).expect("json");
        assert_eq!(key.as_str(), hex::encode(Sha256::digest(&json)));
        assert_ne!(key.as_str(), hex::encode(Sha256::digest(b"")));
    }

    #[test]
    fn test_evicts_oldest_first() {
        let cache = SummaryCache::new(2);
        let key = |name: &str| {
            cache_key(&EhrSnapshot::default(), &CustomizationParameters::default(), name)
                .expect("key")
        };

        cache.insert(key("a"), summary("a"));
        cache.insert(key("b"), summary("b"));
        cache.insert(key("c"), summary("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a")).is_none());
        assert_eq!(cache.get(&key("c")), Some(summary("c")));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = SummaryCache::new(0);
        let key = cache_key(&EhrSnapshot::default(), &CustomizationParameters::default(), "t")
            .expect("key");
        cache.insert(key.clone(), summary("x"));
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }
}
