//! Pipeline result cache
//!
//! Memoizes the full pipeline result by a structured fingerprint of
//! (page identity, content digest, time bucket). Entries are valid within a
//! fixed time bucket: a lookup in a new bucket always misses even when the
//! content is unchanged, trading bounded staleness for simplicity. Capacity
//! is unbounded unless configured; eviction is least-recently-inserted.
//!
//! `put` is last-write-wins per key, so concurrent puts for the same
//! fingerprint are idempotent in a single-process deployment.

use crate::report::PipelineResult;
use crate::types::AnalysisContext;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Structured cache key: content digest plus validity bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Hex SHA-256 over (normalized URL, title, structural digest)
    pub digest: String,
    /// Time bucket index (epoch seconds / bucket width)
    pub bucket: u64,
}

impl Fingerprint {
    /// Compute the fingerprint for a context at the given epoch time
    pub fn compute(ctx: &AnalysisContext, epoch_secs: u64, bucket_width: Duration) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ctx.url.as_bytes());
        hasher.update([0u8]);
        hasher.update(ctx.snapshot.title.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(ctx.snapshot.structural_digest.as_bytes());

        let digest = format!("{:x}", hasher.finalize());
        let bucket = epoch_secs / bucket_width.as_secs().max(1);

        Self { digest, bucket }
    }
}

struct CacheInner {
    entries: HashMap<Fingerprint, PipelineResult>,
    insertion_order: VecDeque<Fingerprint>,
}

/// In-memory pipeline result cache
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    capacity: Option<usize>,
}

impl ResultCache {
    /// Create a cache; `capacity = None` means unbounded
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Look up a cached result; bucket mismatch is a natural miss because
    /// the bucket is part of the key
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<PipelineResult> {
        let inner = self.inner.lock().unwrap();
        let hit = inner.entries.get(fingerprint).cloned();
        tracing::debug!(
            digest = %fingerprint.digest,
            bucket = fingerprint.bucket,
            hit = hit.is_some(),
            "Cache lookup"
        );
        hit
    }

    /// Insert a result, evicting the least-recently-inserted entry when the
    /// capacity is exceeded. Re-inserting an existing key overwrites the
    /// value (last write wins) without disturbing insertion order.
    pub fn put(&self, fingerprint: Fingerprint, result: PipelineResult) {
        let mut inner = self.inner.lock().unwrap();

        if inner.entries.insert(fingerprint.clone(), result).is_none() {
            inner.insertion_order.push_back(fingerprint);

            if let Some(capacity) = self.capacity {
                while inner.insertion_order.len() > capacity {
                    if let Some(oldest) = inner.insertion_order.pop_front() {
                        inner.entries.remove(&oldest);
                        tracing::debug!(digest = %oldest.digest, "Cache eviction");
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries from buckets older than the given one
    pub fn purge_expired(&self, current_bucket: u64) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.entries.retain(|fp, _| fp.bucket >= current_bucket);
        let entries = &inner.entries;
        inner
            .insertion_order
            .retain(|fp| entries.contains_key(fp));
    }
}
