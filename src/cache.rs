//! Expiring key/value store shared by every request.
//!
//! Each entry carries its own time-to-live, so one cache can hold
//! second-scale predictions next to half-hour walk times. Expired entries
//! are never returned; they stay inert until overwritten or reaped by moka.

use moka::{future::Cache, Expiry};
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct Expiring<V> {
    value: V,
    ttl: Duration,
}

/// Expiry policy that reads the TTL stored alongside each value.
struct PerEntryTtl;

impl<V> Expiry<String, Expiring<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Expiring<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    // A write replaces the entry, so the clock restarts from the new TTL.
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Expiring<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Concurrent TTL cache keyed by scope strings.
///
/// Reads are lock-free and writes swap whole entries, so a reader sees
/// either the previous value or the new one, never a mix. There is no
/// capacity bound and no read-through: filling a miss is the caller's job.
pub struct TtlCache<V> {
    inner: Cache<String, Expiring<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().expire_after(PerEntryTtl).build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.inner.insert(key.into(), Expiring { value, ttl }).await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
