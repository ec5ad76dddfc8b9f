//! Bounded, time-limited memoization of reference frames.
//!
//! Entries are keyed by frame type plus a quantized signature of every
//! landmark position in the frame's lineage, so a moved parent landmark
//! changes the key of each dependent frame. Visibility is not part of the
//! key; callers gate on it before looking a frame up, and a hit returns the
//! confidence recorded when the frame was built. Eviction removes the least recently used
//! entry; ties go to the entry with the fewest accesses.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gonio_core::{CacheConfig, FrameType, LandmarkSet, ReferenceFrame, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Monotonic time source for entry ages
pub trait Clock: Send {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, at: Duration) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    frame_type: FrameType,
    signature: Vec<i64>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    frame: ReferenceFrame,
    created_at: Duration,
    last_access: Duration,
    access_count: u64,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses); 0 before any lookup
    pub hit_rate: f64,
    pub average_lookup_micros: f64,
    pub size: usize,
    pub estimated_memory_bytes: usize,
    pub evictions: u64,
    pub expirations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    lookup_time: Duration,
}

/// Cache handle shared across processing threads
pub type SharedFrameCache = Arc<Mutex<FrameCache>>;

pub struct FrameCache {
    config: CacheConfig,
    entries: HashMap<CacheKey, CacheEntry>,
    clock: Box<dyn Clock>,
    counters: Counters,
}

impl std::fmt::Debug for FrameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCache")
            .field("config", &self.config)
            .field("size", &self.entries.len())
            .field("counters", &self.counters)
            .finish()
    }
}

impl FrameCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock::default())
    }

    pub fn with_clock(config: CacheConfig, clock: impl Clock + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            entries: HashMap::with_capacity(config.max_entries),
            clock: Box::new(clock),
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Replace the configuration, shrinking the cache if needed.
    ///
    /// An invalid configuration is rejected and the current one kept.
    pub fn set_config(&mut self, config: CacheConfig) -> Result<()> {
        config.validate()?;
        let precision_changed = config.precision != self.config.precision;
        self.config = config;
        if precision_changed {
            // Old signatures were quantized differently and can never hit again
            self.entries.clear();
        }
        while self.entries.len() > self.config.max_entries {
            self.evict_lru();
        }
        Ok(())
    }

    /// Return the cached frame for this landmark set, or compute and store it.
    ///
    /// A failed computation is propagated and nothing is stored.
    pub fn get<F>(
        &mut self,
        frame_type: FrameType,
        landmarks: &LandmarkSet,
        compute: F,
    ) -> Result<ReferenceFrame>
    where
        F: FnOnce() -> Result<ReferenceFrame>,
    {
        let started = Instant::now();
        let key = self.key_for(frame_type, landmarks);
        let now = self.clock.now();
        let ttl = self.config.ttl();

        let Some(key) = key else {
            // Degenerate signature: never shared, never stored
            self.counters.misses += 1;
            tracing::trace!(?frame_type, "frame cache bypass (degenerate key)");
            let result = compute();
            self.counters.lookup_time += started.elapsed();
            return result;
        };

        if let Some(entry) = self.entries.get_mut(&key) {
            if now.saturating_sub(entry.created_at) <= ttl {
                entry.last_access = now;
                entry.access_count += 1;
                let frame = entry.frame;
                self.counters.hits += 1;
                self.counters.lookup_time += started.elapsed();
                tracing::trace!(?frame_type, "frame cache hit");
                return Ok(frame);
            }
            self.entries.remove(&key);
            self.counters.expirations += 1;
            tracing::debug!(?frame_type, "frame cache entry expired");
        }

        self.counters.misses += 1;
        tracing::trace!(?frame_type, "frame cache miss");

        let result = compute();
        if let Ok(frame) = &result {
            while self.entries.len() >= self.config.max_entries {
                self.evict_lru();
            }
            self.entries.insert(
                key,
                CacheEntry {
                    frame: *frame,
                    created_at: now,
                    last_access: now,
                    access_count: 1,
                },
            );
        }
        self.counters.lookup_time += started.elapsed();
        result
    }

    /// Whether a live entry exists; does not touch statistics or recency
    pub fn has(&self, frame_type: FrameType, landmarks: &LandmarkSet) -> bool {
        let Some(key) = self.key_for(frame_type, landmarks) else {
            return false;
        };
        let now = self.clock.now();
        let ttl = self.config.ttl();
        self.entries
            .get(&key)
            .is_some_and(|entry| now.saturating_sub(entry.created_at) <= ttl)
    }

    /// Drop the entry for this landmark set; true if one was removed
    pub fn invalidate(&mut self, frame_type: FrameType, landmarks: &LandmarkSet) -> bool {
        match self.key_for(frame_type, landmarks) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// Drop every entry and reset statistics
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.counters = Counters::default();
        tracing::debug!(dropped, "frame cache cleared");
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.created_at) <= ttl);
        let purged = before - self.entries.len();
        if purged > 0 {
            self.counters.expirations += purged as u64;
            tracing::debug!(purged, "frame cache purged expired entries");
        }
        purged
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.counters.hits + self.counters.misses;
        let (hit_rate, average_lookup_micros) = if lookups == 0 {
            (0.0, 0.0)
        } else {
            (
                self.counters.hits as f64 / lookups as f64,
                self.counters.lookup_time.as_secs_f64() * 1e6 / lookups as f64,
            )
        };

        CacheStats {
            hits: self.counters.hits,
            misses: self.counters.misses,
            hit_rate,
            average_lookup_micros,
            size: self.entries.len(),
            estimated_memory_bytes: self.estimated_memory(),
            evictions: self.counters.evictions,
            expirations: self.counters.expirations,
        }
    }

    pub fn into_shared(self) -> SharedFrameCache {
        Arc::new(Mutex::new(self))
    }

    fn estimated_memory(&self) -> usize {
        let fixed = mem::size_of::<CacheKey>() + mem::size_of::<CacheEntry>();
        self.entries
            .keys()
            .map(|key| fixed + key.signature.len() * mem::size_of::<i64>())
            .sum()
    }

    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_access, entry.access_count))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
            self.counters.evictions += 1;
            tracing::debug!(frame_type = ?key.frame_type, "frame cache evicted LRU entry");
        }
    }

    /// Quantized lineage positions; `None` when any landmark is absent or non-finite
    fn key_for(&self, frame_type: FrameType, landmarks: &LandmarkSet) -> Option<CacheKey> {
        let scale = 10f64.powi(self.config.precision as i32);
        let quantize = |v: f64| -> Option<i64> { v.is_finite().then(|| (v * scale).round() as i64) };

        let names = frame_type.lineage_landmarks();
        let mut signature = Vec::with_capacity(names.len() * 3 + 1);
        signature.push(landmarks.view as i64);
        for name in names {
            let landmark = landmarks.get(name)?;
            signature.push(quantize(landmark.x)?);
            signature.push(quantize(landmark.y)?);
            signature.push(match landmark.depth {
                Some(depth) => quantize(depth)?,
                None => i64::MIN,
            });
        }

        Some(CacheKey {
            frame_type,
            signature,
        })
    }
}
