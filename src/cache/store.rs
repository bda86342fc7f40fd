//! The generation cache.

use super::config::CacheConfig;
use super::headlines::HeadlineIndex;
use super::key::{CacheKey, GenerationParams};
use super::stats::{approximate_hit_rate, top_briefs, CacheStatistics};
use super::types::{CachedGeneration, ConceptDraft};
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::SystemTime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

struct Slot {
    generation: CachedGeneration,
    /// Insertion order, breaks usage ties during eviction.
    seq: u64,
}

struct CacheState {
    entries: HashMap<CacheKey, Slot>,
    headlines: HeadlineIndex,
    next_seq: u64,
}

/// In-memory cache of concept generations keyed by normalized request
/// parameters, plus a per-brief index of recent headlines.
///
/// The store and the headline index sit behind one mutex, so a `store` is
/// atomic with respect to concurrent lookups and duplicate checks. None of
/// the operations perform I/O.
pub struct GenerationCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl GenerationCache {
    /// Build a cache without a background sweeper.
    ///
    /// Expired entries are still dropped lazily on lookup and whenever a
    /// store pushes the cache over `max_size`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let headlines = HeadlineIndex::new(config.max_recent_headlines);
        Ok(Self {
            config,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                headlines,
                next_seq: 0,
            }),
            sweeper: Mutex::new(None),
        })
    }

    /// Build a shared cache and start its periodic sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: CacheConfig) -> Result<Arc<Self>> {
        let cache = Arc::new(Self::new(config)?);
        cache.start_sweeper()?;
        Ok(cache)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Spawn the sweeper that runs [`evict`](Self::evict) every
    /// `cleanup_interval`. A no-op if one is already running.
    ///
    /// The task only holds a weak reference and ends once the cache is dropped.
    pub fn start_sweeper(self: &Arc<Self>) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::runtime_with_context(
                "cache sweeper requires a tokio runtime",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("generation_cache"),
            )
        })?;

        let mut guard = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.cleanup_interval;
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.evict();
            }
        });
        *guard = Some(handle);
        debug!(interval = ?period, "cache sweeper started");
        Ok(())
    }

    /// Stop the periodic sweeper. Idempotent; the cache stays usable.
    pub fn shutdown(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!("cache sweeper stopped");
        }
    }

    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // Plain data with no invariant spanning a panic point; safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live generation for these parameters, counting the hit.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn lookup<S: AsRef<str>>(
        &self,
        brief: &str,
        tone: &str,
        concept_count: usize,
        devices: &[S],
    ) -> Option<CachedGeneration> {
        let key = CacheKey::derive(brief, tone, concept_count, devices);
        let now = SystemTime::now();
        let mut state = self.state();

        let expired = match state.entries.get_mut(&key) {
            None => {
                debug!(key = %key, "cache miss");
                return None;
            }
            Some(slot) if slot.generation.is_expired_at(now) => true,
            Some(Slot { generation, .. }) => {
                generation.record_hit(now);
                debug!(key = %key, usage = generation.usage_count, "cache hit");
                return Some(generation.clone());
            }
        };
        if expired {
            state.entries.remove(&key);
            debug!(key = %key, "cache entry expired");
        }
        None
    }

    /// Cache a completed generation, replacing any previous one for the same
    /// parameters, and register its headlines for duplicate detection.
    ///
    /// Headlines are indexed trimmed and lowercased; blank ones are not
    /// indexed since they can never match.
    pub fn store<S: AsRef<str>>(
        &self,
        brief: &str,
        tone: &str,
        concept_count: usize,
        devices: &[S],
        concepts: Vec<ConceptDraft>,
    ) {
        self.insert(GenerationParams::new(brief, tone, concept_count, devices), concepts);
    }

    /// [`store`](Self::store) that also hands back the stored snapshot.
    pub(crate) fn insert(
        &self,
        params: GenerationParams,
        concepts: Vec<ConceptDraft>,
    ) -> CachedGeneration {
        let key = params.cache_key();
        let brief = params.brief.clone();
        let generation =
            CachedGeneration::new(key.clone(), params, concepts, SystemTime::now(), self.config.ttl);

        let mut state = self.state();
        state.headlines.record(&brief, generation.headlines());
        let seq = state.next_seq;
        state.next_seq += 1;
        let replaced = state
            .entries
            .insert(
                key.clone(),
                Slot {
                    generation: generation.clone(),
                    seq,
                },
            )
            .is_some();
        debug!(
            key = %key,
            concepts = generation.concepts.len(),
            replaced,
            "cached generation"
        );
        if state.entries.len() > self.config.max_size {
            self.evict_locked(&mut state, Some(&key));
        }
        generation
    }

    /// Whether `headline` is too close to one of the
    /// [`DEFAULT_DUPLICATE_WINDOW`](super::DEFAULT_DUPLICATE_WINDOW) newest
    /// headlines stored for `brief`.
    ///
    /// See [`headline_similarity`](super::headline_similarity) for the measure;
    /// `threshold` is usually [`DEFAULT_DUPLICATE_THRESHOLD`](super::DEFAULT_DUPLICATE_THRESHOLD).
    pub fn is_duplicate_headline(&self, brief: &str, headline: &str, threshold: f64) -> bool {
        self.state().headlines.is_duplicate(brief, headline, threshold)
    }

    /// Up to `limit` recent headlines for `brief`, newest first, lowercased.
    pub fn recent_headlines(&self, brief: &str, limit: usize) -> Vec<String> {
        self.state().headlines.recent(brief, limit)
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStatistics {
        let state = self.state();
        let generations: Vec<&CachedGeneration> =
            state.entries.values().map(|slot| &slot.generation).collect();
        let memory_usage_bytes = serde_json::to_vec(&generations)
            .map(|bytes| bytes.len())
            .unwrap_or(0);
        CacheStatistics {
            total_entries: generations.len(),
            total_concepts: generations.iter().map(|g| g.concepts.len()).sum(),
            hit_rate: approximate_hit_rate(generations.iter().map(|g| g.usage_count)),
            memory_usage_bytes,
            most_used_briefs: top_briefs(
                generations
                    .iter()
                    .map(|g| (g.params.brief.as_str(), g.usage_count)),
                self.config.top_briefs_limit,
            ),
        }
    }

    /// Drop every generation and every recorded headline.
    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.headlines.clear();
        info!("cache cleared");
    }

    /// Run one eviction pass and return how many entries were removed.
    ///
    /// Expired entries go first. If the cache is still above 90% of
    /// `max_size`, the least-used entries (oldest first among equals) are
    /// removed until it is at or below 80%.
    pub fn evict(&self) -> usize {
        let mut state = self.state();
        self.evict_locked(&mut state, None)
    }

    /// `keep` is never chosen by the usage pass; a store uses it so the
    /// generation it just inserted survives its own eviction.
    fn evict_locked(&self, state: &mut CacheState, keep: Option<&CacheKey>) -> usize {
        let now = SystemTime::now();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, slot| !slot.generation.is_expired_at(now));
        let expired = before - state.entries.len();

        let mut evicted = 0;
        if state.entries.len() > self.config.high_water_mark() {
            let excess = state.entries.len() - self.config.low_water_mark();
            let mut candidates: Vec<(u64, u64, CacheKey)> = state
                .entries
                .iter()
                .filter(|(key, _)| Some(*key) != keep)
                .map(|(key, slot)| (slot.generation.usage_count, slot.seq, key.clone()))
                .collect();
            candidates.sort_unstable();
            for (_, _, key) in candidates.into_iter().take(excess) {
                state.entries.remove(&key);
                evicted += 1;
            }
        }

        if expired + evicted > 0 {
            info!(
                expired,
                evicted,
                remaining = state.entries.len(),
                "cache cleanup"
            );
        }
        expired + evicted
    }
}

impl Default for GenerationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default()).expect("default config is valid")
    }
}

impl Drop for GenerationCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for GenerationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationCache")
            .field("config", &self.config)
            .field("entries", &self.len())
            .field("sweeper_running", &self.is_sweeper_running())
            .finish()
    }
}
