//! 概念生成缓存：按规范化请求参数缓存生成结果，并抑制重复标题。
//!
//! # Generation Cache Module
//!
//! This module keeps recently generated advertising concepts in memory so that
//! effectively identical requests do not pay for another language-model call,
//! and remembers recent headlines per brief so the generator can avoid
//! repeating itself.
//!
//! ## Overview
//!
//! - Requests are fingerprinted after normalization (case, whitespace and
//!   device order do not matter)
//! - Every generation expires a fixed TTL after insertion
//! - When the store outgrows `max_size`, expired entries go first, then the
//!   least-used ones
//! - A periodic sweeper runs the same eviction pass and can be stopped with
//!   [`GenerationCache::shutdown`]
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`GenerationCache`] | Store, headline index, eviction and sweeper |
//! | [`CacheConfig`] | Size bound, TTL, sweep interval |
//! | [`CacheKey`] | SHA-256 fingerprint of the normalized request |
//! | [`CachedGeneration`] | One stored batch of concepts with its bookkeeping |
//! | [`HeadlineIndex`] | Per-brief recent headlines for duplicate checks |
//! | [`CacheStatistics`] | Entry counts, approximate hit rate, top briefs |
//!
//! ## Example
//!
//! ```rust
//! use concept_cache::cache::{CacheConfig, ConceptDraft, GenerationCache};
//!
//! let cache = GenerationCache::new(CacheConfig::default()).unwrap();
//! let drafts = vec![ConceptDraft::new("Ocean-safe sneakers", "bold", "Clean Seas, Clean Steps")];
//! cache.store("Ocean-safe sneakers", "bold", 1, &["metaphor"], drafts);
//!
//! let hit = cache.lookup("ocean-safe sneakers", "BOLD", 1, &["Metaphor"]);
//! assert!(hit.is_some());
//! assert!(cache.is_duplicate_headline("Ocean-safe sneakers", "clean seas clean steps", 0.8));
//! ```

mod config;
mod headlines;
mod key;
mod stats;
mod store;
mod types;

pub use config::{
    CacheConfig, DEFAULT_CLEANUP_INTERVAL_MINUTES, DEFAULT_MAX_RECENT_HEADLINES, DEFAULT_MAX_SIZE,
    DEFAULT_TOP_BRIEFS_LIMIT, DEFAULT_TTL_MINUTES, MAX_DURATION,
};
pub use headlines::{
    headline_similarity, HeadlineIndex, DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_DUPLICATE_WINDOW,
};
pub use key::{normalize_brief, CacheKey, GenerationParams, NormalizedParams};
pub use stats::{BriefUsage, CacheStatistics};
pub use store::GenerationCache;
pub use types::{CachedConcept, CachedGeneration, ConceptDraft};
