//! # concept-cache
//!
//! 广告创意生成缓存：在昂贵的语言模型调用之前复用等价请求的结果，并避免重复标题。
//!
//! In-memory generation cache for an AI-assisted advertising-concept
//! generator. It sits between the request layer and the expensive
//! language-model pipeline.
//!
//! ## Overview
//!
//! - **Fingerprinted requests**: brief, tone, concept count and rhetorical
//!   devices are normalized and hashed, so casing and device order never
//!   cause a miss
//! - **Fixed TTL**: every generation expires a set time after it was stored
//! - **Bounded size**: expired entries are dropped first, then the least used
//! - **Duplicate headlines**: a per-brief index of recent headlines flags
//!   near-verbatim repeats before the generator's output is accepted
//! - **Statistics**: entry counts, an approximate hit rate and the most used
//!   briefs
//!
//! ## Quick Start
//!
//! ```rust
//! use concept_cache::cache::{CacheConfig, ConceptDraft, GenerationCache};
//!
//! let cache = GenerationCache::new(CacheConfig::default())?;
//! let brief = "Ocean-safe sneakers";
//! if cache.lookup(brief, "bold", 1, &["metaphor"]).is_none() {
//!     let concepts = vec![ConceptDraft::new(brief, "bold", "Clean Seas, Clean Steps")];
//!     cache.store(brief, "bold", 1, &["metaphor"], concepts);
//! }
//! println!("{}", cache.stats().format());
//! # Ok::<(), concept_cache::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Generation store, key derivation, eviction, headline index |
//! | [`generation`] | Cache-first orchestration around an external generator |
//! | [`error`] | Error type and structured context |

pub mod cache;
pub mod generation;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheKey, CacheStatistics, CachedConcept, CachedGeneration, ConceptDraft,
    GenerationCache,
};
pub use generation::{ConceptGenerator, ConceptService, GenerationOutcome, GenerationRequest};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
