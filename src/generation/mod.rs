//! 生成请求处理：在缓存与外部概念生成器之间编排查找、生成、去重与存储。
//!
//! # Generation Module
//!
//! The seam between the [`GenerationCache`](crate::cache::GenerationCache) and
//! the external concept generator (a language-model pipeline).
//!
//! [`ConceptService`] follows the request flow the cache was built for:
//! look up the normalized request, and only on a miss ask the generator for
//! fresh concepts, steering it away from recent headlines and re-asking when a
//! draft repeats one. Successful batches are stored; failed generations leave
//! the cache untouched so the next identical request simply tries again.
//!
//! ```rust,no_run
//! use concept_cache::cache::{CacheConfig, ConceptDraft, GenerationCache};
//! use concept_cache::generation::{ConceptGenerator, ConceptService, GenerationRequest};
//! use std::sync::Arc;
//!
//! struct Canned;
//!
//! #[async_trait::async_trait]
//! impl ConceptGenerator for Canned {
//!     async fn generate(
//!         &self,
//!         request: &GenerationRequest,
//!         _avoid_headlines: &[String],
//!     ) -> concept_cache::Result<Vec<ConceptDraft>> {
//!         Ok(vec![ConceptDraft::new(&request.brief, &request.tone, "Clean Seas, Clean Steps")])
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "canned"
//!     }
//! }
//!
//! # async fn run() -> concept_cache::Result<()> {
//! let cache = GenerationCache::start(CacheConfig::default())?;
//! let service = ConceptService::new(cache, Arc::new(Canned));
//! let request = GenerationRequest::new("Ocean-safe sneakers", "bold", 1, &["metaphor"]);
//! let outcome = service.generate(&request).await?;
//! println!("{} concepts from {:?}", outcome.generation.concepts.len(), outcome.source);
//! # Ok(())
//! # }
//! ```

mod service;

pub use service::{
    ConceptGenerator, ConceptService, GenerationOutcome, GenerationRequest, GenerationSource,
    DEFAULT_MAX_REGENERATIONS,
};
