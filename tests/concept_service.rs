//! Tests for cache-first concept generation through `ConceptService`.

use async_trait::async_trait;
use concept_cache::cache::{CacheConfig, ConceptDraft, GenerationCache};
use concept_cache::generation::{
    ConceptGenerator, ConceptService, GenerationRequest, GenerationSource,
};
use concept_cache::{Error, ErrorContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CALL_WORDS: [&str; 6] = ["amber", "birch", "cobalt", "dune", "ember", "fjord"];
const CONCEPT_WORDS: [&str; 6] = ["lantern", "meadow", "nectar", "orchid", "pebble", "quartz"];

/// Gives every headline its own words so nothing repeats; counts calls.
struct Counting {
    calls: AtomicUsize,
}

impl Counting {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConceptGenerator for Counting {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _avoid_headlines: &[String],
    ) -> concept_cache::Result<Vec<ConceptDraft>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..request.concept_count)
            .map(|i| {
                ConceptDraft::new(
                    &request.brief,
                    &request.tone,
                    format!(
                        "{} {}",
                        CALL_WORDS[call % CALL_WORDS.len()],
                        CONCEPT_WORDS[i % CONCEPT_WORDS.len()]
                    ),
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Always fails, like an upstream model outage.
struct Failing;

#[async_trait]
impl ConceptGenerator for Failing {
    async fn generate(
        &self,
        _request: &GenerationRequest,
        _avoid_headlines: &[String],
    ) -> concept_cache::Result<Vec<ConceptDraft>> {
        Err(Error::generation_with_context(
            "model unavailable",
            ErrorContext::new().with_source("failing"),
        ))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Echoes back the first headline it was told to avoid, if any.
struct Parrot;

#[async_trait]
impl ConceptGenerator for Parrot {
    async fn generate(
        &self,
        request: &GenerationRequest,
        avoid_headlines: &[String],
    ) -> concept_cache::Result<Vec<ConceptDraft>> {
        let headline = avoid_headlines
            .first()
            .cloned()
            .unwrap_or_else(|| "Fresh Idea".to_string());
        Ok(vec![ConceptDraft::new(&request.brief, &request.tone, headline)])
    }

    fn name(&self) -> &'static str {
        "parrot"
    }
}

fn shared_cache() -> Arc<GenerationCache> {
    Arc::new(GenerationCache::new(CacheConfig::default()).unwrap())
}

#[tokio::test]
async fn test_second_identical_request_is_served_from_cache() {
    let generator = Counting::new();
    let service = ConceptService::new(shared_cache(), generator.clone());

    let first = GenerationRequest::new("Ocean-safe sneakers", "bold", 3, &["metaphor", "pun"]);
    let outcome = service.generate(&first).await.unwrap();
    assert_eq!(outcome.source, GenerationSource::Generated);
    assert_eq!(outcome.rejected_duplicates, 0);
    assert_eq!(outcome.generation.concepts.len(), 3);

    let same = GenerationRequest::new("OCEAN-SAFE SNEAKERS", "Bold", 3, &["PUN", "Metaphor"]);
    let cached = service.generate(&same).await.unwrap();
    assert_eq!(cached.source, GenerationSource::Cache);
    assert_eq!(cached.generation.drafts(), outcome.generation.drafts());
    assert_eq!(cached.generation.usage_count, 1);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_different_count_is_a_miss() {
    let generator = Counting::new();
    let service = ConceptService::new(shared_cache(), generator.clone());
    service
        .generate(&GenerationRequest::new("brief", "bold", 2, &["pun"]))
        .await
        .unwrap();
    let outcome = service
        .generate(&GenerationRequest::new("brief", "bold", 3, &["pun"]))
        .await
        .unwrap();
    assert_eq!(outcome.source, GenerationSource::Generated);
    assert_eq!(outcome.rejected_duplicates, 0);
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_generator_failure_leaves_cache_untouched() {
    let cache = shared_cache();
    let service = ConceptService::new(cache.clone(), Arc::new(Failing));
    let request = GenerationRequest::new("brief", "bold", 1, &["pun"]);

    let err = service.generate(&request).await.unwrap_err();
    assert!(matches!(err, Error::Generation { .. }));
    assert!(cache.is_empty());

    // The next request retries generation instead of seeing a cached failure.
    let generator = Counting::new();
    let retry = ConceptService::new(cache.clone(), generator.clone());
    let outcome = retry.generate(&request).await.unwrap();
    assert_eq!(outcome.source, GenerationSource::Generated);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_invalid_request_never_reaches_generator() {
    let generator = Counting::new();
    let service = ConceptService::new(shared_cache(), generator.clone());
    let err = service
        .generate(&GenerationRequest::new("brief", "bold", 0, &["pun"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_recent_headlines_are_passed_as_avoid_hints() {
    let cache = shared_cache();
    cache.store(
        "Night market",
        "bold",
        1,
        &["pun"],
        vec![ConceptDraft::new("Night market", "bold", "Lanterns After Dark")],
    );

    // A generator that repeats the recent headline is rejected every round.
    let service = ConceptService::new(cache.clone(), Arc::new(Parrot)).with_max_regenerations(1);
    let err = service
        .generate(&GenerationRequest::new("Night market", "calm", 1, &["pun"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation { .. }));
    assert_eq!(cache.len(), 1);
}

fn cache_with_headline(headline: &str) -> Arc<GenerationCache> {
    let cache = shared_cache();
    cache.store(
        "brief",
        "bold",
        1,
        &["pun"],
        vec![ConceptDraft::new("brief", "bold", headline)],
    );
    cache
}

#[tokio::test]
async fn test_threshold_controls_rejection() {
    // "amber lantern" against "amber lantern glow" scores 2 / 3.
    let service = ConceptService::new(cache_with_headline("Amber Lantern Glow"), Counting::new());
    let outcome = service
        .generate(&GenerationRequest::new("brief", "calm", 1, &["pun"]))
        .await
        .unwrap();
    assert_eq!(outcome.rejected_duplicates, 0);
    assert_eq!(outcome.regenerations, 0);

    // At 0.6 the first draft is rejected; "birch lantern" scores 1 / 4.
    let service = ConceptService::new(cache_with_headline("Amber Lantern Glow"), Counting::new())
        .with_duplicate_threshold(0.6);
    let outcome = service
        .generate(&GenerationRequest::new("brief", "calm", 1, &["pun"]))
        .await
        .unwrap();
    assert_eq!(outcome.rejected_duplicates, 1);
    assert_eq!(outcome.regenerations, 1);
    assert_eq!(
        outcome.generation.headlines().collect::<Vec<_>>(),
        vec!["birch lantern"]
    );
}
