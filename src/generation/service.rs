use crate::cache::{
    headline_similarity, CachedGeneration, ConceptDraft, GenerationCache, GenerationParams,
    DEFAULT_DUPLICATE_THRESHOLD,
};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_REGENERATIONS: u32 = 2;

/// A concept-generation request as received from the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub brief: String,
    pub tone: String,
    pub concept_count: usize,
    /// Rhetorical devices to draw on.
    #[serde(default)]
    pub devices: Vec<String>,
}

impl GenerationRequest {
    pub fn new<S: AsRef<str>>(brief: &str, tone: &str, concept_count: usize, devices: &[S]) -> Self {
        Self {
            brief: brief.to_string(),
            tone: tone.to_string(),
            concept_count,
            devices: devices.iter().map(|d| d.as_ref().to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.brief.trim().is_empty() {
            return Err(invalid("request.brief", "brief must not be empty"));
        }
        if self.tone.trim().is_empty() {
            return Err(invalid("request.tone", "tone must not be empty"));
        }
        if self.concept_count == 0 {
            return Err(invalid(
                "request.concept_count",
                "concept_count must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams::new(&self.brief, &self.tone, self.concept_count, &self.devices)
    }

    fn with_concept_count(&self, concept_count: usize) -> Self {
        Self {
            concept_count,
            ..self.clone()
        }
    }
}

fn invalid(field: &str, message: &str) -> Error {
    Error::validation_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("concept_service"),
    )
}

/// The external pipeline that turns a brief into concepts.
#[async_trait]
pub trait ConceptGenerator: Send + Sync {
    /// Produce up to `request.concept_count` drafts.
    ///
    /// `avoid_headlines` lists lowercased headlines recently used for this
    /// brief; implementations should steer away from them.
    async fn generate(
        &self,
        request: &GenerationRequest,
        avoid_headlines: &[String],
    ) -> Result<Vec<ConceptDraft>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    Cache,
    Generated,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub source: GenerationSource,
    pub generation: CachedGeneration,
    /// Extra generator calls made to replace duplicate headlines.
    pub regenerations: u32,
    /// Drafts dropped because their headline repeated a recent one.
    pub rejected_duplicates: usize,
}

/// Cache-first concept generation with duplicate-headline suppression.
pub struct ConceptService {
    cache: Arc<GenerationCache>,
    generator: Arc<dyn ConceptGenerator>,
    duplicate_threshold: f64,
    max_regenerations: u32,
}

impl ConceptService {
    pub fn new(cache: Arc<GenerationCache>, generator: Arc<dyn ConceptGenerator>) -> Self {
        Self {
            cache,
            generator,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            max_regenerations: DEFAULT_MAX_REGENERATIONS,
        }
    }

    pub fn with_duplicate_threshold(mut self, threshold: f64) -> Self {
        self.duplicate_threshold = threshold;
        self
    }

    pub fn with_max_regenerations(mut self, max: u32) -> Self {
        self.max_regenerations = max;
        self
    }

    pub fn cache(&self) -> &Arc<GenerationCache> {
        &self.cache
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        request.validate()?;

        if let Some(generation) = self.cache.lookup(
            &request.brief,
            &request.tone,
            request.concept_count,
            &request.devices,
        ) {
            return Ok(GenerationOutcome {
                source: GenerationSource::Cache,
                generation,
                regenerations: 0,
                rejected_duplicates: 0,
            });
        }

        let mut avoid = self
            .cache
            .recent_headlines(&request.brief, self.cache.config().max_recent_headlines);
        let mut accepted: Vec<ConceptDraft> = Vec::with_capacity(request.concept_count);
        let mut rejected_duplicates = 0;
        let mut regenerations = 0;

        loop {
            let wanted = request.concept_count - accepted.len();
            let drafts = self
                .generator
                .generate(&request.with_concept_count(wanted), &avoid)
                .await?;

            for draft in drafts {
                if accepted.len() == request.concept_count {
                    break;
                }
                if self.is_repeat(&request.brief, &draft.headline, &accepted) {
                    debug!(headline = %draft.headline, "rejected duplicate headline");
                    rejected_duplicates += 1;
                    avoid.push(draft.headline.trim().to_lowercase());
                    continue;
                }
                accepted.push(draft);
            }

            if accepted.len() == request.concept_count || regenerations >= self.max_regenerations {
                break;
            }
            regenerations += 1;
            debug!(
                generator = self.generator.name(),
                missing = request.concept_count - accepted.len(),
                attempt = regenerations,
                "requesting regeneration"
            );
        }

        if accepted.is_empty() {
            warn!(
                generator = self.generator.name(),
                rejected_duplicates, "generator produced no usable concepts"
            );
            return Err(Error::generation_with_context(
                "generator produced no usable concepts",
                ErrorContext::new()
                    .with_details(format!("{rejected_duplicates} duplicate headlines rejected"))
                    .with_source(self.generator.name()),
            ));
        }
        if accepted.len() < request.concept_count {
            warn!(
                requested = request.concept_count,
                produced = accepted.len(),
                "caching a partial generation"
            );
        }

        let generation = self.cache.insert(request.params(), accepted);
        info!(
            key = %generation.key,
            concepts = generation.concepts.len(),
            regenerations,
            rejected_duplicates,
            "generated concepts"
        );
        Ok(GenerationOutcome {
            source: GenerationSource::Generated,
            generation,
            regenerations,
            rejected_duplicates,
        })
    }

    fn is_repeat(&self, brief: &str, headline: &str, accepted: &[ConceptDraft]) -> bool {
        self.cache
            .is_duplicate_headline(brief, headline, self.duplicate_threshold)
            || accepted
                .iter()
                .any(|a| headline_similarity(&a.headline, headline) >= self.duplicate_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use std::sync::Mutex;

    /// Hands out scripted batches in order, recording what it was asked.
    struct Scripted {
        batches: Mutex<Vec<Vec<&'static str>>>,
        calls: Mutex<Vec<(usize, Vec<String>)>>,
    }

    impl Scripted {
        fn new(batches: Vec<Vec<&'static str>>) -> Self {
            Self {
                batches: Mutex::new(batches.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConceptGenerator for Scripted {
        async fn generate(
            &self,
            request: &GenerationRequest,
            avoid_headlines: &[String],
        ) -> Result<Vec<ConceptDraft>> {
            self.calls
                .lock()
                .unwrap()
                .push((request.concept_count, avoid_headlines.to_vec()));
            let batch = self.batches.lock().unwrap().pop().unwrap_or_default();
            Ok(batch
                .into_iter()
                .map(|h| ConceptDraft::new(&request.brief, &request.tone, h))
                .collect())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn service(batches: Vec<Vec<&'static str>>) -> (ConceptService, Arc<Scripted>) {
        let cache = Arc::new(GenerationCache::new(CacheConfig::default()).unwrap());
        let generator = Arc::new(Scripted::new(batches));
        (ConceptService::new(cache, generator.clone()), generator)
    }

    #[test]
    fn test_request_validation() {
        assert!(GenerationRequest::new("brief", "bold", 1, &["pun"]).validate().is_ok());
        let err = GenerationRequest::new("  ", "bold", 1, &["pun"])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("request.brief")
        );
        assert!(GenerationRequest::new("brief", "", 1, &["pun"]).validate().is_err());
        assert!(GenerationRequest::new("brief", "bold", 0, &["pun"]).validate().is_err());
    }

    #[test]
    fn test_request_deserializes_without_devices() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"brief":"b","tone":"bold","concept_count":2}"#).unwrap();
        assert!(request.devices.is_empty());
    }

    #[test]
    fn test_regenerates_within_batch_repeats() {
        let (service, generator) = service(vec![
            vec!["Clean Seas, Clean Steps", "clean steps clean seas"],
            vec!["Midnight Harvest Rituals"],
        ]);
        let request = GenerationRequest::new("Ocean-safe sneakers", "bold", 2, &["metaphor"]);
        let outcome = tokio_test::block_on(service.generate(&request)).unwrap();

        assert_eq!(outcome.source, GenerationSource::Generated);
        assert_eq!(outcome.regenerations, 1);
        assert_eq!(outcome.rejected_duplicates, 1);
        let headlines: Vec<_> = outcome.generation.headlines().collect();
        assert_eq!(headlines, vec!["Clean Seas, Clean Steps", "Midnight Harvest Rituals"]);

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls[0], (2, vec![]));
        assert_eq!(calls[1], (1, vec!["clean steps clean seas".to_string()]));
    }

    #[test]
    fn test_only_duplicates_is_an_error() {
        let (service, _) = service(vec![vec!["Same Words Here"]]);
        let request = GenerationRequest::new("brief", "bold", 1, &["pun"]);
        tokio_test::block_on(service.generate(&request)).unwrap();

        // Different tone misses the cache but shares the brief's headline index.
        let service = ConceptService::new(
            service.cache().clone(),
            Arc::new(Scripted::new(vec![vec!["same words here"]; 3])),
        )
        .with_max_regenerations(2);
        let request = GenerationRequest::new("brief", "calm", 1, &["pun"]);
        let err = tokio_test::block_on(service.generate(&request)).unwrap_err();
        assert!(matches!(err, Error::Generation { .. }));
        assert_eq!(service.cache().len(), 1);
    }
}
