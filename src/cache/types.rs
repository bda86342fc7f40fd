use super::key::{CacheKey, GenerationParams};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// A freshly generated concept, before the cache adds its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDraft {
    pub id: String,
    pub brief: String,
    pub tone: String,
    pub headline: String,
    pub content: String,
    pub visual_prompt: String,
    pub rhetorical_device: String,
    pub tokens_used: u32,
    /// Estimated cost in USD.
    pub cost: f64,
}

impl ConceptDraft {
    /// A draft with a random id and empty body fields.
    pub fn new(brief: impl Into<String>, tone: impl Into<String>, headline: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            brief: brief.into(),
            tone: tone.into(),
            headline: headline.into(),
            content: String::new(),
            visual_prompt: String::new(),
            rhetorical_device: String::new(),
            tokens_used: 0,
            cost: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_visual_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.visual_prompt = prompt.into();
        self
    }

    pub fn with_rhetorical_device(mut self, device: impl Into<String>) -> Self {
        self.rhetorical_device = device.into();
        self
    }

    pub fn with_usage(mut self, tokens_used: u32, cost: f64) -> Self {
        self.tokens_used = tokens_used;
        self.cost = cost;
        self
    }
}

/// A concept as held by the cache.
///
/// `usage_count` and `last_accessed` are statistics only; they never extend
/// the concept's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedConcept {
    #[serde(flatten)]
    pub concept: ConceptDraft,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
    pub usage_count: u64,
    pub last_accessed: SystemTime,
}

impl CachedConcept {
    pub(crate) fn wrap(concept: ConceptDraft, now: SystemTime, expires_at: SystemTime) -> Self {
        Self {
            concept,
            created_at: now,
            expires_at,
            usage_count: 0,
            last_accessed: now,
        }
    }

    pub fn headline(&self) -> &str {
        &self.concept.headline
    }
}

/// The unit stored under one [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedGeneration {
    pub key: CacheKey,
    /// Generation order is preserved.
    pub concepts: Vec<CachedConcept>,
    pub params: GenerationParams,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
    /// Cache hits served from this generation; zero at insertion.
    pub usage_count: u64,
}

impl CachedGeneration {
    pub(crate) fn new(
        key: CacheKey,
        params: GenerationParams,
        concepts: Vec<ConceptDraft>,
        now: SystemTime,
        ttl: Duration,
    ) -> Self {
        let expires_at = now + ttl;
        Self {
            key,
            concepts: concepts
                .into_iter()
                .map(|c| CachedConcept::wrap(c, now, expires_at))
                .collect(),
            params,
            created_at: now,
            expires_at,
            usage_count: 0,
        }
    }

    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    pub(crate) fn record_hit(&mut self, now: SystemTime) {
        self.usage_count = self.usage_count.saturating_add(1);
        for concept in &mut self.concepts {
            concept.usage_count = concept.usage_count.saturating_add(1);
            concept.last_accessed = now;
        }
    }

    /// The drafts as they were handed to the cache.
    pub fn drafts(&self) -> Vec<ConceptDraft> {
        self.concepts.iter().map(|c| c.concept.clone()).collect()
    }

    pub fn headlines(&self) -> impl Iterator<Item = &str> {
        self.concepts.iter().map(|c| c.headline())
    }
}
