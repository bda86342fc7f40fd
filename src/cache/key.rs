//! Cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-derived fingerprint of a normalized generation request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Derive the key for a raw (un-normalized) request tuple.
    pub fn derive<S: AsRef<str>>(
        brief: &str,
        tone: &str,
        concept_count: usize,
        devices: &[S],
    ) -> Self {
        NormalizedParams::new(brief, tone, concept_count, devices).key()
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Raw generation parameters, kept on each cached generation for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub brief: String,
    pub tone: String,
    pub concept_count: usize,
    pub devices: Vec<String>,
}

impl GenerationParams {
    pub fn new<S: AsRef<str>>(brief: &str, tone: &str, concept_count: usize, devices: &[S]) -> Self {
        Self {
            brief: brief.to_string(),
            tone: tone.to_string(),
            concept_count,
            devices: devices.iter().map(|d| d.as_ref().to_string()).collect(),
        }
    }

    pub fn normalized(&self) -> NormalizedParams {
        NormalizedParams::new(&self.brief, &self.tone, self.concept_count, &self.devices)
    }

    pub fn cache_key(&self) -> CacheKey {
        self.normalized().key()
    }
}

/// Canonical form hashed into a [`CacheKey`].
///
/// Field order is fixed by the struct, so the serialized JSON is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedParams {
    pub brief: String,
    pub tone: String,
    pub concept_count: usize,
    pub devices: Vec<String>,
}

impl NormalizedParams {
    pub fn new<S: AsRef<str>>(brief: &str, tone: &str, concept_count: usize, devices: &[S]) -> Self {
        let mut devices: Vec<String> = devices
            .iter()
            .map(|d| d.as_ref().to_lowercase())
            .collect();
        devices.sort();
        Self {
            brief: normalize_brief(brief),
            tone: tone.to_lowercase(),
            concept_count,
            devices,
        }
    }

    pub fn key(&self) -> CacheKey {
        // Serializing a struct of strings and integers cannot fail.
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey::new(hash)
    }
}

/// Lowercased, trimmed brief; also the key of the headline index.
pub fn normalize_brief(brief: &str) -> String {
    brief.trim().to_lowercase()
}
