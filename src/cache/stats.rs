use serde::{Deserialize, Serialize};

/// Cumulative hits served for one brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefUsage {
    pub brief: String,
    pub usage_count: u64,
}

/// Point-in-time health snapshot of a [`GenerationCache`](super::GenerationCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_entries: usize,
    pub total_concepts: usize,
    /// `Σ usage / Σ max(1, usage)` over live entries.
    ///
    /// Misses that never became entries are invisible here, so this is a
    /// rough signal rather than a true hit/miss ratio.
    pub hit_rate: f64,
    /// Serialized size of all stored generations.
    pub memory_usage_bytes: usize,
    pub most_used_briefs: Vec<BriefUsage>,
}

impl CacheStatistics {
    pub fn memory_usage_mb(&self) -> f64 {
        self.memory_usage_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Format statistics for display
    pub fn format(&self) -> String {
        let mut out = format!(
            "Cache Statistics:\n  entries: {}\n  concepts: {}\n  hit rate: {:.1}%\n  memory: {:.3} MB",
            self.total_entries,
            self.total_concepts,
            self.hit_rate * 100.0,
            self.memory_usage_mb(),
        );
        if !self.most_used_briefs.is_empty() {
            out.push_str("\n  most used briefs:");
            for usage in &self.most_used_briefs {
                out.push_str(&format!("\n    {:>5}  {}", usage.usage_count, usage.brief));
            }
        }
        out
    }
}

/// Aggregate hits by brief, highest first; ties ordered by brief text.
pub(crate) fn top_briefs<'a, I>(usages: I, limit: usize) -> Vec<BriefUsage>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut totals: std::collections::HashMap<&str, u64> = std::collections::HashMap::new();
    for (brief, count) in usages {
        *totals.entry(brief).or_insert(0) += count;
    }
    let mut ranked: Vec<BriefUsage> = totals
        .into_iter()
        .map(|(brief, usage_count)| BriefUsage {
            brief: brief.to_string(),
            usage_count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.usage_count
            .cmp(&a.usage_count)
            .then_with(|| a.brief.cmp(&b.brief))
    });
    ranked.truncate(limit);
    ranked
}

/// The approximate hit rate described on [`CacheStatistics::hit_rate`].
pub(crate) fn approximate_hit_rate<I>(usage_counts: I) -> f64
where
    I: IntoIterator<Item = u64>,
{
    let (hits, requests) = usage_counts
        .into_iter()
        .fold((0u64, 0u64), |(hits, requests), usage| {
            (hits + usage, requests + usage.max(1))
        });
    if requests == 0 {
        0.0
    } else {
        hits as f64 / requests as f64
    }
}
