//! Per-brief index of recent headlines and the lexical similarity used to
//! flag near-verbatim repeats.
//!
//! The measure is Jaccard overlap of lowercase word sets. It catches a
//! headline reshuffled or re-punctuated, not a paraphrase.

use super::key::normalize_brief;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};

pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.8;
/// Newest headlines per brief a candidate is compared against. The index
/// may retain more than this.
pub const DEFAULT_DUPLICATE_WINDOW: usize = 10;

// Letters and digits, keeping apostrophes inside words ("don't", "o'clock").
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}\p{N}]+)*").expect("valid word regex"));

fn word_set(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Jaccard similarity of the two headlines' word sets, in `[0.0, 1.0]`.
///
/// Returns `0.0` when either side has no words.
pub fn headline_similarity(a: &str, b: &str) -> f64 {
    let wa = word_set(a);
    let wb = word_set(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let intersection = wa.intersection(&wb).count();
    let union = wa.len() + wb.len() - intersection;
    intersection as f64 / union as f64
}

fn normalize_headline(headline: &str) -> String {
    headline.trim().to_lowercase()
}

/// Recent headlines per normalized brief, newest first, capped per brief.
#[derive(Debug, Clone)]
pub struct HeadlineIndex {
    cap: usize,
    by_brief: HashMap<String, VecDeque<String>>,
}

impl HeadlineIndex {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            by_brief: HashMap::new(),
        }
    }

    /// Register a batch of headlines; the batch keeps its order at the front.
    /// Blank headlines are skipped.
    pub fn record<'a, I>(&mut self, brief: &str, headlines: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fresh: Vec<String> = headlines
            .into_iter()
            .map(normalize_headline)
            .filter(|h| !h.is_empty())
            .collect();
        if fresh.is_empty() {
            return;
        }
        let recent = self.by_brief.entry(normalize_brief(brief)).or_default();
        for headline in fresh.into_iter().rev() {
            recent.push_front(headline);
        }
        recent.truncate(self.cap);
    }

    pub fn recent(&self, brief: &str, limit: usize) -> Vec<String> {
        self.by_brief
            .get(&normalize_brief(brief))
            .map(|recent| recent.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_duplicate(&self, brief: &str, headline: &str, threshold: f64) -> bool {
        let Some(recent) = self.by_brief.get(&normalize_brief(brief)) else {
            return false;
        };
        recent
            .iter()
            .take(DEFAULT_DUPLICATE_WINDOW)
            .any(|previous| headline_similarity(headline, previous) >= threshold)
    }

    /// Number of briefs with at least one retained headline.
    pub fn brief_count(&self) -> usize {
        self.by_brief.len()
    }

    pub fn clear(&mut self) {
        self.by_brief.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_ignores_case_and_punctuation() {
        assert_eq!(
            headline_similarity("Clean Seas, Clean Steps", "clean seas clean steps"),
            1.0
        );
        assert_eq!(headline_similarity("Don't Blink!", "don’t blink"), 1.0);
    }

    #[test]
    fn test_similarity_partial_overlap() {
        // {step, into, summer} vs {step, into, winter}: 2 / 4
        let score = headline_similarity("Step into summer", "Step into winter");
        assert!((score - 0.5).abs() < f64::EPSILON);
        assert_eq!(headline_similarity("Midnight Harvest Rituals", "Clean Seas"), 0.0);
    }

    #[test]
    fn test_similarity_empty_is_zero() {
        assert_eq!(headline_similarity("", ""), 0.0);
        assert_eq!(headline_similarity("!!!", "word"), 0.0);
    }

    #[test]
    fn test_record_keeps_newest_first_and_caps() {
        let mut index = HeadlineIndex::new(3);
        index.record("Brief", ["One", "Two"]);
        index.record("brief ", ["Three", "Four"]);
        assert_eq!(index.recent("BRIEF", 10), vec!["three", "four", "one"]);
        assert_eq!(index.recent("brief", 1), vec!["three"]);
        assert_eq!(index.brief_count(), 1);
    }

    #[test]
    fn test_record_skips_blank_headlines() {
        let mut index = HeadlineIndex::new(5);
        index.record("brief", ["  ", ""]);
        assert_eq!(index.brief_count(), 0);
        index.record("brief", ["  Trimmed Headline  ", ""]);
        assert_eq!(index.recent("brief", 5), vec!["trimmed headline"]);
    }

    #[test]
    fn test_is_duplicate_threshold() {
        let mut index = HeadlineIndex::new(20);
        index.record("brief", ["Step into summer"]);
        assert!(index.is_duplicate("brief", "Step into winter", 0.5));
        assert!(!index.is_duplicate("brief", "Step into winter", 0.8));
        assert!(!index.is_duplicate("other brief", "Step into summer", 0.8));
    }

    #[test]
    fn test_is_duplicate_only_checks_newest_window() {
        let mut index = HeadlineIndex::new(20);
        let words = [
            "amber", "birch", "cobalt", "dune", "ember", "fjord", "glacier", "harbor", "iris",
            "juniper", "kelp", "lagoon", "meadow", "nectar", "orchid",
        ];
        for word in words {
            index.record("brief", [format!("{word} rising").as_str()]);
        }
        assert_eq!(index.recent("brief", 20).len(), 15);
        // "orchid" .. "fjord" are the newest ten; "amber" .. "ember" fell out.
        assert!(index.is_duplicate("brief", "Fjord Rising", 0.8));
        assert!(!index.is_duplicate("brief", "Ember Rising", 0.8));
        assert!(!index.is_duplicate("brief", "Amber Rising", 0.8));
    }
}
