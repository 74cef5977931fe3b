//! Record linkage over short strings (publication titles).
//!
//! Titles gathered from two bibliographic sources often name the same work
//! with small differences in case, punctuation or venue suffix. This module
//! scores pairs on a 0–100 scale and reduces a title list to the titles that
//! are "distinct enough" under one of two greedy policies.
//!
//! ## Policies
//!
//! - [`LinkagePolicy::Legacy`] reproduces the historical outputs exactly.
//!   Item `i` is kept when some *later* item scores at or below the
//!   threshold against it. Because only later items are consulted, the last
//!   item of a list is never kept.
//! - [`LinkagePolicy::Corrected`] keeps the first occurrence of each work:
//!   item `i` is dropped when an already kept item scores above the
//!   threshold against it.

use crate::error::{LandscapeError, Result};
use clap::ValueEnum;
use std::fmt;
use tracing::debug;

/// How pairs of titles are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Scorer {
    /// Indel (insertion/deletion) ratio, `200 * LCS / (|a| + |b|)`
    #[default]
    Indel,
    /// Normalized Levenshtein distance, scaled to 0–100
    Levenshtein,
    /// Jaro-Winkler similarity, scaled to 0–100
    JaroWinkler,
}

impl Scorer {
    /// Score two strings on a 0–100 scale (100 = identical)
    pub fn score(self, a: &str, b: &str) -> u8 {
        match self {
            Scorer::Indel => similarity_ratio(a, b),
            Scorer::Levenshtein => scale(strsim::normalized_levenshtein(a, b)),
            Scorer::JaroWinkler => scale(strsim::jaro_winkler(a, b)),
        }
    }
}

/// Which greedy reduction is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LinkagePolicy {
    /// Keep an item only if a later item is dissimilar to it
    #[default]
    Legacy,
    /// Keep an item unless an earlier kept item is similar to it
    Corrected,
}

impl fmt::Display for LinkagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkagePolicy::Legacy => write!(f, "legacy"),
            LinkagePolicy::Corrected => write!(f, "corrected"),
        }
    }
}

/// Indel similarity ratio of two strings, rounded half-to-even to 0–100.
///
/// Lengths are counted in Unicode scalar values. Two empty strings are
/// identical (100); an empty string against a non-empty one scores 0.
pub fn similarity_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let lcs = longest_common_subsequence(&a, &b);
    round_half_even(200 * lcs, total)
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `numerator / denominator` rounded to the nearest integer, ties to even.
fn round_half_even(numerator: usize, denominator: usize) -> u8 {
    let quotient = numerator / denominator;
    let twice_remainder = 2 * (numerator % denominator);
    let rounded = if twice_remainder > denominator
        || (twice_remainder == denominator && quotient % 2 == 1)
    {
        quotient + 1
    } else {
        quotient
    };
    rounded.min(100) as u8
}

fn scale(similarity: f64) -> u8 {
    let scaled = (similarity * 100.0).round_ties_even();
    scaled.clamp(0.0, 100.0) as u8
}

/// Configured record linker.
#[derive(Debug, Clone, Copy)]
pub struct RecordLinker {
    threshold: u8,
    policy: LinkagePolicy,
    scorer: Scorer,
}

impl RecordLinker {
    /// Create a linker; `threshold` must lie in `0..=100`
    pub fn new(threshold: u8, policy: LinkagePolicy) -> Result<Self> {
        if threshold > 100 {
            return Err(LandscapeError::Validation(format!(
                "Similarity threshold must be within 0-100, got {}",
                threshold
            )));
        }
        Ok(Self {
            threshold,
            policy,
            scorer: Scorer::default(),
        })
    }

    /// Use a different pair scorer
    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Reduce `items` to the subset judged distinct under the policy
    pub fn distinct(&self, items: &[String]) -> Vec<String> {
        let result = match self.policy {
            LinkagePolicy::Legacy => self.distinct_legacy(items),
            LinkagePolicy::Corrected => self.distinct_corrected(items),
        };
        debug!(
            policy = %self.policy,
            threshold = self.threshold,
            input = items.len(),
            output = result.len(),
            "Record linkage complete"
        );
        result
    }

    fn distinct_legacy(&self, items: &[String]) -> Vec<String> {
        let mut distinct: Vec<String> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            for later in &items[i + 1..] {
                if self.scorer.score(item, later) <= self.threshold && !distinct.contains(item) {
                    distinct.push(item.clone());
                }
            }
        }
        distinct
    }

    fn distinct_corrected(&self, items: &[String]) -> Vec<String> {
        let mut distinct: Vec<String> = Vec::new();
        for item in items {
            let linked = distinct
                .iter()
                .any(|kept| kept == item || self.scorer.score(kept, item) > self.threshold);
            if !linked {
                distinct.push(item.clone());
            }
        }
        distinct
    }
}

/// Reduce `items` with the default scorer
pub fn distinct_by_threshold(
    items: &[String],
    threshold: u8,
    policy: LinkagePolicy,
) -> Result<Vec<String>> {
    Ok(RecordLinker::new(threshold, policy)?.distinct(items))
}
