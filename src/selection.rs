//! Greedy selection of non-overlapping scored spans.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Rounds after which selection stops even if candidates remain.
pub const MAX_SELECTION_ROUNDS: usize = 100;

/// A scored, half-open `[begin, end)` character range of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Text covered by the span.
    pub text: String,
    /// First character offset.
    pub begin: usize,
    /// Offset one past the last character.
    pub end: usize,
    /// Ranking score; forward cohesion for atomic spans.
    pub score: f64,
    /// Prefix count, used as the base frequency when merging.
    pub left_count: usize,
    /// Suffix count.
    pub right_count: usize,
}

impl Span {
    /// Creates a span.
    pub fn new(
        text: impl Into<String>,
        begin: usize,
        end: usize,
        score: f64,
        left_count: usize,
        right_count: usize,
    ) -> Self {
        Self {
            text: text.into(),
            begin,
            end,
            score,
            left_count,
            right_count,
        }
    }

    /// Number of characters covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Returns true for a zero-width span.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Returns true when the two ranges share at least one character.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        other.begin < self.end && self.begin < other.end
    }
}

/// Picks pairwise disjoint spans, highest score first, and returns them sorted by `begin`.
///
/// Each round accepts the best remaining candidate and discards every candidate that
/// overlaps it. Ties keep input order. This is a greedy policy, not an optimal weighted
/// interval schedule. After [`MAX_SELECTION_ROUNDS`] rounds remaining candidates are dropped.
#[must_use]
pub fn select_non_overlapping(mut candidates: Vec<Span>) -> Vec<Span> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut remaining = VecDeque::from(candidates);
    let mut selected = Vec::new();
    let mut rounds = 0usize;
    while let Some(best) = remaining.pop_front() {
        remaining.retain(|other| !other.overlaps(&best));
        selected.push(best);
        rounds += 1;
        if rounds > MAX_SELECTION_ROUNDS {
            break;
        }
    }
    selected.sort_by_key(|span| span.begin);
    selected
}
