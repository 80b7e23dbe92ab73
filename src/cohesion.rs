//! Prefix/suffix frequency model and the cohesion scores derived from it.

use std::collections::BTreeSet;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::chars::{char_bounds, char_len, prefix, suffix};
use crate::config::{CohesionConfig, TrainingConfig};
use crate::counter::SubstringCounter;
use crate::error::{LexsegError, Result};
use crate::metrics::{CounterSize, PruneOutcome, TrainingMetrics};
use crate::serialization;
use crate::trainer::{SubstringStatistics, Trainer};

/// Cohesion scores and raw counts of one substring.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CohesionScore {
    /// Forward cohesion, computed from prefix counts.
    pub left_cohesion: f64,
    /// Backward cohesion, computed from suffix counts.
    pub right_cohesion: f64,
    /// Times the substring was seen as a token prefix.
    pub left_count: usize,
    /// Times the substring was seen as a token suffix.
    pub right_count: usize,
}

/// Prefix (`L`) and suffix (`R`) counters over whitespace-delimited tokens.
///
/// Forward cohesion of a word of length `n` is the per-character growth rate
/// `(L[word] / L[anchor]) ^ (1 / (n - left_min_length + 1))`, where the anchor is the
/// word's first `left_min_length` characters. Backward cohesion mirrors it on suffixes.
/// Both are only defined for `min_length <= n <= max_length` and read as zero elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct CohesionModel {
    config: CohesionConfig,
    left: SubstringCounter,
    right: SubstringCounter,
}

impl CohesionModel {
    /// Creates an empty model after validating `config`.
    pub fn new(config: CohesionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_counters(
            config,
            SubstringCounter::new(),
            SubstringCounter::new(),
        ))
    }

    pub(crate) fn from_counters(
        config: CohesionConfig,
        left: SubstringCounter,
        right: SubstringCounter,
    ) -> Self {
        Self {
            config,
            left,
            right,
        }
    }

    /// Loads a model previously written by [`CohesionModel::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        serialization::load_cohesion(path)
    }

    /// Writes the model atomically to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        serialization::save_cohesion(self, path)
    }

    /// Length bounds the model was built with.
    #[must_use]
    pub fn config(&self) -> &CohesionConfig {
        &self.config
    }

    /// Prefix counter.
    #[must_use]
    pub fn left_counter(&self) -> &SubstringCounter {
        &self.left
    }

    /// Suffix counter.
    #[must_use]
    pub fn right_counter(&self) -> &SubstringCounter {
        &self.right
    }

    /// Times `word` was seen as a token prefix.
    #[must_use]
    pub fn left_count(&self, word: &str) -> usize {
        self.left.get(word)
    }

    /// Times `word` was seen as a token suffix.
    #[must_use]
    pub fn right_count(&self, word: &str) -> usize {
        self.right.get(word)
    }

    /// Trains on `sentences` with the checkpoint pruning described by `cfg`.
    pub fn train<I, S>(&mut self, sentences: I, cfg: &TrainingConfig) -> TrainingMetrics
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Trainer::new(cfg.clone()).train(self, sentences)
    }

    /// Adds every count of `other` into this model.
    ///
    /// # Errors
    /// Returns an error if the two models were built with different length bounds.
    pub fn merge(&mut self, other: Self) -> Result<()> {
        if self.config != other.config {
            return Err(LexsegError::InvalidConfig(format!(
                "cannot merge cohesion models with different bounds: {:?} vs {:?}",
                self.config, other.config
            )));
        }
        self.absorb(other);
        Ok(())
    }

    pub(crate) fn absorb(&mut self, other: Self) {
        self.left.merge(other.left);
        self.right.merge(other.right);
    }

    pub(crate) fn empty_like(&self) -> Self {
        Self::from_counters(self.config, SubstringCounter::new(), SubstringCounter::new())
    }

    /// Scores `word`. Unobserved strings score zero; the empty string scores all zeros.
    #[must_use]
    pub fn score(&self, word: &str) -> CohesionScore {
        if word.is_empty() {
            return CohesionScore::default();
        }
        let len = char_len(word);
        let left_count = self.left.get(word);
        let right_count = self.right.get(word);
        if len == 1 {
            return CohesionScore {
                left_count,
                right_count,
                ..CohesionScore::default()
            };
        }

        let cfg = &self.config;
        let mut left_cohesion = 0.0;
        if (cfg.left_min_length..=cfg.left_max_length).contains(&len) {
            let anchor = self.left.get(prefix(word, cfg.left_min_length));
            left_cohesion = growth_rate(left_count, anchor, len - cfg.left_min_length + 1);
        }
        let mut right_cohesion = 0.0;
        if (cfg.right_min_length..=cfg.right_max_length).contains(&len) {
            let anchor = self.right.get(suffix(word, cfg.right_min_length));
            right_cohesion = growth_rate(right_count, anchor, len - cfg.right_min_length + 1);
        }

        CohesionScore {
            left_cohesion,
            right_cohesion,
            left_count,
            right_count,
        }
    }

    /// Scores every string observed as a prefix or a suffix.
    #[must_use]
    pub fn all_scores(&self) -> FxHashMap<String, CohesionScore> {
        let mut scores = FxHashMap::default();
        for word in self.left.keys().chain(self.right.keys()) {
            if !scores.contains_key(word) {
                scores.insert(word.to_owned(), self.score(word));
            }
        }
        scores
    }

    /// Every string observed as a prefix or a suffix, sorted.
    #[must_use]
    pub fn words(&self) -> BTreeSet<&str> {
        self.left.keys().chain(self.right.keys()).collect()
    }
}

impl Default for CohesionModel {
    fn default() -> Self {
        Self::from_counters(
            CohesionConfig::default(),
            SubstringCounter::new(),
            SubstringCounter::new(),
        )
    }
}

impl SubstringStatistics for CohesionModel {
    /// Counts prefixes of length `left_min..=min(left_max, n)` and suffixes of length
    /// `right_min..min(right_max, n)` of every whitespace-delimited token.
    fn observe(&mut self, sentence: &str) {
        let cfg = self.config;
        for token in sentence.split_whitespace() {
            let bounds = char_bounds(token);
            let len = bounds.len() - 1;
            for n in cfg.left_min_length..=cfg.left_max_length.min(len) {
                self.left.increment(&token[..bounds[n]]);
            }
            for n in cfg.right_min_length..cfg.right_max_length.min(len) {
                self.right.increment(&token[bounds[len - n]..]);
            }
        }
    }

    fn prune(&mut self, min_count: usize) -> PruneOutcome {
        let before = self.counter_size();
        self.left.retain_above(min_count);
        self.right.retain_above(min_count);
        PruneOutcome {
            before,
            after: self.counter_size(),
        }
    }

    fn counter_size(&self) -> CounterSize {
        (self.left.len(), self.right.len())
    }
}

fn growth_rate(count: usize, anchor: usize, steps: usize) -> f64 {
    if anchor == 0 {
        return 0.0;
    }
    (count as f64 / anchor as f64).powf(1.0 / steps as f64)
}
