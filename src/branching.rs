//! Branching entropy and access variety of character windows.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::chars::char_bounds;
use crate::config::{BranchingConfig, TrainingConfig};
use crate::encoder::{EncodedId, IntegerEncoder};
use crate::error::Result;
use crate::metrics::{CounterSize, PruneOutcome, TrainingMetrics};
use crate::serialization;
use crate::trainer::{SubstringStatistics, Trainer};

/// Counts of the distinct extensions seen on one side of a window, keyed by encoded id.
pub type Branch = FxHashMap<EncodedId, usize>;

/// Per-window distributions of left and right extensions.
///
/// Windows and extensions are stored as ids of the model's own [`IntegerEncoder`]; the
/// encoder is saved and loaded together with the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchingEntropyModel {
    config: BranchingConfig,
    encoder: IntegerEncoder,
    left: FxHashMap<EncodedId, Branch>,
    right: FxHashMap<EncodedId, Branch>,
}

impl BranchingEntropyModel {
    /// Creates an empty model after validating `config`.
    pub fn new(config: BranchingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            config,
            IntegerEncoder::new(),
            FxHashMap::default(),
            FxHashMap::default(),
        ))
    }

    pub(crate) fn from_parts(
        config: BranchingConfig,
        encoder: IntegerEncoder,
        left: FxHashMap<EncodedId, Branch>,
        right: FxHashMap<EncodedId, Branch>,
    ) -> Self {
        Self {
            config,
            encoder,
            left,
            right,
        }
    }

    /// Loads a model and its encoder written by [`BranchingEntropyModel::save`].
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, encoder_path: Q) -> Result<Self> {
        serialization::load_branching(model_path, encoder_path)
    }

    /// Writes the encoder and the model, each atomically.
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(&self, model_path: P, encoder_path: Q) -> Result<()> {
        serialization::save_branching(self, model_path, encoder_path)
    }

    /// Window bounds the model was built with.
    #[must_use]
    pub fn config(&self) -> &BranchingConfig {
        &self.config
    }

    /// Encoder owning every window and extension id.
    #[must_use]
    pub fn encoder(&self) -> &IntegerEncoder {
        &self.encoder
    }

    pub(crate) fn left_branches(&self) -> &FxHashMap<EncodedId, Branch> {
        &self.left
    }

    pub(crate) fn right_branches(&self) -> &FxHashMap<EncodedId, Branch> {
        &self.right
    }

    /// Trains on `sentences` with the checkpoint pruning described by `cfg`.
    pub fn train<I, S>(&mut self, sentences: I, cfg: &TrainingConfig) -> TrainingMetrics
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Trainer::new(cfg.clone()).train(self, sentences)
    }

    /// Left extensions of `word`. With `ignore_space`, extensions containing a space are dropped.
    #[must_use]
    pub fn left_branch(&self, word: &str, ignore_space: bool) -> Branch {
        self.branch(&self.left, word, ignore_space)
    }

    /// Right extensions of `word`. With `ignore_space`, extensions containing a space are dropped.
    #[must_use]
    pub fn right_branch(&self, word: &str, ignore_space: bool) -> Branch {
        self.branch(&self.right, word, ignore_space)
    }

    /// `(left, right)` entropy of the extension distributions of `word`.
    #[must_use]
    pub fn branching_entropy(&self, word: &str, ignore_space: bool) -> (f64, f64) {
        (
            entropy(&self.left_branch(word, ignore_space)),
            entropy(&self.right_branch(word, ignore_space)),
        )
    }

    /// `(left, right)` number of distinct extensions of `word`.
    #[must_use]
    pub fn access_variety(&self, word: &str, ignore_space: bool) -> (usize, usize) {
        (
            self.left_branch(word, ignore_space).len(),
            self.right_branch(word, ignore_space).len(),
        )
    }

    /// Branching entropy of every tracked window, keyed by its text.
    #[must_use]
    pub fn all_branching_entropies(&self, ignore_space: bool) -> FxHashMap<String, (f64, f64)> {
        self.words()
            .into_iter()
            .map(|word| (word.to_owned(), self.branching_entropy(word, ignore_space)))
            .collect()
    }

    /// Access variety of every tracked window, keyed by its text.
    #[must_use]
    pub fn all_access_varieties(&self, ignore_space: bool) -> FxHashMap<String, (usize, usize)> {
        self.words()
            .into_iter()
            .map(|word| (word.to_owned(), self.access_variety(word, ignore_space)))
            .collect()
    }

    /// Text of every tracked window.
    #[must_use]
    pub fn words(&self) -> Vec<&str> {
        let ids: FxHashSet<EncodedId> = self.left.keys().chain(self.right.keys()).copied().collect();
        ids.into_iter()
            .map(|id| self.encoder.decode(id, ""))
            .collect()
    }

    fn branch(&self, side: &FxHashMap<EncodedId, Branch>, word: &str, ignore_space: bool) -> Branch {
        let Some(branch) = self.encoder.encode(word).and_then(|id| side.get(&id)) else {
            return Branch::default();
        };
        if !ignore_space {
            return branch.clone();
        }
        branch
            .iter()
            .filter(|(&id, _)| !self.encoder.decode(id, " ").contains(' '))
            .map(|(&id, &count)| (id, count))
            .collect()
    }
}

impl SubstringStatistics for BranchingEntropyModel {
    /// Slides every window of `min_length..=max_length` characters over the space-padded
    /// sentence, skipping windows that contain a space, and counts the window extended by one
    /// character on each side. An extension that would be a lone space takes one more
    /// character beyond it.
    fn observe(&mut self, sentence: &str) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            return;
        }
        let padded = format!(" {trimmed} ");
        let chars: Vec<char> = padded.chars().collect();
        let bounds = char_bounds(&padded);
        let n = chars.len();

        for begin in 1..n - 1 {
            for width in self.config.min_length..=self.config.max_length {
                let end = begin + width;
                if end > n || chars[begin..end].contains(&' ') {
                    break;
                }
                let left_begin = if chars[begin - 1] == ' ' {
                    begin.saturating_sub(2)
                } else {
                    begin - 1
                };
                let right_end = if chars[end] == ' ' {
                    (end + 2).min(n)
                } else {
                    end + 1
                };

                let word_id = self.encoder.fit(&padded[bounds[begin]..bounds[end]]);
                let left_id = self.encoder.fit(&padded[bounds[left_begin]..bounds[end]]);
                let right_id = self.encoder.fit(&padded[bounds[begin]..bounds[right_end]]);
                *self
                    .left
                    .entry(word_id)
                    .or_default()
                    .entry(left_id)
                    .or_insert(0) += 1;
                *self
                    .right
                    .entry(word_id)
                    .or_default()
                    .entry(right_id)
                    .or_insert(0) += 1;
            }
        }
    }

    /// Drops every window whose total left-extension count is not above `min_count`.
    ///
    /// Encoder entries are kept, so ids stay valid.
    fn prune(&mut self, min_count: usize) -> PruneOutcome {
        let before = self.counter_size();
        let keep: FxHashSet<EncodedId> = self
            .left
            .iter()
            .filter(|(_, branch)| branch.values().sum::<usize>() > min_count)
            .map(|(&id, _)| id)
            .collect();
        self.left.retain(|id, _| keep.contains(id));
        self.right.retain(|id, _| keep.contains(id));
        PruneOutcome {
            before,
            after: self.counter_size(),
        }
    }

    fn counter_size(&self) -> CounterSize {
        (self.left.len(), self.right.len())
    }
}

/// Shannon entropy `-sum(p * ln p)` of a count distribution; zero when empty.
#[must_use]
pub fn entropy(branch: &Branch) -> f64 {
    let total: usize = branch.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    -branch
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(min: usize, max: usize) -> BranchingEntropyModel {
        BranchingEntropyModel::new(BranchingConfig::new(min, max).unwrap()).unwrap()
    }

    fn decoded(model: &BranchingEntropyModel, branch: &Branch) -> Vec<String> {
        let mut texts: Vec<String> = branch
            .keys()
            .map(|&id| model.encoder().decode(id, "?").to_owned())
            .collect();
        texts.sort();
        texts
    }

    #[test]
    fn entropy_of_empty_branch_is_zero() {
        assert_eq!(entropy(&Branch::default()), 0.0);
    }

    #[test]
    fn entropy_of_uniform_branch_is_ln_n() {
        let branch: Branch = [(0, 3), (1, 3), (2, 3)].into_iter().collect();
        assert!((entropy(&branch) - 3f64.ln()).abs() < 1e-12);
        let single: Branch = [(7, 5)].into_iter().collect();
        assert_eq!(entropy(&single), 0.0);
    }

    #[test]
    fn distinct_left_neighbours_are_counted() {
        let mut model = model(2, 2);
        model.train(["xaby zabw"], &TrainingConfig::default());
        assert_eq!(model.access_variety("ab", false), (2, 2));
        let left = model.left_branch("ab", false);
        assert_eq!(decoded(&model, &left), vec!["xab", "zab"]);
        let (left_entropy, _) = model.branching_entropy("ab", false);
        assert!((left_entropy - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn boundary_extensions_reach_past_the_space() {
        let mut model = model(2, 2);
        model.train(["ab cd"], &TrainingConfig::default());
        let right = model.right_branch("ab", false);
        assert_eq!(decoded(&model, &right), vec!["ab c"]);
        let left = model.left_branch("cd", false);
        assert_eq!(decoded(&model, &left), vec!["b cd"]);
        // sentence start has nothing beyond the padding space
        let left = model.left_branch("ab", false);
        assert_eq!(decoded(&model, &left), vec![" ab"]);
        assert_eq!(model.access_variety("ab", true), (0, 0));
    }

    #[test]
    fn windows_with_spaces_are_skipped() {
        let mut model = model(2, 3);
        model.train(["ab cd"], &TrainingConfig::default());
        let mut words = model.words();
        words.sort_unstable();
        assert_eq!(words, vec!["ab", "cd"]);
    }

    #[test]
    fn unknown_words_have_empty_branches() {
        let model = model(2, 7);
        assert_eq!(model.branching_entropy("없음", false), (0.0, 0.0));
        assert_eq!(model.access_variety("없음", false), (0, 0));
    }

    #[test]
    fn prune_drops_rare_windows() {
        let mut model = model(2, 2);
        model.train(["abab cd", "abab"], &TrainingConfig::default());
        let outcome = model.prune(2);
        assert!(outcome.after.0 <= outcome.before.0);
        // "ab" occurs four times; "ba" twice and "cd" once
        let mut words = model.words();
        words.sort_unstable();
        assert_eq!(words, vec!["ab"]);
        assert_eq!(model.counter_size(), (1, 1));
    }

    #[test]
    fn all_entropies_are_keyed_by_text() {
        let mut model = model(2, 2);
        model.train(["xaby zabw"], &TrainingConfig::default());
        let entropies = model.all_branching_entropies(false);
        assert!(entropies.contains_key("ab"));
        let varieties = model.all_access_varieties(false);
        assert_eq!(varieties["ab"], (2, 2));
        assert_eq!(varieties["xa"], (1, 1));
    }
}
