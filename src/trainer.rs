//! Training loop shared by the cohesion and branching entropy models.

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::cohesion::CohesionModel;
use crate::config::TrainingConfig;
use crate::metrics::{sample_rss_kb, CounterSize, PruneMetrics, PruneOutcome, TrainingMetrics};

/// Statistics accumulated one sentence at a time.
pub trait SubstringStatistics {
    /// Records every substring occurrence in `sentence`.
    fn observe(&mut self, sentence: &str);

    /// Drops entries whose count is not strictly greater than `min_count`.
    fn prune(&mut self, min_count: usize) -> PruneOutcome;

    /// Number of tracked `(left, right)` entries.
    fn counter_size(&self) -> CounterSize;
}

/// Drives a [`SubstringStatistics`] model over a corpus with checkpoint pruning.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    cfg: TrainingConfig,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: TrainingConfig) -> Self {
        Self { cfg }
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.cfg
    }

    /// Feeds `sentences` to `model` in order, pruning every `prune_interval` sentences.
    ///
    /// Stopping the iterator early leaves the model consistent with the sentences consumed.
    pub fn train<M, I, S>(&self, model: &mut M, sentences: I) -> TrainingMetrics
    where
        M: SubstringStatistics + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = Instant::now();
        let mut metrics = TrainingMetrics::new();
        for sentence in sentences {
            model.observe(sentence.as_ref());
            metrics.sentences += 1;
            if self.cfg.is_checkpoint(metrics.sentences) {
                self.checkpoint(model, &mut metrics, start);
            }
        }
        self.finish(model, metrics, start)
    }

    /// Trains a cohesion model with sentences sharded across the Rayon pool.
    ///
    /// Shard counters are summed into `model`. Pruning, when enabled, runs once on the
    /// merged counters instead of at per-sentence checkpoints.
    pub fn train_cohesion_parallel<S>(
        &self,
        model: &mut CohesionModel,
        sentences: &[S],
    ) -> TrainingMetrics
    where
        S: AsRef<str> + Sync,
    {
        let start = Instant::now();
        let template = model.empty_like();
        let merged = sentences
            .par_iter()
            .fold(
                || template.clone(),
                |mut shard, sentence| {
                    shard.observe(sentence.as_ref());
                    shard
                },
            )
            .reduce(
                || template.clone(),
                |mut acc, shard| {
                    acc.absorb(shard);
                    acc
                },
            );
        model.absorb(merged);

        let mut metrics = TrainingMetrics::new();
        metrics.sentences = sentences.len();
        if self.cfg.prune_interval > 0 {
            self.checkpoint(model, &mut metrics, start);
        }
        self.finish(model, metrics, start)
    }

    fn checkpoint<M>(&self, model: &mut M, metrics: &mut TrainingMetrics, start: Instant)
    where
        M: SubstringStatistics + ?Sized,
    {
        let outcome = model.prune(self.cfg.prune_min_count);
        debug!(
            "sentence {}: pruned counters {:?} -> {:?}",
            metrics.sentences, outcome.before, outcome.after
        );
        let snapshot = PruneMetrics {
            sentence: metrics.sentences,
            outcome,
            elapsed_total: start.elapsed(),
            rss_kb: sample_rss_kb(),
        };
        if self.cfg.show_progress {
            info!(
                "sentences {:>10} counters {:>8?} rss {:?} kB elapsed {:.2?}",
                snapshot.sentence, outcome.after, snapshot.rss_kb, snapshot.elapsed_total
            );
        }
        metrics.prunings.push(snapshot);
    }

    fn finish<M>(&self, model: &M, mut metrics: TrainingMetrics, start: Instant) -> TrainingMetrics
    where
        M: SubstringStatistics + ?Sized,
    {
        metrics.counter_size = model.counter_size();
        metrics.total_duration = start.elapsed();
        if self.cfg.show_progress {
            info!(
                "trained on {} sentences in {:.2?}; counters {:?}",
                metrics.sentences, metrics.total_duration, metrics.counter_size
            );
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::BranchingEntropyModel;
    use crate::config::BranchingConfig;

    fn corpus() -> Vec<String> {
        let mut sentences = Vec::new();
        for _ in 0..5 {
            sentences.push("아이스크림 는 맛있다".to_owned());
            sentences.push("아이스크림 은 차갑다".to_owned());
            sentences.push("커피 는 뜨겁다".to_owned());
        }
        sentences
    }

    #[test]
    fn checkpoints_fire_on_interval() {
        let cfg = TrainingConfig::builder().pruning(4, 1).build();
        let mut model = CohesionModel::default();
        let metrics = Trainer::new(cfg).train(&mut model, corpus());
        assert_eq!(metrics.sentences, 15);
        let at: Vec<usize> = metrics.prunings.iter().map(|p| p.sentence).collect();
        assert_eq!(at, vec![4, 8, 12]);
        for pruning in &metrics.prunings {
            assert!(pruning.outcome.after.0 <= pruning.outcome.before.0);
            assert!(pruning.outcome.after.1 <= pruning.outcome.before.1);
        }
        assert_eq!(metrics.counter_size, model.counter_size());
    }

    #[test]
    fn branching_checkpoints_prune_rare_windows() {
        let cfg = TrainingConfig::builder().pruning(2, 2).build();
        let mut model = BranchingEntropyModel::new(BranchingConfig::new(2, 2).unwrap()).unwrap();
        let sentences = ["abab cd", "abab", "abab cd", "abab"];
        let metrics = Trainer::new(cfg).train(&mut model, sentences);

        let at: Vec<usize> = metrics.prunings.iter().map(|p| p.sentence).collect();
        assert_eq!(at, vec![2, 4]);
        for pruning in &metrics.prunings {
            assert!(pruning.outcome.after.0 <= pruning.outcome.before.0);
            assert!(pruning.outcome.after.1 <= pruning.outcome.before.1);
        }
        let words = model.words();
        assert_eq!(words, vec!["ab"]);
        for word in words {
            let mass: usize = model.left_branch(word, false).values().sum();
            assert!(mass > 2, "{word} kept with left mass {mass}");
        }
        assert_eq!(metrics.counter_size, (1, 1));
    }

    #[test]
    fn parallel_training_matches_sequential() {
        let sentences = corpus();
        let mut sequential = CohesionModel::default();
        Trainer::default().train(&mut sequential, &sentences);
        let mut parallel = CohesionModel::default();
        let metrics = Trainer::default().train_cohesion_parallel(&mut parallel, &sentences);
        assert_eq!(metrics.sentences, sentences.len());
        assert!(metrics.prunings.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn parallel_training_prunes_once() {
        let cfg = TrainingConfig::builder().pruning(100, 5).build();
        let mut model = CohesionModel::default();
        let metrics = Trainer::new(cfg).train_cohesion_parallel(&mut model, &corpus());
        assert_eq!(metrics.prunings.len(), 1);
        assert_eq!(model.left_count("커피"), 0);
        assert_eq!(model.left_count("아이스크림"), 10);
    }
}
