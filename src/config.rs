//! Configuration builders controlling training, scoring, extraction and corpus ingestion.

use crate::error::{LexsegError, Result};
use serde::{Deserialize, Serialize};

/// Substring length bounds used by the cohesion model.
///
/// Lengths are measured in characters, not bytes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CohesionConfig {
    /// Length of the anchor prefix used for forward cohesion, and the shortest counted prefix.
    pub left_min_length: usize,
    /// Longest prefix counted and scored.
    pub left_max_length: usize,
    /// Length of the anchor suffix used for backward cohesion, and the shortest counted suffix.
    pub right_min_length: usize,
    /// Upper bound on counted and scored suffixes.
    pub right_max_length: usize,
}

impl CohesionConfig {
    /// Returns a builder initialised with [`CohesionConfig::default`].
    #[must_use]
    pub fn builder() -> CohesionBuilder {
        CohesionBuilder::default()
    }

    /// Validates that both length ranges are non-empty and start at one or above.
    pub fn validate(&self) -> Result<()> {
        validate_range("left", self.left_min_length, self.left_max_length)?;
        validate_range("right", self.right_min_length, self.right_max_length)
    }
}

impl Default for CohesionConfig {
    fn default() -> Self {
        Self {
            left_min_length: 1,
            left_max_length: 10,
            right_min_length: 1,
            right_max_length: 6,
        }
    }
}

/// Builder for [`CohesionConfig`].
#[derive(Debug, Default, Clone)]
pub struct CohesionBuilder {
    cfg: CohesionConfig,
}

impl CohesionBuilder {
    /// Creates a builder with [`CohesionConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix length range.
    #[must_use]
    pub fn left_lengths(mut self, min: usize, max: usize) -> Self {
        self.cfg.left_min_length = min;
        self.cfg.left_max_length = max;
        self
    }

    /// Sets the suffix length range.
    #[must_use]
    pub fn right_lengths(mut self, min: usize, max: usize) -> Self {
        self.cfg.right_min_length = min;
        self.cfg.right_max_length = max;
        self
    }

    /// Finalises the builder, returning a validated [`CohesionConfig`].
    pub fn build(self) -> Result<CohesionConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Window length bounds used by the branching entropy model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchingConfig {
    /// Shortest window tracked.
    pub min_length: usize,
    /// Longest window tracked.
    pub max_length: usize,
}

impl BranchingConfig {
    /// Creates a validated configuration.
    pub fn new(min_length: usize, max_length: usize) -> Result<Self> {
        let cfg = Self {
            min_length,
            max_length,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the window length range.
    pub fn validate(&self) -> Result<()> {
        validate_range("window", self.min_length, self.max_length)
    }
}

impl Default for BranchingConfig {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 7,
        }
    }
}

/// Controls periodic pruning and progress reporting while training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingConfig {
    /// Prune every `prune_interval` sentences; `0` disables pruning.
    pub prune_interval: usize,
    /// Entries whose count is not strictly greater than this are pruned.
    pub prune_min_count: usize,
    /// Enables progress logging through the `log` facade.
    pub show_progress: bool,
}

impl TrainingConfig {
    /// Returns a builder initialised with [`TrainingConfig::default`].
    #[must_use]
    pub fn builder() -> TrainingBuilder {
        TrainingBuilder::default()
    }

    /// Returns true when sentence number `seen` (1-based) is a pruning checkpoint.
    #[must_use]
    pub fn is_checkpoint(&self, seen: usize) -> bool {
        self.prune_interval > 0 && seen % self.prune_interval == 0
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            prune_interval: 0,
            prune_min_count: 5,
            show_progress: false,
        }
    }
}

/// Builder for [`TrainingConfig`].
#[derive(Debug, Default, Clone)]
pub struct TrainingBuilder {
    cfg: TrainingConfig,
}

impl TrainingBuilder {
    /// Creates a builder with [`TrainingConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures checkpoint pruning.
    #[must_use]
    pub fn pruning(mut self, interval: usize, min_count: usize) -> Self {
        self.cfg.prune_interval = interval;
        self.cfg.prune_min_count = min_count;
        self
    }

    /// Enables or disables progress logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder.
    pub fn build(self) -> TrainingConfig {
        self.cfg
    }
}

/// Thresholds applied by word extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    /// Minimum prefix count a word needs.
    pub min_count: usize,
    /// Minimum `(forward, backward)` cohesion.
    pub min_cohesion: (f64, f64),
    /// Minimum ratio between a word's count and its one-character-shorter prefix's count.
    pub min_droprate: f64,
    /// Drops a prefix once a longer word that keeps most of its occurrences is accepted.
    pub remove_subword: bool,
}

impl ExtractConfig {
    /// Returns a builder initialised with [`ExtractConfig::default`].
    #[must_use]
    pub fn builder() -> ExtractBuilder {
        ExtractBuilder::default()
    }

    /// Validates that every threshold is a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        let (left, right) = self.min_cohesion;
        for (name, value) in [
            ("min_cohesion.0", left),
            ("min_cohesion.1", right),
            ("min_droprate", self.min_droprate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LexsegError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_count: 5,
            min_cohesion: (0.3, 0.0),
            min_droprate: 0.4,
            remove_subword: true,
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug, Default, Clone)]
pub struct ExtractBuilder {
    cfg: ExtractConfig,
}

impl ExtractBuilder {
    /// Creates a builder with [`ExtractConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum prefix count.
    #[must_use]
    pub fn min_count(mut self, value: usize) -> Self {
        self.cfg.min_count = value;
        self
    }

    /// Sets the minimum forward and backward cohesion.
    #[must_use]
    pub fn min_cohesion(mut self, forward: f64, backward: f64) -> Self {
        self.cfg.min_cohesion = (forward, backward);
        self
    }

    /// Sets the minimum droprate.
    #[must_use]
    pub fn min_droprate(mut self, value: f64) -> Self {
        self.cfg.min_droprate = value;
        self
    }

    /// Enables or disables removal of subsumed prefixes.
    #[must_use]
    pub fn remove_subword(mut self, enabled: bool) -> Self {
        self.cfg.remove_subword = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`ExtractConfig`].
    pub fn build(self) -> Result<ExtractConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Parameters of the n-gram merge pass run after segmentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NgramConfig {
    /// Largest number of adjacent spans merged into one candidate.
    pub max_n: usize,
    /// Subtracted once per merged span; negative values favour longer merges.
    pub length_penalty: f64,
}

impl NgramConfig {
    /// Creates a validated configuration.
    pub fn new(max_n: usize, length_penalty: f64) -> Result<Self> {
        let cfg = Self {
            max_n,
            length_penalty,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates that at least pairs can be merged.
    pub fn validate(&self) -> Result<()> {
        if self.max_n < 2 {
            return Err(LexsegError::InvalidConfig(format!(
                "max_n must be at least 2, got {}",
                self.max_n
            )));
        }
        if !self.length_penalty.is_finite() {
            return Err(LexsegError::InvalidConfig(
                "length_penalty must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self {
            max_n: 4,
            length_penalty: -0.05,
        }
    }
}

/// Configuration controlling how text corpora are discovered on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Enables recursive directory traversal.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

fn validate_range(name: &str, min: usize, max: usize) -> Result<()> {
    if min == 0 {
        return Err(LexsegError::InvalidConfig(format!(
            "{name} min length must be greater than zero"
        )));
    }
    if min > max {
        return Err(LexsegError::InvalidConfig(format!(
            "{name} min length ({min}) exceeds max length ({max})"
        )));
    }
    Ok(())
}
