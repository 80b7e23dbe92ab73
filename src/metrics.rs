//! Metrics describing a training pass.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counter sizes reported as `(left, right)` entry counts.
pub type CounterSize = (usize, usize);

/// Counter sizes observed around one pruning pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Sizes before pruning.
    pub before: CounterSize,
    /// Sizes after pruning.
    pub after: CounterSize,
}

/// Snapshot captured at each pruning checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PruneMetrics {
    /// Number of sentences consumed when the checkpoint fired.
    pub sentence: usize,
    /// Counter sizes around the pruning pass.
    pub outcome: PruneOutcome,
    /// Total time elapsed since training started.
    pub elapsed_total: Duration,
    /// Resident set size sample captured from `/proc/self/status` on Linux.
    pub rss_kb: Option<usize>,
}

/// Aggregate metrics produced by a training pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingMetrics {
    /// Sentences consumed.
    pub sentences: usize,
    /// Pruning checkpoints, in order.
    pub prunings: Vec<PruneMetrics>,
    /// Counter sizes after the pass.
    pub counter_size: CounterSize,
    /// Total duration of the pass.
    pub total_duration: Duration,
}

impl TrainingMetrics {
    /// Creates an empty metrics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sentences: 0,
            prunings: Vec::new(),
            counter_size: (0, 0),
            total_duration: Duration::ZERO,
        }
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
fn current_rss_kb() -> Option<usize> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open("/proc/self/status").ok()?;
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let value = rest
                .split_whitespace()
                .find_map(|part| part.parse::<usize>().ok());
            return value;
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn current_rss_kb() -> Option<usize> {
    None
}

/// Samples the current resident set size (RSS) on supported platforms.
pub fn sample_rss_kb() -> Option<usize> {
    current_rss_kb()
}
