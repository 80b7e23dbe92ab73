//! Unsupervised word extraction and segmentation from raw text.
//!
//! The crate learns substring statistics from whitespace-tokenized sentences without any
//! dictionary or labels. A [`CohesionModel`] counts token prefixes and suffixes and scores how
//! strongly a substring holds together; a [`BranchingEntropyModel`] measures how varied the
//! neighbours of a substring are. On top of the cohesion model the crate extracts a lexicon
//! of words and segments unseen tokens into scored spans.
//!
//! ```no_run
//! use lexseg::{CohesionModel, ExtractConfig, IngestConfig, TrainingConfig};
//!
//! # fn main() -> lexseg::Result<()> {
//! let sentences = lexseg::corpus::load_sentences(&["/path/to/corpus"], &IngestConfig::default())?;
//! let mut model = CohesionModel::default();
//! model.train(&sentences, &TrainingConfig::builder().pruning(100_000, 5).build());
//! let lexicon = model.extract(&ExtractConfig::default());
//! for span in model.segment("아이스크림을") {
//!     println!("{} {:.3}", span.text, span.score);
//! }
//! model.save("cohesion.txt")?;
//! # let _ = lexicon;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature. Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `lexseg = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::cast_precision_loss,
    clippy::multiple_crate_versions
)]

pub mod branching;
pub mod chars;
pub mod cohesion;
pub mod config;
pub mod corpus;
pub mod counter;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod ngram;
pub mod segment;
pub mod selection;
pub mod serialization;
pub mod trainer;

pub use branching::{entropy, Branch, BranchingEntropyModel};
pub use cohesion::{CohesionModel, CohesionScore};
pub use config::{
    BranchingConfig, CohesionBuilder, CohesionConfig, ExtractBuilder, ExtractConfig,
    IngestConfig, NgramConfig, TrainingBuilder, TrainingConfig,
};
pub use counter::SubstringCounter;
pub use encoder::{EncodedId, IntegerEncoder};
pub use error::{LexsegError, Result};
pub use extract::{transform, Lexicon};
pub use metrics::{PruneMetrics, PruneOutcome, TrainingMetrics};
pub use segment::Segmenter;
pub use selection::{select_non_overlapping, Span};
pub use trainer::{SubstringStatistics, Trainer};
