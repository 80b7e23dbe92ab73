use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use lexseg::corpus::load_sentences;
use lexseg::{
    BranchingConfig, BranchingEntropyModel, CohesionConfig, CohesionModel, ExtractConfig,
    IngestConfig, NgramConfig, Segmenter, Span, Trainer, TrainingConfig, TrainingMetrics,
};
use log::{info, warn};
use rayon::ThreadPoolBuilder;
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::json;

const DEFAULT_COHESION_OUTPUT: &str = "cohesion.txt";
const DEFAULT_BRANCHING_OUTPUT: &str = "branching.txt";

#[derive(Parser, Debug)]
#[command(author, version, about = "Unsupervised word extraction and segmentation", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a cohesion model from text corpora
    Train(TrainArgs),
    /// Extract a lexicon from a trained cohesion model
    Extract(ExtractArgs),
    /// Segment sentences with a trained cohesion model
    Segment(SegmentArgs),
    /// Train a branching entropy model from text corpora
    TrainBranching(TrainBranchingArgs),
    /// Report branching entropy and access variety of words
    Entropy(EntropyArgs),
    /// Inspect a cohesion model
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct CorpusArgs {
    /// Files or directories to ingest, one sentence per line
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Disable recursive directory traversal
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,
}

impl CorpusArgs {
    fn load(&self) -> Result<Vec<String>> {
        let cfg = IngestConfig {
            recursive: !self.no_recursive,
            follow_symlinks: self.follow_symlinks,
        };
        load_sentences(&self.inputs, &cfg).context("failed to load training corpus")
    }
}

#[derive(Args, Debug)]
struct PruneArgs {
    /// Prune counters every N sentences (0 disables pruning)
    #[arg(long, value_name = "N", default_value_t = 0)]
    prune_interval: usize,

    /// Keep only entries seen more than COUNT times when pruning
    #[arg(long, value_name = "COUNT", default_value_t = 5)]
    prune_min_count: usize,

    /// Disable progress logging and the spinner
    #[arg(long)]
    no_progress: bool,
}

impl PruneArgs {
    fn config(&self) -> TrainingConfig {
        TrainingConfig::builder()
            .pruning(self.prune_interval, self.prune_min_count)
            .show_progress(!self.no_progress)
            .build()
    }
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    #[command(flatten)]
    prune: PruneArgs,

    /// Output path for the cohesion model
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_COHESION_OUTPUT)]
    output: PathBuf,

    /// Shortest prefix counted
    #[arg(long, value_name = "LEN")]
    left_min_length: Option<usize>,

    /// Longest prefix counted
    #[arg(long, value_name = "LEN")]
    left_max_length: Option<usize>,

    /// Shortest suffix counted
    #[arg(long, value_name = "LEN")]
    right_min_length: Option<usize>,

    /// Longest suffix bound
    #[arg(long, value_name = "LEN")]
    right_max_length: Option<usize>,

    /// Shard sentences across the Rayon pool
    #[arg(long)]
    parallel: bool,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Cohesion model to load
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_COHESION_OUTPUT)]
    model: PathBuf,

    /// Minimum prefix count of a word
    #[arg(long, value_name = "COUNT")]
    min_count: Option<usize>,

    /// Minimum forward cohesion
    #[arg(long, value_name = "SCORE")]
    min_forward: Option<f64>,

    /// Minimum backward cohesion
    #[arg(long, value_name = "SCORE")]
    min_backward: Option<f64>,

    /// Minimum ratio between a word's count and its parent's
    #[arg(long, value_name = "RATE")]
    min_droprate: Option<f64>,

    /// Keep shorter words that a longer accepted word extends
    #[arg(long)]
    keep_subwords: bool,

    /// Emit JSON instead of tab-separated lines
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SegmentArgs {
    /// Cohesion model to load
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_COHESION_OUTPUT)]
    model: PathBuf,

    /// Sentences to segment; reads stdin line by line when omitted
    sentences: Vec<String>,

    /// Print only the most cohesive prefix of each token
    #[arg(long)]
    prefix_only: bool,

    /// Longest n-gram of adjacent spans offered for merging
    #[arg(long, value_name = "N")]
    max_n: Option<usize>,

    /// Per-span penalty applied to merged n-gram scores
    #[arg(long, value_name = "PENALTY", allow_hyphen_values = true)]
    length_penalty: Option<f64>,

    /// Emit JSON lines with span scores
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct TrainBranchingArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    #[command(flatten)]
    prune: PruneArgs,

    /// Output path for the branching entropy model
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_BRANCHING_OUTPUT)]
    output: PathBuf,

    /// Output path for the encoder table (defaults to the model path with `.encoder`)
    #[arg(long, value_name = "PATH")]
    encoder: Option<PathBuf>,

    /// Shortest window counted
    #[arg(long, value_name = "LEN", default_value_t = 2)]
    min_length: usize,

    /// Longest window counted
    #[arg(long, value_name = "LEN", default_value_t = 7)]
    max_length: usize,
}

#[derive(Args, Debug)]
struct EntropyArgs {
    /// Branching entropy model to load
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_BRANCHING_OUTPUT)]
    model: PathBuf,

    /// Encoder table (defaults to the model path with `.encoder`)
    #[arg(long, value_name = "PATH")]
    encoder: Option<PathBuf>,

    /// Words to report; all tracked windows when omitted
    words: Vec<String>,

    /// Ignore extensions that contain a space
    #[arg(long)]
    ignore_space: bool,

    /// Emit JSON instead of tab-separated lines
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Cohesion model to inspect
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_COHESION_OUTPUT)]
    model: PathBuf,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Extract(args) => run_extract(args),
        Commands::Segment(args) => run_segment(args),
        Commands::TrainBranching(args) => run_train_branching(args),
        Commands::Entropy(args) => run_entropy(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn spinner(enabled: bool, message: &'static str) -> Result<Option<ProgressBar>> {
    if !enabled {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg} {elapsed}")
        .context("invalid progress template")?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(Some(pb))
}

fn log_training(metrics: &TrainingMetrics, elapsed: Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        metrics.sentences as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    info!(
        "trained on {} sentences in {:.2?} ({:.0} sentences/s); counters (left, right) = {:?}, {} pruning passes",
        metrics.sentences,
        elapsed,
        rate,
        metrics.counter_size,
        metrics.prunings.len()
    );
}

fn run_train(args: TrainArgs) -> Result<()> {
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("unable to configure Rayon thread pool")?;
    }

    let defaults = CohesionConfig::default();
    let config = CohesionConfig::builder()
        .left_lengths(
            args.left_min_length.unwrap_or(defaults.left_min_length),
            args.left_max_length.unwrap_or(defaults.left_max_length),
        )
        .right_lengths(
            args.right_min_length.unwrap_or(defaults.right_min_length),
            args.right_max_length.unwrap_or(defaults.right_max_length),
        )
        .build()
        .context("invalid cohesion length bounds")?;

    let sentences = args.corpus.load()?;
    info!("loaded {} sentences", sentences.len());

    let training_cfg = args.prune.config();
    let pb = spinner(training_cfg.show_progress, "training cohesion model...")?;
    let start = Instant::now();
    let mut model = CohesionModel::new(config)?;
    let trainer = Trainer::new(training_cfg);
    let metrics = if args.parallel {
        trainer.train_cohesion_parallel(&mut model, &sentences)
    } else {
        trainer.train(&mut model, &sentences)
    };
    if let Some(pb) = pb {
        pb.finish_with_message("training complete");
    }
    log_training(&metrics, start.elapsed());

    model
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("wrote cohesion model to {}", args.output.display());
    Ok(())
}

fn load_cohesion(path: &Path) -> Result<CohesionModel> {
    CohesionModel::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let model = load_cohesion(&args.model)?;
    let defaults = ExtractConfig::default();
    let cfg = ExtractConfig::builder()
        .min_count(args.min_count.unwrap_or(defaults.min_count))
        .min_cohesion(
            args.min_forward.unwrap_or(defaults.min_cohesion.0),
            args.min_backward.unwrap_or(defaults.min_cohesion.1),
        )
        .min_droprate(args.min_droprate.unwrap_or(defaults.min_droprate))
        .remove_subword(!args.keep_subwords)
        .build()
        .context("invalid extraction thresholds")?;

    let lexicon = model.extract(&cfg);
    info!("extracted {} words", lexicon.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &lexicon)?;
        writeln!(out)?;
    } else {
        for (word, score) in &lexicon {
            writeln!(
                out,
                "{word}\t{:.4}\t{:.4}\t{}\t{}",
                score.left_cohesion, score.right_cohesion, score.left_count, score.right_count
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SegmentedSentence<'a> {
    sentence: &'a str,
    tokens: Vec<Vec<Span>>,
}

fn run_segment(args: SegmentArgs) -> Result<()> {
    let model = load_cohesion(&args.model)?;
    let defaults = NgramConfig::default();
    let ngram = NgramConfig::new(
        args.max_n.unwrap_or(defaults.max_n),
        args.length_penalty.unwrap_or(defaults.length_penalty),
    )
    .context("invalid n-gram settings")?;
    let segmenter = Segmenter::new(&model).ngram(ngram);

    let sentences = if args.sentences.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("failed to read stdin")?
    } else {
        args.sentences
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sentence in sentences.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if args.prefix_only {
            let prefixes = model.tokenize(sentence);
            if args.json {
                serde_json::to_writer(&mut out, &json!({ "sentence": sentence, "tokens": prefixes }))?;
                writeln!(out)?;
            } else {
                writeln!(out, "{}", prefixes.join(" "))?;
            }
            continue;
        }

        let tokens = segmenter.segment_sentence(sentence);
        if args.json {
            serde_json::to_writer(&mut out, &SegmentedSentence { sentence, tokens })?;
            writeln!(out)?;
        } else {
            let rendered: Vec<String> = tokens
                .iter()
                .map(|spans| {
                    spans
                        .iter()
                        .map(|span| span.text.as_str())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .collect();
            writeln!(out, "{}", rendered.join(" "))?;
        }
    }
    Ok(())
}

fn encoder_path(model: &Path, explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| model.with_extension("encoder"))
}

fn run_train_branching(args: TrainBranchingArgs) -> Result<()> {
    let config = BranchingConfig::new(args.min_length, args.max_length)
        .context("invalid window bounds")?;
    let sentences = args.corpus.load()?;
    info!("loaded {} sentences", sentences.len());

    let training_cfg = args.prune.config();
    let pb = spinner(training_cfg.show_progress, "training branching entropy model...")?;
    let start = Instant::now();
    let mut model = BranchingEntropyModel::new(config)?;
    let metrics = model.train(&sentences, &training_cfg);
    if let Some(pb) = pb {
        pb.finish_with_message("training complete");
    }
    log_training(&metrics, start.elapsed());

    let encoder = encoder_path(&args.output, args.encoder);
    if encoder == args.output {
        bail!("encoder path must differ from the model path");
    }
    model
        .save(&args.output, &encoder)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        "wrote branching entropy model to {} (encoder {}, {} entries)",
        args.output.display(),
        encoder.display(),
        model.encoder().len()
    );
    Ok(())
}

fn run_entropy(args: EntropyArgs) -> Result<()> {
    let encoder = encoder_path(&args.model, args.encoder);
    let model = BranchingEntropyModel::load(&args.model, &encoder)
        .with_context(|| format!("failed to load {}", args.model.display()))?;

    let mut words: Vec<String> = if args.words.is_empty() {
        model.words().into_iter().map(str::to_owned).collect()
    } else {
        args.words
    };
    words.sort();
    words.dedup();

    let tracked: FxHashSet<&str> = model.words().into_iter().collect();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut report = Vec::with_capacity(words.len());
    for word in &words {
        let (left_entropy, right_entropy) = model.branching_entropy(word, args.ignore_space);
        let (left_variety, right_variety) = model.access_variety(word, args.ignore_space);
        if !tracked.contains(word.as_str()) {
            warn!("{word} is not tracked by the model");
        }
        if args.json {
            report.push(json!({
                "word": word,
                "left_entropy": left_entropy,
                "right_entropy": right_entropy,
                "left_variety": left_variety,
                "right_variety": right_variety,
            }));
        } else {
            writeln!(
                out,
                "{word}\t{left_entropy:.4}\t{right_entropy:.4}\t{left_variety}\t{right_variety}"
            )?;
        }
    }
    if args.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    }
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let model = load_cohesion(&args.model)?;
    let cfg = model.config();
    let summary = json!({
        "path": args.model.display().to_string(),
        "left_min_length": cfg.left_min_length,
        "left_max_length": cfg.left_max_length,
        "right_min_length": cfg.right_min_length,
        "right_max_length": cfg.right_max_length,
        "prefixes": model.left_counter().len(),
        "suffixes": model.right_counter().len(),
        "words": model.words().len(),
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Model: {}", args.model.display());
        println!(
            "Prefix lengths: {}..={}",
            cfg.left_min_length, cfg.left_max_length
        );
        println!(
            "Suffix lengths: {}..{}",
            cfg.right_min_length, cfg.right_max_length
        );
        println!("Prefixes: {}", model.left_counter().len());
        println!("Suffixes: {}", model.right_counter().len());
        println!("Distinct words: {}", model.words().len());
    }
    Ok(())
}
