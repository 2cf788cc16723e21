use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wordvec::{train_with_progress, Approximation, CorpusBuilder, Model, Objective, Settings};

#[derive(Parser)]
#[command(about = "word vector estimation toolkit", long_about = None)]
struct Options {
    /// Use text data from FILE to train the model, one document per line
    #[arg(long = "train", value_name = "FILE")]
    train_file: PathBuf,

    /// Save the resulting word vectors to FILE
    #[arg(long = "output", value_name = "FILE")]
    output_file: PathBuf,

    /// Also save the full model (vocabulary, vectors and weights) in
    /// bincode format to FILE
    #[arg(long = "save-model", value_name = "FILE")]
    model_file: Option<PathBuf>,

    /// Set size of word vectors; default is 100
    #[arg(long, default_value_t = 100)]
    size: usize,

    /// Set max skip length between words
    #[arg(long, default_value_t = 5)]
    window: usize,

    /// Set threshold for occurrence of words. Those that appear with higher
    /// frequency in the training data will be randomly down-sampled; default
    /// is 1e-3, useful range is (0, 1e-5)
    #[arg(long, default_value_t = 1e-3)]
    sample: f32,

    /// Use Hierarchical Softmax instead of Negative Sampling
    #[arg(long)]
    hs: bool,

    /// Number of negative examples; common values are 3 - 10
    #[arg(long, default_value_t = 5)]
    negative: u32,

    /// Use N threads
    #[arg(long, value_name = "N", default_value_t = 12)]
    threads: usize,

    /// Run more training iterations
    #[arg(long, default_value_t = 5)]
    iter: usize,

    /// Discard words that appear less than N times
    #[arg(long = "min-count", value_name = "N", default_value_t = 5)]
    min_count: u64,

    /// Set the starting learning rate; default is 0.025 for skip-gram and 0.05 for CBOW
    #[arg(long)]
    alpha: Option<f32>,

    /// Use the continuous bag of words model (otherwise, use skip-gram model)
    #[arg(long)]
    cbow: bool,

    /// Save the resulting vectors in binary mode
    #[arg(long)]
    binary: bool,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Log an iteration report while training runs
    #[arg(long)]
    verbose: bool,
}

fn run(options: Options) -> Result<()> {
    let file = BufReader::new(
        File::open(&options.train_file).context("error opening training data file")?,
    );
    let mut builder = CorpusBuilder::new(options.min_count);
    for line in file.lines() {
        let line = line.context("error reading training data file")?;
        builder.add_document(line.split_whitespace());
    }
    let corpus = Arc::new(builder.build());
    info!(
        vocab_size = corpus.vocab_size(),
        train_words = corpus.train_words,
        "corpus built"
    );

    let settings = Settings {
        size: options.size,
        window: options.window,
        alpha: options
            .alpha
            .unwrap_or(if options.cbow { 0.05 } else { 0.025 }),
        iterations: options.iter,
        threads: options.threads,
        objective: if options.cbow {
            Objective::Cbow
        } else {
            Objective::SkipGram
        },
        approximation: if options.hs {
            Approximation::HierarchicalSoftmax
        } else {
            Approximation::NegativeSampling {
                samples: options.negative,
            }
        },
        sample: options.sample,
        seed: options.seed,
        verbose: options.verbose,
        ..Settings::default()
    };

    let bar = ProgressBar::new(1000).with_style(
        ProgressStyle::with_template("{bar:40} {percent}% alpha {msg}")
            .context("bad progress bar template")?,
    );
    let mut report = |alpha: f32, fraction: f32| {
        bar.set_position((fraction * 1000.0) as u64);
        bar.set_message(format!("{alpha:.5}"));
    };
    let trained = train_with_progress(settings, Arc::clone(&corpus), Some(&mut report))?;
    bar.finish();

    let model = Model::new(&corpus, trained);
    let out = BufWriter::new(
        File::create(&options.output_file).context("error creating output file")?,
    );
    model.save_vectors(out, options.binary)?;
    if let Some(model_file) = &options.model_file {
        let out = BufWriter::new(File::create(model_file).context("error creating model file")?);
        model.save(out)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let options = Options::parse();
    if let Err(err) = run(options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
