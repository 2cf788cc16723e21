use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use aligned_box::AlignedBox;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::corpus::Corpus;
use crate::huffman::HuffmanTree;
use crate::negative::NegativeSamplingDistribution;
use crate::settings::{Approximation, Settings};
use crate::sigmoid::SigmoidTable;
use crate::worker::{Real, TrainData, TrainThread};

/// Input matrix cells start uniformly distributed in this range.
const INIT_RANGE: f32 = 0.005;

/// How often the orchestrator polls shared progress while reporting.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A failed training run. Workers never fail once launched; everything
/// here is detected at the public entry point before or after they run.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// A settings or corpus invariant was violated. Detected before any
    /// thread launches; aborts the whole run.
    #[error("invalid configuration: {0}")]
    Configuration(&'static str),
    /// Any other setup failure (allocation, thread spawn, worker panic).
    #[error("unexpected training failure: {0}")]
    Unexpected(String),
}

/// The trained matrices, row-major by word id.
#[derive(Debug)]
pub struct TrainedModel {
    /// Embedding vector length.
    pub size: usize,
    /// Input matrix: the learned word vectors, `vocab_size × size`.
    pub embeddings: Vec<f32>,
    /// Output matrix: back-propagation weights, `vocab_size × size`.
    pub weights: Vec<f32>,
}

/// Trains embeddings over `corpus` with the given settings.
///
/// Equivalent to [`train_with_progress`] without a callback.
pub fn train(settings: Settings, corpus: Arc<Corpus>) -> Result<TrainedModel, TrainError> {
    train_with_progress(settings, corpus, None)
}

/// Trains embeddings, optionally reporting progress.
///
/// The callback receives `(current_learning_rate, fraction_complete)`
/// and is invoked only by this orchestrating thread, at a fixed polling
/// interval, never by the workers themselves.
///
/// Matrix updates are deliberately unsynchronized (Hogwild): with more
/// than one thread, concurrent writes to the same row may be lost, and
/// two runs with identical settings may differ. With `threads == 1` and
/// a fixed seed the result is deterministic.
pub fn train_with_progress(
    settings: Settings,
    corpus: Arc<Corpus>,
    mut progress: Option<&mut dyn FnMut(f32, f32)>,
) -> Result<TrainedModel, TrainError> {
    if settings.size == 0 {
        return Err(TrainError::Configuration("vector size is zero"));
    }
    if corpus.vocab_size() == 0 {
        return Err(TrainError::Configuration("vocabulary is empty"));
    }
    if corpus.frequency.len() != corpus.vocab_size() {
        return Err(TrainError::Configuration(
            "frequency table does not match the vocabulary",
        ));
    }
    if corpus.train_words == 0 {
        return Err(TrainError::Configuration("train words count is zero"));
    }
    if settings.threads == 0 {
        return Err(TrainError::Configuration("thread count is zero"));
    }

    let vocab_size = corpus.vocab_size();
    let matrix_size = vocab_size * settings.size;

    let embeddings = alloc_matrix(matrix_size)?;
    let mut rng = SmallRng::seed_from_u64(settings.seed);
    for cell in embeddings.iter() {
        cell.set(rng.gen_range(-INIT_RANGE..INIT_RANGE));
    }
    let weights = alloc_matrix(matrix_size)?;

    // Exactly one approximation structure is built per run.
    let (huffman, negative) = match settings.approximation {
        Approximation::HierarchicalSoftmax => {
            (Some(Arc::new(HuffmanTree::new(&corpus.frequency))), None)
        }
        Approximation::NegativeSampling { .. } => (
            None,
            Some(Arc::new(NegativeSamplingDistribution::new(
                &corpus.frequency,
                settings.ns_table_size,
            ))),
        ),
    };

    let data = TrainData {
        sigmoid: Arc::new(SigmoidTable::new(settings.exp_table_size, settings.max_exp)),
        settings: Arc::new(settings),
        corpus: Arc::clone(&corpus),
        embeddings: Arc::new(embeddings),
        weights: Arc::new(weights),
        huffman,
        negative,
        processed_words: Arc::new(AtomicU64::new(0)),
        alpha: Arc::new(Real::default()),
    };
    let settings = Arc::clone(&data.settings);
    data.alpha.set(settings.alpha);

    // Near-equal contiguous document ranges, one worker each; fewer
    // workers than requested when the corpus is smaller.
    let n = corpus.texts.len();
    let per = ((n + settings.threads - 1) / settings.threads).max(1);
    let mut threads: Vec<TrainThread> = (0..n)
        .step_by(per)
        .enumerate()
        .map(|(id, start)| TrainThread::new(id, start..(start + per).min(n), data.clone()))
        .collect();

    info!(
        vocab_size,
        train_words = corpus.train_words,
        workers = threads.len(),
        "training started"
    );
    let start = Instant::now();
    for thread in &mut threads {
        thread
            .launch()
            .map_err(|e| TrainError::Unexpected(format!("failed to spawn a worker: {e}")))?;
    }

    if settings.verbose || progress.is_some() {
        let target = settings.iterations as u64 * corpus.train_words + 1;
        let mut last_iteration = 0;
        while !threads.iter().all(TrainThread::is_finished) {
            thread::sleep(POLL_INTERVAL);
            let processed = data.processed_words.load(Ordering::Relaxed);
            let alpha = data.alpha.get();
            let iteration = (processed * settings.iterations as u64 / target) as usize;
            if settings.verbose && iteration > last_iteration {
                info!(
                    iteration,
                    alpha,
                    elapsed = ?start.elapsed(),
                    "training progress"
                );
                last_iteration = iteration;
            }
            if let Some(report) = progress.as_deref_mut() {
                report(alpha, (processed as f32 / target as f32).min(1.0));
            }
        }
    }

    let mut panicked = false;
    for thread in &mut threads {
        panicked |= thread.join().is_err();
    }
    if panicked {
        return Err(TrainError::Unexpected(
            "a training thread panicked".to_string(),
        ));
    }
    info!(elapsed = ?start.elapsed(), "training finished");

    Ok(TrainedModel {
        size: settings.size,
        embeddings: data.embeddings.iter().map(Real::get).collect(),
        weights: data.weights.iter().map(Real::get).collect(),
    })
}

fn alloc_matrix(len: usize) -> Result<AlignedBox<[Real]>, TrainError> {
    AlignedBox::slice_from_default(128, len)
        .map_err(|e| TrainError::Unexpected(format!("matrix allocation failed: {e}")))
}
