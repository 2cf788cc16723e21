use std::io;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use aligned_box::AlignedBox;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::corpus::Corpus;
use crate::downsampling::DownSampling;
use crate::huffman::HuffmanTree;
use crate::negative::NegativeSamplingDistribution;
use crate::settings::{Approximation, Objective, Settings};
use crate::sigmoid::SigmoidTable;

/// An `f32` cell that tolerates unsynchronized concurrent access.
///
/// `add` is a plain read-modify-write, not a compare-and-swap: when two
/// threads add to the same cell at once, one update may be lost. That
/// is the Hogwild contract of the whole engine and is intentional.
#[derive(Default)]
#[repr(transparent)]
pub struct Real {
    bits: AtomicU32,
}

impl Real {
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, x: f32) {
        self.set(self.get() + x);
    }
}

/// Shared state the orchestrator constructs once and every training
/// thread holds a handle to.
///
/// The two matrices are flat `vocab_size × size` blocks addressed by
/// `word * size + k`. Workers read and write any row of either matrix
/// with no locks; only `processed_words` and `alpha` carry cross-thread
/// control meaning and are read/written atomically as whole scalars.
#[derive(Clone)]
pub struct TrainData {
    pub settings: Arc<Settings>,
    pub corpus: Arc<Corpus>,
    /// Input (projection-layer) matrix: the word vectors being learned.
    pub embeddings: Arc<AlignedBox<[Real]>>,
    /// Output (back-propagation) matrix: HS internal-node rows or NS
    /// per-word rows, depending on the approximation.
    pub weights: Arc<AlignedBox<[Real]>>,
    pub sigmoid: Arc<SigmoidTable>,
    pub huffman: Option<Arc<HuffmanTree>>,
    pub negative: Option<Arc<NegativeSamplingDistribution>>,
    pub processed_words: Arc<AtomicU64>,
    /// Current learning rate, decayed as `processed_words` advances.
    pub alpha: Arc<Real>,
}

/// One worker's private state: its corpus slice, its own random
/// generator, and scratch buffers sized once and reused for the whole
/// run.
pub struct TrainWorker {
    data: TrainData,
    range: Range<usize>,
    rng: SmallRng,
    down_sampling: Option<DownSampling>,
    hidden: Vec<f32>,
    gradient: Vec<f32>,
    sentence: Vec<u32>,
}

pub(crate) fn learning_rate(settings: &Settings, processed: u64, target: u64) -> f32 {
    let remaining = 1.0 - processed as f32 / target as f32;
    settings.alpha * remaining.max(settings.min_alpha_ratio)
}

impl TrainWorker {
    pub fn new(id: usize, range: Range<usize>, data: TrainData) -> Self {
        let settings = &data.settings;
        let down_sampling = (settings.sample > 0.0)
            .then(|| DownSampling::new(settings.sample, data.corpus.train_words));
        TrainWorker {
            rng: SmallRng::seed_from_u64(settings.seed.wrapping_add(id as u64)),
            down_sampling,
            hidden: vec![0.0; settings.size],
            gradient: vec![0.0; settings.size],
            sentence: Vec::new(),
            range,
            data,
        }
    }

    /// Runs every iteration over the assigned document range. Must not
    /// panic: the orchestrator has validated every precondition this
    /// code relies on.
    pub fn run(mut self) {
        debug!(range = ?self.range, "training worker started");
        for _ in 0..self.data.settings.iterations {
            for doc in self.range.clone() {
                self.build_sentence(doc);
                match self.data.settings.objective {
                    Objective::Cbow => self.cbow(),
                    Objective::SkipGram => self.skip_gram(),
                }
            }
        }
        debug!(range = ?self.range, "training worker finished");
    }

    /// Fills `self.sentence` with the document's words that survive
    /// down-sampling. Every consumed word advances the shared progress
    /// counter and refreshes the shared learning rate.
    fn build_sentence(&mut self, doc: usize) {
        self.sentence.clear();
        let settings = &*self.data.settings;
        let target = settings.iterations as u64 * self.data.corpus.train_words + 1;
        for &word in &self.data.corpus.texts[doc] {
            let processed = self.data.processed_words.fetch_add(1, Ordering::Relaxed) + 1;
            self.data
                .alpha
                .set(learning_rate(settings, processed, target));

            let keep = match &self.down_sampling {
                Some(ds) => ds.keep(self.data.corpus.frequency[word as usize], &mut self.rng),
                None => true,
            };
            if keep {
                self.sentence.push(word);
            }
        }
    }

    /// Effective window radius for one target position, drawn uniformly
    /// in `1..=window` to decorrelate update patterns across positions.
    fn window_radius(&mut self) -> usize {
        let window = self.data.settings.window;
        if window == 0 {
            0
        } else {
            window - self.rng.gen_range(0..window)
        }
    }

    /// CBOW: predict the target word from the average of its context
    /// words' vectors, then spread the gradient back equally over the
    /// context rows.
    fn cbow(&mut self) {
        let size = self.data.settings.size;
        let len = self.sentence.len();
        for pos in 0..len {
            let target = self.sentence[pos];
            let radius = self.window_radius();
            let lo = pos.saturating_sub(radius);
            let hi = (pos + radius).min(len - 1);

            self.hidden.fill(0.0);
            self.gradient.fill(0.0);
            let mut context_words = 0;
            for c in lo..=hi {
                if c == pos {
                    continue;
                }
                let row = self.sentence[c] as usize * size;
                for k in 0..size {
                    self.hidden[k] += self.data.embeddings[row + k].get();
                }
                context_words += 1;
            }
            if context_words == 0 {
                continue;
            }
            for v in &mut self.hidden {
                *v /= context_words as f32;
            }

            let alpha = self.data.alpha.get();
            self.approximate(target, alpha);

            for c in lo..=hi {
                if c == pos {
                    continue;
                }
                let row = self.sentence[c] as usize * size;
                for k in 0..size {
                    self.data.embeddings[row + k].add(self.gradient[k]);
                }
            }
        }
    }

    /// Skip-Gram: predict each context word from the target word's
    /// vector. The target row is snapshotted into the hidden buffer per
    /// context word and the gradient applied back before the next one.
    fn skip_gram(&mut self) {
        let size = self.data.settings.size;
        let len = self.sentence.len();
        for pos in 0..len {
            let l1 = self.sentence[pos] as usize * size;
            let radius = self.window_radius();
            let lo = pos.saturating_sub(radius);
            let hi = (pos + radius).min(len - 1);

            for c in lo..=hi {
                if c == pos {
                    continue;
                }
                for k in 0..size {
                    self.hidden[k] = self.data.embeddings[l1 + k].get();
                }
                self.gradient.fill(0.0);

                let alpha = self.data.alpha.get();
                self.approximate(self.sentence[c], alpha);

                for k in 0..size {
                    self.data.embeddings[l1 + k].add(self.gradient[k]);
                }
            }
        }
    }

    /// The shared per-pair update: reads `self.hidden`, accumulates the
    /// hidden-layer gradient into `self.gradient`, and updates output
    /// rows in place.
    fn approximate(&mut self, label: u32, alpha: f32) {
        match self.data.settings.approximation {
            Approximation::HierarchicalSoftmax => self.hierarchical_softmax(label, alpha),
            Approximation::NegativeSampling { samples } => {
                self.negative_sampling(label, samples, alpha)
            }
        }
    }

    /// Walk the label's Huffman root path; each internal node is a
    /// binary classifier for the branch the path takes there.
    fn hierarchical_softmax(&mut self, label: u32, alpha: f32) {
        let Some(tree) = &self.data.huffman else {
            return;
        };
        let size = self.data.settings.size;
        let max_exp = self.data.sigmoid.max_exp();
        let weights = &**self.data.weights;

        for (&node, &bit) in tree.point(label).iter().zip(tree.code(label)) {
            let l2 = node as usize * size;
            let f: f32 = (0..size)
                .map(|k| self.hidden[k] * weights[l2 + k].get())
                .sum();
            // Saturated nodes contribute no usable gradient.
            if f <= -max_exp || f >= max_exp {
                continue;
            }
            let g = (1.0 - bit as f32 - self.data.sigmoid.value(f)) * alpha;
            for k in 0..size {
                self.gradient[k] += g * weights[l2 + k].get();
            }
            for k in 0..size {
                weights[l2 + k].add(g * self.hidden[k]);
            }
        }
    }

    /// One positive round for the label, then `samples` negative rounds
    /// drawn from the unigram table, skipping draws that hit the label.
    fn negative_sampling(&mut self, label: u32, samples: u32, alpha: f32) {
        let Some(dist) = &self.data.negative else {
            return;
        };
        let size = self.data.settings.size;
        let max_exp = self.data.sigmoid.max_exp();
        let weights = &**self.data.weights;

        for d in 0..=samples {
            let (target, expected) = if d == 0 {
                (label, 1.0)
            } else {
                let t = dist.sample(&mut self.rng);
                if t == label {
                    continue;
                }
                (t, 0.0)
            };
            let l2 = target as usize * size;
            let f: f32 = (0..size)
                .map(|k| self.hidden[k] * weights[l2 + k].get())
                .sum();
            let predicted = if f > max_exp {
                1.0
            } else if f < -max_exp {
                0.0
            } else {
                self.data.sigmoid.value(f)
            };
            let g = (expected - predicted) * alpha;
            for k in 0..size {
                self.gradient[k] += g * weights[l2 + k].get();
            }
            for k in 0..size {
                weights[l2 + k].add(g * self.hidden[k]);
            }
        }
    }
}

/// Lifecycle wrapper around one training thread: idle after `new`,
/// running after `launch`, finished once `join` returns.
pub struct TrainThread {
    id: usize,
    worker: Option<TrainWorker>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TrainThread {
    pub fn new(id: usize, range: Range<usize>, data: TrainData) -> Self {
        TrainThread {
            id,
            worker: Some(TrainWorker::new(id, range, data)),
            handle: None,
        }
    }

    pub fn launch(&mut self) -> io::Result<()> {
        if let Some(worker) = self.worker.take() {
            let handle = thread::Builder::new()
                .name(format!("train-{}", self.id))
                .spawn(move || worker.run())?;
            self.handle = Some(handle);
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    pub fn join(&mut self) -> thread::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_round_trips_and_accumulates() {
        let r = Real::default();
        assert_eq!(r.get(), 0.0);
        r.set(1.5);
        r.add(-0.25);
        assert_eq!(r.get(), 1.25);
    }

    #[test]
    fn learning_rate_is_non_increasing() {
        let settings = Settings {
            alpha: 0.05,
            ..Settings::default()
        };
        let target = 1001;
        let mut prev = f32::INFINITY;
        for processed in 0..=target {
            let rate = learning_rate(&settings, processed, target);
            assert!(rate <= prev);
            prev = rate;
        }
    }

    #[test]
    fn learning_rate_never_drops_below_the_floor() {
        let settings = Settings {
            alpha: 0.05,
            min_alpha_ratio: 1e-4,
            ..Settings::default()
        };
        let floor = settings.alpha * settings.min_alpha_ratio;
        // even far past the nominal word target
        for processed in [0, 500, 1000, 5000, 1_000_000] {
            let rate = learning_rate(&settings, processed, 1001);
            assert!(rate >= floor - f32::EPSILON);
        }
    }
}
