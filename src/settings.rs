use serde::{Deserialize, Serialize};

/// What the model is trained to predict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Continuous bag-of-words: predict a word from the average of its
    /// context words' vectors.
    Cbow,
    /// Predict each context word from the target word's vector.
    SkipGram,
}

/// How the full-vocabulary softmax is approximated.
///
/// Exactly one approximation is active per run; the orchestrator builds
/// only the lookup structure the chosen variant needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Approximation {
    /// Binary-tree traversal costing O(log V) per update.
    HierarchicalSoftmax,
    /// Contrast the true word against `samples` randomly drawn words.
    /// `samples == 0` degenerates to the positive-only update.
    NegativeSampling { samples: u32 },
}

/// Training hyperparameters, consumed by [`crate::train`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Embedding vector length (number of dimensions).
    pub size: usize,
    /// Context window radius. Each position draws an effective radius
    /// uniformly in `1..=window`.
    pub window: usize,
    /// Starting learning rate.
    pub alpha: f32,
    /// Learning-rate floor, as a fraction of `alpha`.
    pub min_alpha_ratio: f32,
    /// Number of passes over the corpus. The pass count is global:
    /// every thread contributes to one shared progress fraction.
    pub iterations: usize,
    /// Number of training threads.
    pub threads: usize,
    pub objective: Objective,
    pub approximation: Approximation,
    /// Subsampling threshold for frequent words; 0 disables subsampling.
    pub sample: f32,
    /// Resolution of the precomputed sigmoid table.
    pub exp_table_size: usize,
    /// Sigmoid inputs are clamped to `[-max_exp, max_exp]`.
    pub max_exp: f32,
    /// Size of the negative-sampling table (NS only).
    pub ns_table_size: usize,
    pub seed: u64,
    /// Log an iteration report while training runs.
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            size: 100,
            window: 5,
            alpha: 0.05,
            min_alpha_ratio: 1e-4,
            iterations: 5,
            threads: 12,
            objective: Objective::Cbow,
            approximation: Approximation::NegativeSampling { samples: 5 },
            sample: 1e-3,
            exp_table_size: 1000,
            max_exp: 6.0,
            ns_table_size: 100_000_000,
            seed: 1,
            verbose: false,
        }
    }
}
