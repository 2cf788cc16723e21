//! Train dense word-embedding vectors from a tokenized corpus.
//!
//! This crate implements the word2vec family of training algorithms:
//! the CBOW and Skip-Gram objectives, each approximated by either
//! Hierarchical Softmax or Negative Sampling. Training runs one OS
//! thread per contiguous slice of the corpus. All threads share the
//! two embedding matrices and update them in place with no locks
//! (Hogwild-style): concurrent writes to the same row may interleave
//! arbitrarily, and the occasional lost update is tolerated as
//! statistical noise. As a consequence, runs with more than one
//! thread are not bit-identical; runs with a single thread and a
//! fixed seed are fully deterministic.
//!
//! The engine consumes an already-built [`Corpus`] (word ids, per-word
//! frequencies, documents) and a [`Settings`] value, and produces a
//! [`TrainedModel`] holding the two flat `vocabulary × size` matrices.
//! Tokenization, vocabulary cutoffs, and file formats live outside the
//! engine, in [`CorpusBuilder`] and [`Model`].

mod corpus;
mod downsampling;
mod huffman;
mod model;
mod negative;
mod settings;
mod sigmoid;
mod trainer;
mod worker;

pub use corpus::{Corpus, CorpusBuilder};
pub use downsampling::DownSampling;
pub use huffman::HuffmanTree;
pub use model::{Model, Vectors};
pub use negative::NegativeSamplingDistribution;
pub use settings::{Approximation, Objective, Settings};
pub use sigmoid::SigmoidTable;
pub use trainer::{train, train_with_progress, TrainError, TrainedModel};
pub use worker::{Real, TrainData, TrainThread, TrainWorker};

pub fn norm(v: &[f32]) -> f32 {
    v.iter().copied().map(|e| e * e).sum::<f32>().sqrt()
}

pub fn normalize(v: &mut [f32]) {
    let len = norm(v);
    for e in v {
        *e /= len;
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(&a, &b)| a * b).sum()
}
