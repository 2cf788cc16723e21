use std::cmp::Reverse;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::ops::Index;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::trainer::TrainedModel;
use crate::{dot, normalize};

/// A trained model with its vocabulary, suitable for saving.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    pub words: Vec<String>,
    pub frequency: Vec<u64>,
    /// Embedding vector length.
    pub size: usize,
    /// Learned word vectors, `words.len() × size`, row-major by word id.
    pub embeddings: Vec<f32>,
    /// Back-propagation weights, same shape.
    pub weights: Vec<f32>,
}

impl Model {
    pub fn new(corpus: &Corpus, trained: TrainedModel) -> Self {
        Model {
            words: corpus.words.clone(),
            frequency: corpus.frequency.clone(),
            size: trained.size,
            embeddings: trained.embeddings,
            weights: trained.weights,
        }
    }

    /// Full model in bincode format, including the output weights.
    pub fn save(&self, writer: impl Write) -> Result<()> {
        bincode::serialize_into(writer, self).context("error writing model")
    }

    pub fn load(reader: impl Read) -> Result<Self> {
        bincode::deserialize_from(reader).context("error reading model")
    }

    /// Word vectors in the classic format: a `"<vocab> <size>"` header
    /// line, then one row per word. Text rows are space-separated
    /// decimals; binary rows are raw little-endian f32s.
    pub fn save_vectors(&self, mut writer: impl Write, binary: bool) -> Result<()> {
        writeln!(writer, "{} {}", self.words.len(), self.size)
            .context("error writing vectors")?;
        for (w, word) in self.words.iter().enumerate() {
            write!(writer, "{word} ").context("error writing vectors")?;
            let row = &self.embeddings[w * self.size..][..self.size];
            if binary {
                writer
                    .write_all(bytemuck::cast_slice::<f32, u8>(row))
                    .context("error writing vectors")?;
                writeln!(writer).context("error writing vectors")?;
            } else {
                for v in row {
                    write!(writer, "{v} ").context("error writing vectors")?;
                }
                writeln!(writer).context("error writing vectors")?;
            }
        }
        Ok(())
    }
}

/// Normalized word vectors loaded from the binary vector format, for
/// similarity queries.
pub struct Vectors {
    /// Embedding vector length (number of dimensions).
    size: usize,

    /// The vocabulary.
    vocab: Vec<String>,

    /// `embeddings[k * size..(k+1) * size]` is the unit-length embedding
    /// for word `k`.
    embeddings: Vec<f32>,
}

impl Index<usize> for Vectors {
    type Output = [f32];

    fn index(&self, i: usize) -> &[f32] {
        &self.embeddings[i * self.size..][..self.size]
    }
}

impl Vectors {
    pub fn load(file_name: &Path) -> Result<Self> {
        let f = BufReader::new(File::open(file_name).context("error opening input file")?);
        Vectors::read(f)
    }

    /// Reads the binary vector format and normalizes every row.
    pub fn read(mut f: impl BufRead) -> Result<Self> {
        let mut line = String::new();
        f.read_line(&mut line).context("error reading input file")?;
        let mut fields = line.split_whitespace();
        let num_words: usize = fields
            .next()
            .ok_or_else(|| anyhow!("invalid input file"))?
            .parse()
            .context("invalid input file")?;
        let size: usize = fields
            .next()
            .ok_or_else(|| anyhow!("invalid input file"))?
            .parse()
            .context("invalid input file")?;

        let mut vocab: Vec<String> = vec![];
        let mut m = vec![0.0; num_words * size];
        for b in 0..num_words {
            let mut vocab_word = Vec::<u8>::new();
            let count = f
                .read_until(b' ', &mut vocab_word)
                .context("error reading input file")?;
            if count == 0 {
                break;
            }
            if vocab_word.last() == Some(&b' ') {
                vocab_word.pop();
            }
            vocab_word.retain(|c| *c != b'\n');
            vocab.push(String::from_utf8(vocab_word).context("invalid word in input file")?);

            let row = &mut m[b * size..][..size];
            f.read_exact(bytemuck::cast_slice_mut::<f32, u8>(row))
                .context("error reading input file")?;
            normalize(row);
        }

        Ok(Vectors {
            size,
            vocab,
            embeddings: m,
        })
    }

    pub fn num_words(&self) -> usize {
        self.vocab.len()
    }

    /// Returns the vector size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the index for a word as string. Exact match only, case-sensitive.
    pub fn lookup_word(&self, word: &str) -> Option<usize> {
        self.vocab.iter().position(|v| v == word)
    }

    /// Get the word for a word-index. Panics if `word` is out of range.
    pub fn word(&self, word: usize) -> &str {
        &self.vocab[word]
    }

    /// The `n` words nearest to `target` by cosine distance, best first,
    /// skipping the word ids in `exclude`. `target` should be normalized.
    pub fn nearest(&self, target: &[f32], exclude: &[usize], n: usize) -> Vec<(usize, f32)> {
        let mut best: Vec<(usize, f32)> = (0..self.num_words())
            .filter(|i| !exclude.contains(i))
            .map(|i| (i, dot(target, &self[i])))
            .collect();
        best.sort_by_key(|&(_, d)| Reverse(OrderedFloat(d)));
        best.truncate(n);
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_model() -> Model {
        Model {
            words: vec!["north".to_string(), "south".to_string()],
            frequency: vec![3, 2],
            size: 2,
            embeddings: vec![0.0, 1.0, 0.0, -1.0],
            weights: vec![0.0; 4],
        }
    }

    #[test]
    fn model_survives_bincode() {
        let model = sample_model();
        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();
        let loaded = Model::load(Cursor::new(buf)).unwrap();
        assert_eq!(loaded.words, model.words);
        assert_eq!(loaded.embeddings, model.embeddings);
    }

    #[test]
    fn binary_vectors_round_trip_through_the_reader() {
        let model = sample_model();
        let mut buf = Vec::new();
        model.save_vectors(&mut buf, true).unwrap();

        let vectors = Vectors::read(Cursor::new(buf)).unwrap();
        assert_eq!(vectors.num_words(), 2);
        assert_eq!(vectors.size(), 2);
        assert_eq!(vectors.lookup_word("south"), Some(1));
        assert_eq!(vectors.word(0), "north");
        // rows come back normalized
        assert_eq!(&vectors[0], &[0.0, 1.0]);
        assert_eq!(&vectors[1], &[0.0, -1.0]);
    }

    #[test]
    fn nearest_ranks_by_cosine_distance() {
        let vectors = Vectors {
            size: 2,
            vocab: vec!["a".into(), "b".into(), "c".into()],
            embeddings: vec![1.0, 0.0, 0.8, 0.6, -1.0, 0.0],
        };
        let best = vectors.nearest(&[1.0, 0.0], &[0], 2);
        assert_eq!(best[0].0, 1);
        assert_eq!(best[1].0, 2);
    }

    #[test]
    fn text_vectors_have_a_header_and_one_row_per_word() {
        let model = sample_model();
        let mut buf = Vec::new();
        model.save_vectors(&mut buf, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("2 2"));
        assert_eq!(lines.next(), Some("north 0 1 "));
        assert_eq!(lines.next(), Some("south 0 -1 "));
    }
}
