use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A tokenized training corpus: the vocabulary, per-word frequencies,
/// and the documents re-encoded as word ids.
///
/// Immutable for the duration of a training run; the orchestrator and
/// every worker share it read-only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Corpus {
    /// The vocabulary, ordered by descending frequency.
    pub words: Vec<String>,
    /// `frequency[w]` is the number of occurrences of word `w`.
    pub frequency: Vec<u64>,
    /// Total number of trainable word occurrences.
    pub train_words: u64,
    /// Documents as ordered sequences of word ids.
    pub texts: Vec<Vec<u32>>,
}

impl Corpus {
    pub fn vocab_size(&self) -> usize {
        self.words.len()
    }
}

/// Builds a [`Corpus`] from tokenized documents.
///
/// Counts token frequencies across every document fed in, discards
/// words that appear fewer than `min_count` times, assigns ids in
/// descending-frequency order, and re-encodes the documents (dropped
/// words simply vanish from the encoded texts).
pub struct CorpusBuilder {
    min_count: u64,
    counts: HashMap<String, u64>,
    documents: Vec<Vec<String>>,
}

impl CorpusBuilder {
    pub fn new(min_count: u64) -> Self {
        CorpusBuilder {
            min_count,
            counts: HashMap::new(),
            documents: Vec::new(),
        }
    }

    pub fn add_document<'a>(&mut self, tokens: impl IntoIterator<Item = &'a str>) {
        let tokens: Vec<String> = tokens.into_iter().map(str::to_string).collect();
        for token in &tokens {
            *self.counts.entry(token.clone()).or_insert(0) += 1;
        }
        self.documents.push(tokens);
    }

    pub fn build(self) -> Corpus {
        let mut entries: Vec<(String, u64)> = self
            .counts
            .into_iter()
            .filter(|&(_, n)| n >= self.min_count)
            .collect();
        // Descending frequency, ties broken by the word itself so that
        // id assignment does not depend on hash order.
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let ids: HashMap<&str, u32> = entries
            .iter()
            .enumerate()
            .map(|(i, (word, _))| (word.as_str(), i as u32))
            .collect();

        let texts: Vec<Vec<u32>> = self
            .documents
            .iter()
            .map(|doc| {
                doc.iter()
                    .filter_map(|token| ids.get(token.as_str()).copied())
                    .collect()
            })
            .collect();

        let frequency: Vec<u64> = entries.iter().map(|&(_, n)| n).collect();
        let train_words = frequency.iter().sum();
        let words = entries.into_iter().map(|(word, _)| word).collect();

        Corpus {
            words,
            frequency,
            train_words,
            texts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_count_discards_rare_words() {
        let mut builder = CorpusBuilder::new(2);
        builder.add_document("the cat sat on the mat".split_whitespace());
        builder.add_document("the cat".split_whitespace());
        let corpus = builder.build();

        assert_eq!(corpus.words, vec!["the".to_string(), "cat".to_string()]);
        assert_eq!(corpus.frequency, vec![3, 2]);
        assert_eq!(corpus.train_words, 5);
        // dropped words vanish from the encoded documents
        assert_eq!(corpus.texts, vec![vec![0, 1, 0], vec![0, 1]]);
    }

    #[test]
    fn ids_are_assigned_by_descending_frequency() {
        let mut builder = CorpusBuilder::new(1);
        builder.add_document("b a a c b a".split_whitespace());
        let corpus = builder.build();

        assert_eq!(corpus.words, vec!["a", "b", "c"]);
        assert_eq!(corpus.frequency, vec![3, 2, 1]);
        assert_eq!(corpus.texts, vec![vec![1, 0, 0, 2, 1, 0]]);
    }
}
