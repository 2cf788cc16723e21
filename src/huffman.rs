use std::cmp::Reverse;

/// Binary Huffman tree over word frequencies, used by hierarchical
/// softmax. Frequent words get short unique binary codes.
///
/// For each word the tree records its bit code (root to leaf) and the
/// internal nodes visited along the way (root first, rebased to
/// `0..vocab_size-1` so they index rows of the output matrix). Both
/// vectors have the same length, the word's code length.
#[derive(Debug)]
pub struct HuffmanTree {
    codes: Vec<Vec<u8>>,
    points: Vec<Vec<u32>>,
}

impl HuffmanTree {
    pub fn new(frequency: &[u64]) -> Self {
        let vocab_size = frequency.len();
        if vocab_size < 2 {
            // A 1-word vocabulary has no internal nodes and an empty path.
            return HuffmanTree {
                codes: vec![Vec::new(); vocab_size],
                points: vec![Vec::new(); vocab_size],
            };
        }

        // The two-pointer merge below requires leaves in descending
        // frequency order; `order[slot]` maps tree slots back to word ids.
        let mut order: Vec<usize> = (0..vocab_size).collect();
        order.sort_by_key(|&w| Reverse(frequency[w]));

        // Nodes 0..vocab_size are leaves, the rest are internal nodes in
        // creation order; the last one is the root. Unbuilt slots hold
        // u64::MAX so they never win a smallest-node comparison.
        let mut count = vec![u64::MAX; vocab_size * 2 - 1];
        for (slot, &w) in order.iter().enumerate() {
            count[slot] = frequency[w];
        }
        let mut binary = vec![0u8; vocab_size * 2 - 1];
        let mut parent = vec![0usize; vocab_size * 2 - 1];

        // Repeatedly merge the two smallest unmerged nodes. pos1 scans
        // leaves right to left (rarest first); pos2 scans internal nodes
        // in creation order.
        let mut pos1 = vocab_size;
        let mut pos2 = vocab_size;
        for a in 0..vocab_size - 1 {
            let min1 = if pos1 > 0 && count[pos1 - 1] < count[pos2] {
                pos1 -= 1;
                pos1
            } else {
                pos2 += 1;
                pos2 - 1
            };
            let min2 = if pos1 > 0 && count[pos1 - 1] < count[pos2] {
                pos1 -= 1;
                pos1
            } else {
                pos2 += 1;
                pos2 - 1
            };
            count[vocab_size + a] = count[min1] + count[min2];
            parent[min1] = vocab_size + a;
            parent[min2] = vocab_size + a;
            binary[min2] = 1;
        }

        // Walk each leaf up to the root to read off its code and path.
        let root = vocab_size * 2 - 2;
        let mut codes = vec![Vec::new(); vocab_size];
        let mut points = vec![Vec::new(); vocab_size];
        for (slot, &w) in order.iter().enumerate() {
            let mut branches = Vec::new();
            let mut path = Vec::new();
            let mut b = slot;
            while b != root {
                branches.push(binary[b]);
                path.push(b);
                b = parent[b];
            }

            codes[w] = branches.iter().rev().copied().collect();
            let mut point: Vec<u32> = Vec::with_capacity(path.len());
            point.push((vocab_size - 2) as u32); // the root, rebased
            point.extend(
                path.iter()
                    .rev()
                    .filter(|&&p| p >= vocab_size)
                    .map(|&p| (p - vocab_size) as u32),
            );
            points[w] = point;
        }

        HuffmanTree { codes, points }
    }

    /// The word's bit code, from the root down.
    pub fn code(&self, word: u32) -> &[u8] {
        &self.codes[word as usize]
    }

    /// Output-matrix rows of the internal nodes on the word's root path,
    /// root first. Same length as [`HuffmanTree::code`].
    pub fn point(&self, word: u32) -> &[u32] {
        &self.points[word as usize]
    }

    /// Number of internal nodes: `vocab_size - 1` for two or more leaves.
    pub fn internal_nodes(&self) -> usize {
        self.codes.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prefix(a: &[u8], b: &[u8]) -> bool {
        a.len() <= b.len() && a == &b[..a.len()]
    }

    #[test]
    fn counts_internal_nodes() {
        for v in 2..20u64 {
            let frequency: Vec<u64> = (1..=v).collect();
            let tree = HuffmanTree::new(&frequency);
            assert_eq!(tree.internal_nodes(), v as usize - 1);
        }
    }

    #[test]
    fn codes_are_prefix_free() {
        let frequency = [50, 31, 17, 17, 9, 5, 2, 2, 1];
        let tree = HuffmanTree::new(&frequency);
        for a in 0..frequency.len() as u32 {
            for b in 0..frequency.len() as u32 {
                if a != b {
                    assert!(!is_prefix(tree.code(a), tree.code(b)), "{a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn kraft_inequality_holds() {
        let frequency = [100, 40, 12, 7, 7, 3, 1];
        let tree = HuffmanTree::new(&frequency);
        let sum: f64 = (0..frequency.len() as u32)
            .map(|w| 0.5f64.powi(tree.code(w).len() as i32))
            .sum();
        assert!(sum <= 1.0 + 1e-9);
    }

    #[test]
    fn most_frequent_word_gets_the_shortest_code() {
        let frequency = [5, 3, 2];
        let tree = HuffmanTree::new(&frequency);
        assert_eq!(tree.code(0).len(), 1);
        assert!(tree.code(1).len() >= tree.code(0).len());
        assert!(tree.code(2).len() >= tree.code(0).len());
    }

    #[test]
    fn paths_index_valid_output_rows() {
        let frequency = [9, 9, 4, 4, 2, 1, 1];
        let tree = HuffmanTree::new(&frequency);
        for w in 0..frequency.len() as u32 {
            assert_eq!(tree.code(w).len(), tree.point(w).len());
            for &node in tree.point(w) {
                assert!((node as usize) < frequency.len() - 1);
            }
            // the walk starts at the root
            assert_eq!(tree.point(w)[0], frequency.len() as u32 - 2);
        }
    }

    #[test]
    fn single_word_vocabulary_has_an_empty_path() {
        let tree = HuffmanTree::new(&[7]);
        assert_eq!(tree.internal_nodes(), 0);
        assert!(tree.code(0).is_empty());
        assert!(tree.point(0).is_empty());
    }
}
