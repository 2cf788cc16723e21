use rand::Rng;

/// Unigram sampling table for negative sampling.
///
/// Each word occupies a contiguous slice of the table proportional to
/// `frequency^0.75`, so drawing a uniformly random table index yields a
/// word with the smoothed unigram probability in O(1). Words whose
/// share rounds down to zero table entries are never drawn; that is an
/// accepted approximation artifact.
#[derive(Debug)]
pub struct NegativeSamplingDistribution {
    table: Vec<u32>,
}

const POWER: f64 = 0.75;

impl NegativeSamplingDistribution {
    pub fn new(frequency: &[u64], table_size: usize) -> Self {
        debug_assert!(!frequency.is_empty());
        let total: f64 = frequency.iter().map(|&f| (f as f64).powf(POWER)).sum();

        let mut table = Vec::with_capacity(table_size);
        let mut word = 0usize;
        let mut cumulative = (frequency[0] as f64).powf(POWER) / total;
        for a in 0..table_size {
            table.push(word as u32);
            if a as f64 / table_size as f64 > cumulative && word + 1 < frequency.len() {
                word += 1;
                cumulative += (frequency[word] as f64).powf(POWER) / total;
            }
        }

        NegativeSamplingDistribution { table }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Draw one word id in O(1).
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u32 {
        self.table[rng.gen_range(0..self.table.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn table_has_exactly_the_requested_size() {
        let dist = NegativeSamplingDistribution::new(&[10, 5, 1], 1000);
        assert_eq!(dist.len(), 1000);
    }

    #[test]
    fn entries_are_valid_word_ids() {
        let frequency = [7, 7, 3, 2, 1];
        let dist = NegativeSamplingDistribution::new(&frequency, 500);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!((dist.sample(&mut rng) as usize) < frequency.len());
        }
    }

    #[test]
    fn shares_grow_with_frequency() {
        let frequency = [1000, 100, 10, 1];
        let dist = NegativeSamplingDistribution::new(&frequency, 10_000);
        let mut shares = [0usize; 4];
        for &w in &dist.table {
            shares[w as usize] += 1;
        }
        assert!(shares[0] > shares[1]);
        assert!(shares[1] > shares[2]);
        assert!(shares[2] > shares[3]);
    }
}
