use rand::Rng;

/// Frequency-based subsampling of over-represented words.
///
/// A word with corpus frequency `f` survives with probability
/// `(sqrt(f/k) + 1) * k/f` where `k = sample * train_words`, clamped to
/// `[0, 1]`. Words at or below the threshold count are always kept.
/// Each occurrence gets an independent Bernoulli decision from the
/// calling worker's own generator.
#[derive(Debug)]
pub struct DownSampling {
    threshold_count: f32,
}

impl DownSampling {
    pub fn new(sample: f32, train_words: u64) -> Self {
        DownSampling {
            threshold_count: sample * train_words as f32,
        }
    }

    pub fn keep_probability(&self, frequency: u64) -> f32 {
        let f = frequency as f32;
        let k = self.threshold_count;
        if k <= 0.0 || f <= k {
            return 1.0;
        }
        (((f / k).sqrt() + 1.0) * k / f).clamp(0.0, 1.0)
    }

    pub fn keep<R: Rng>(&self, frequency: u64, rng: &mut R) -> bool {
        let p = self.keep_probability(frequency);
        p >= 1.0 || rng.gen::<f32>() < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn rare_words_are_always_kept() {
        let ds = DownSampling::new(1e-3, 10_000); // threshold count = 10
        for f in 1..=10 {
            assert_eq!(ds.keep_probability(f), 1.0);
        }
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(ds.keep(10, &mut rng));
        }
    }

    #[test]
    fn keep_probability_decreases_above_the_threshold() {
        let ds = DownSampling::new(1e-3, 10_000);
        let mut prev = 1.0;
        for f in [11, 20, 100, 1000, 10_000] {
            let p = ds.keep_probability(f);
            assert!(p < prev, "f = {f}");
            assert!(p > 0.0);
            prev = p;
        }
    }

    #[test]
    fn zero_threshold_disables_nothing() {
        let ds = DownSampling::new(0.0, 10_000);
        assert_eq!(ds.keep_probability(1_000_000), 1.0);
    }
}
