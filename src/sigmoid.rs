/// Precomputed logistic-function table over a clamped input range.
///
/// `value(x)` approximates `exp(x) / (exp(x) + 1)` for `x` in
/// `[-max_exp, max_exp]`. Callers are expected to handle inputs outside
/// that range themselves (skip the update, or clamp to 0/1).
#[derive(Debug)]
pub struct SigmoidTable {
    values: Vec<f32>,
    max_exp: f32,
}

impl SigmoidTable {
    pub fn new(size: usize, max_exp: f32) -> Self {
        let values = (0..size)
            .map(|i| {
                let e = ((i as f32 / size as f32 * 2.0 - 1.0) * max_exp).exp();
                e / (e + 1.0)
            })
            .collect();
        SigmoidTable { values, max_exp }
    }

    pub fn max_exp(&self) -> f32 {
        self.max_exp
    }

    pub fn value(&self, x: f32) -> f32 {
        let i = ((x + self.max_exp) * (self.values.len() as f32 / self.max_exp / 2.0)) as usize;
        self.values[i.min(self.values.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_logistic_function() {
        let table = SigmoidTable::new(1000, 6.0);
        for x in [-5.5f32, -2.0, -0.5, 0.0, 0.5, 2.0, 5.5] {
            let exact = 1.0 / (1.0 + (-x).exp());
            assert!((table.value(x) - exact).abs() < 0.01, "x = {x}");
        }
    }

    #[test]
    fn saturates_at_the_clamp_boundaries() {
        let table = SigmoidTable::new(1000, 6.0);
        assert!(table.value(5.999) > 0.99);
        assert!(table.value(-6.0) < 0.01);
    }
}
