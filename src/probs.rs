//! Utilities for working with probabilities and price columns.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn normalise(&mut self, target: f64) -> f64;
    fn scale(&mut self, factor: f64);
    fn mean(&self) -> Option<f64>;
    fn std_dev(&self) -> Option<f64>;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    /// Scales the elements so that they sum to `target`, returning the sum prior to scaling.
    fn normalise(&mut self, target: f64) -> f64 {
        let sum = self.sum();
        self.scale(target / sum);
        sum
    }

    fn scale(&mut self, factor: f64) {
        for element in self {
            *element *= factor;
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum() / self.len() as f64)
        }
    }

    /// Population standard deviation.
    fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self
            .iter()
            .map(|element| (element - mean).powi(2))
            .sum::<f64>()
            / self.len() as f64;
        Some(variance.sqrt())
    }
}
