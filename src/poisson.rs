#[cfg(test)]
use crate::factorial::Factorial;

/// Probability of exactly `k` goals from a Poisson process with mean `lambda`, evaluated directly
/// from the mass function. Cross-checks [series] in tests.
#[cfg(test)]
pub(crate) fn univariate(k: u8, lambda: f64, factorial: &impl Factorial) -> f64 {
    lambda.powi(k as i32) * f64::exp(-lambda) / factorial.get(k) as f64
}

/// Probabilities of `0..=max_k` goals, built by the recurrence `p(k) = p(k - 1) * lambda / k`.
/// A non-positive rate puts all mass on zero goals.
pub fn series(lambda: f64, max_k: u8) -> Vec<f64> {
    let mut probs = Vec::with_capacity(max_k as usize + 1);
    let mut prob = f64::exp(-f64::max(0.0, lambda));
    probs.push(prob);
    for k in 1..=max_k {
        prob *= f64::max(0.0, lambda) / k as f64;
        probs.push(prob);
    }
    probs
}
