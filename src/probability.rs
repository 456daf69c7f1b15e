use crate::error::SimError;
use crate::types::SummationBound;

/// Binomial coefficient C(n, k) in floating point.
///
/// Uses the multiplicative form so that intermediate values stay near the
/// result instead of going through n!, which overflows f64 past n = 170.
pub fn n_choose_k(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0_f64;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result.round()
}

/// Probability of exactly `i` successes in `n` Bernoulli(`p`) trials
pub fn binomial_pmf(n: usize, p: f64, i: usize) -> f64 {
    if i > n {
        return 0.0;
    }
    // powi(0) is 1.0 even for a 0.0 base, which keeps p = 0 and p = 1 exact
    n_choose_k(n, i) * p.powi(i as i32) * (1.0 - p).powi((n - i) as i32)
}

/// Probability of at least `k` successes in `n` Bernoulli(`p`) trials.
///
/// `bound` selects whether the all-successes term `i = n` is part of the sum.
/// [`SummationBound::Exclusive`] leaves it out and so undercounts by `p^n`.
pub fn success_probability(
    n: usize,
    p: f64,
    k: usize,
    bound: SummationBound,
) -> Result<f64, SimError> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(SimError::ProbabilityOutOfRange(p));
    }
    if k > n {
        return Err(SimError::MinSuccessesExceedTrials { n, k });
    }

    let upper = match bound {
        SummationBound::Inclusive => n + 1,
        SummationBound::Exclusive => n,
    };

    Ok((k..upper).map(|i| binomial_pmf(n, p, i)).sum::<f64>())
}
