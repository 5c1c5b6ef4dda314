//! Binomial distribution utilities (logit parameterisation, real-valued counts).
//!
//! Counts are `f64` because observed successes are reconstructed as
//! `trials × proportion` and need not be integral.

use crate::math::{log_sigmoid, sigmoid};
use nd_core::{Error, Result};
use statrs::function::gamma::ln_gamma;

/// Slack allowed for `k > n` caused by floating-point reconstruction of counts.
const COUNT_SLACK: f64 = 1e-9;

/// `ln(n choose k)` through the gamma function, valid for real `0 <= k <= n`.
pub fn ln_choose(n: f64, k: f64) -> f64 {
    ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
}

fn validate(k: f64, n: f64, logit: f64) -> Result<()> {
    if !k.is_finite() || k < 0.0 {
        return Err(Error::Validation(format!("k must be finite and >= 0, got {}", k)));
    }
    if !n.is_finite() || k - n > COUNT_SLACK {
        return Err(Error::Validation(format!("k must be <= n, got k={} n={}", k, n)));
    }
    if !logit.is_finite() {
        return Err(Error::Validation(format!("logit must be finite, got {}", logit)));
    }
    Ok(())
}

/// Log-PMF of `Binom(n, sigmoid(logit))` at `k`.
pub fn logpmf_logit(k: f64, n: f64, logit: f64) -> Result<f64> {
    validate(k, n, logit)?;
    Ok(ln_choose(n, k) + k * log_sigmoid(logit) + (n - k) * log_sigmoid(-logit))
}

/// `∂/∂logit` of [`logpmf_logit`]: `k - n·sigmoid(logit)`.
pub fn dlogpmf_dlogit(k: f64, n: f64, logit: f64) -> Result<f64> {
    validate(k, n, logit)?;
    Ok(k - n * sigmoid(logit))
}
