//! Multinomial distribution utilities (logit parameterisation).
//!
//! The number of trials is inferred per observation as the sum of the counts.

use crate::math::{log_softmax, softmax};
use nd_core::{Error, Result};
use statrs::function::gamma::ln_gamma;

fn validate(counts: &[f64], logits: &[f64]) -> Result<()> {
    if counts.len() != logits.len() {
        return Err(Error::shape("multinomial logits", counts.len(), logits.len()));
    }
    if counts.is_empty() {
        return Err(Error::Validation("multinomial needs at least one category".to_string()));
    }
    if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return Err(Error::Validation("counts must be finite and >= 0".to_string()));
    }
    if logits.iter().any(|z| !z.is_finite()) {
        return Err(Error::Validation("logits must be finite".to_string()));
    }
    Ok(())
}

/// Log-PMF of `Multinomial(Σ counts, softmax(logits))` at `counts`.
///
/// `lnΓ(n+1) - Σ lnΓ(y_j+1) + Σ y_j · log_softmax(z)_j`
pub fn logpmf_logits(counts: &[f64], logits: &[f64]) -> Result<f64> {
    validate(counts, logits)?;
    let n: f64 = counts.iter().sum();
    let log_p = log_softmax(logits);
    let mut lp = ln_gamma(n + 1.0);
    for (&y, &l) in counts.iter().zip(&log_p) {
        lp -= ln_gamma(y + 1.0);
        // 0 · log(0) contributes nothing
        if y != 0.0 {
            lp += y * l;
        }
    }
    Ok(lp)
}

/// Gradient of [`logpmf_logits`] w.r.t. the logits: `y_j - n·p_j`.
pub fn dlogpmf_dlogits(counts: &[f64], logits: &[f64]) -> Result<Vec<f64>> {
    validate(counts, logits)?;
    let n: f64 = counts.iter().sum();
    Ok(counts.iter().zip(softmax(logits)).map(|(&y, p)| y - n * p).collect())
}
