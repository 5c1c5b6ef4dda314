//! Normal distribution utilities.

use nd_core::{Error, Result};

/// Natural log of `sqrt(2π)`.
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

fn validate_sigma(sigma: f64) -> Result<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Validation(format!("sigma must be finite and > 0, got {}", sigma)));
    }
    Ok(())
}

/// Log-PDF of a Normal distribution `N(mu, sigma)` at `x`.
///
/// `log p(x) = -0.5 * ((x-mu)/sigma)^2 - ln(sigma) - ln(sqrt(2π))`
pub fn logpdf(x: f64, mu: f64, sigma: f64) -> Result<f64> {
    validate_sigma(sigma)?;
    let z = (x - mu) / sigma;
    Ok(-0.5 * z * z - sigma.ln() - LN_SQRT_2PI)
}

/// Partial derivatives of [`logpdf`] as `(∂/∂mu, ∂/∂sigma)`.
pub fn dlogpdf(x: f64, mu: f64, sigma: f64) -> Result<(f64, f64)> {
    validate_sigma(sigma)?;
    let r = x - mu;
    let s2 = sigma * sigma;
    Ok((r / s2, r * r / (s2 * sigma) - 1.0 / sigma))
}
