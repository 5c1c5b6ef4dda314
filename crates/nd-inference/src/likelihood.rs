//! Observation models: per-row log-probabilities of Y given the model output.

use nalgebra::DMatrix;
use nd_core::{Device, Error, Result};
use nd_prob::{binomial, math, multinomial, normal};
use serde::{Deserialize, Serialize};

/// Scale offset added after softplus for the normal likelihood.
pub const DEFAULT_NORMAL_EPS: f64 = 1e-3;

/// Observation model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum Likelihood {
    /// Successes in `Y[:, 0]` out of per-row trial counts, logit link.
    Binomial,
    /// Category counts, softmax link; trials per row are the row sums.
    Multinomial,
    /// Continuous responses with a single learned scale `softplus(s) + eps`.
    Normal {
        /// Lower bound added to the softplus scale
        eps: f64,
    },
}

impl Likelihood {
    /// Normal likelihood with the default `eps`.
    pub fn normal() -> Self {
        Likelihood::Normal { eps: DEFAULT_NORMAL_EPS }
    }

    /// Family name.
    pub fn name(&self) -> &'static str {
        match self {
            Likelihood::Binomial => "binomial",
            Likelihood::Multinomial => "multinomial",
            Likelihood::Normal { .. } => "normal",
        }
    }

    /// Whether the model carries a learned scale parameter.
    pub fn needs_scale(&self) -> bool {
        matches!(self, Likelihood::Normal { .. })
    }

    /// Log-probabilities and estimates for model output `output`.
    pub fn evaluate(
        &self,
        output: &DMatrix<f64>,
        y: &DMatrix<f64>,
        scale: Option<f64>,
        total_counts: Option<&[u64]>,
        device: Device,
    ) -> Result<Evaluation> {
        self.evaluate_with_gradient(output, y, scale, total_counts, device).map(|(ev, _)| ev)
    }

    /// Like [`Likelihood::evaluate`], also returning `∂(Σ log p)/∂output` and `∂(Σ log p)/∂scale`.
    pub fn evaluate_with_gradient(
        &self,
        output: &DMatrix<f64>,
        y: &DMatrix<f64>,
        scale: Option<f64>,
        total_counts: Option<&[u64]>,
        device: Device,
    ) -> Result<(Evaluation, LikelihoodGradient)> {
        let n = y.nrows();
        if output.nrows() != n {
            return Err(Error::shape("model output rows", n, output.nrows()));
        }

        let rows = match *self {
            Likelihood::Binomial => {
                if output.ncols() != 1 {
                    return Err(Error::Precondition(format!(
                        "binomial likelihood needs a single output column, got {}",
                        output.ncols()
                    )));
                }
                if y.ncols() == 0 {
                    return Err(Error::Validation("binomial response has no columns".into()));
                }
                let totals = total_counts.ok_or_else(|| {
                    Error::Precondition("binomial likelihood requires total counts".into())
                })?;
                if totals.len() != n {
                    return Err(Error::shape("total counts", n, totals.len()));
                }
                device.map_rows(n, |i| binomial_row(y[(i, 0)], totals[i] as f64, output[(i, 0)]))
            }
            Likelihood::Multinomial => {
                if output.ncols() != y.ncols() {
                    return Err(Error::shape("multinomial logits", y.ncols(), output.ncols()));
                }
                device.map_rows(n, |i| {
                    let counts: Vec<f64> = y.row(i).iter().copied().collect();
                    let logits: Vec<f64> = output.row(i).iter().copied().collect();
                    multinomial_row(&counts, &logits)
                })
            }
            Likelihood::Normal { eps } => {
                if total_counts.is_some() {
                    return Err(Error::Precondition(
                        "normal likelihood does not take total counts".into(),
                    ));
                }
                let s = scale.ok_or_else(|| {
                    Error::Precondition("normal likelihood requires a scale parameter".into())
                })?;
                if output.shape() != y.shape() {
                    return Err(Error::shape(
                        "normal means",
                        format!("{:?}", y.shape()),
                        format!("{:?}", output.shape()),
                    ));
                }
                let sigma = math::softplus(s) + eps;
                let dsigma_ds = math::sigmoid(s);
                device.map_rows(n, |i| {
                    let ys: Vec<f64> = y.row(i).iter().copied().collect();
                    let mus: Vec<f64> = output.row(i).iter().copied().collect();
                    normal_row(&ys, &mus, sigma, dsigma_ds)
                })
            }
        };
        let rows = rows.into_iter().collect::<Result<Vec<_>>>()?;

        let lp_cols = rows.first().map_or(0, |r| r.log_probs.len());
        let out_cols = output.ncols();
        let log_probs = DMatrix::from_fn(n, lp_cols, |i, j| rows[i].log_probs[j]);
        let estimate = DMatrix::from_fn(n, out_cols, |i, j| rows[i].estimate[j]);
        let grad_output = DMatrix::from_fn(n, out_cols, |i, j| rows[i].grad[j]);
        let grad_scale = self.needs_scale().then(|| rows.iter().map(|r| r.grad_scale).sum::<f64>());

        Ok((
            Evaluation { log_probs, estimate },
            LikelihoodGradient { output: grad_output, scale: grad_scale },
        ))
    }
}

/// Per-observation log-probabilities together with the model's estimates.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// N×1 for binomial and multinomial, N×K for normal
    pub log_probs: DMatrix<f64>,
    /// Probabilities (binomial, multinomial) or means (normal)
    pub estimate: DMatrix<f64>,
}

impl Evaluation {
    /// Total log-likelihood.
    pub fn sum(&self) -> f64 {
        self.log_probs.sum()
    }

    /// Mean over every element of `log_probs`.
    pub fn mean(&self) -> f64 {
        if self.log_probs.is_empty() { f64::NAN } else { self.log_probs.mean() }
    }

    /// Log-likelihood of each observation (row sums).
    pub fn per_observation(&self) -> Vec<f64> {
        self.log_probs.column_sum().iter().copied().collect()
    }
}

/// Gradient of the total log-likelihood.
#[derive(Debug, Clone)]
pub struct LikelihoodGradient {
    /// With respect to the model output (same shape as the output)
    pub output: DMatrix<f64>,
    /// With respect to the pre-softplus scale, normal likelihood only
    pub scale: Option<f64>,
}

struct RowTerms {
    log_probs: Vec<f64>,
    estimate: Vec<f64>,
    grad: Vec<f64>,
    grad_scale: f64,
}

fn binomial_row(k: f64, n: f64, logit: f64) -> Result<RowTerms> {
    Ok(RowTerms {
        log_probs: vec![binomial::logpmf_logit(k, n, logit)?],
        estimate: vec![math::sigmoid(logit)],
        grad: vec![binomial::dlogpmf_dlogit(k, n, logit)?],
        grad_scale: 0.0,
    })
}

fn multinomial_row(counts: &[f64], logits: &[f64]) -> Result<RowTerms> {
    Ok(RowTerms {
        log_probs: vec![multinomial::logpmf_logits(counts, logits)?],
        estimate: math::softmax(logits),
        grad: multinomial::dlogpmf_dlogits(counts, logits)?,
        grad_scale: 0.0,
    })
}

fn normal_row(ys: &[f64], mus: &[f64], sigma: f64, dsigma_ds: f64) -> Result<RowTerms> {
    let mut log_probs = Vec::with_capacity(ys.len());
    let mut grad = Vec::with_capacity(ys.len());
    let mut grad_scale = 0.0;
    for (&y, &mu) in ys.iter().zip(mus) {
        log_probs.push(normal::logpdf(y, mu, sigma)?);
        let (dmu, dsigma) = normal::dlogpdf(y, mu, sigma)?;
        grad.push(dmu);
        grad_scale += dsigma * dsigma_ds;
    }
    Ok(RowTerms { log_probs, estimate: mus.to_vec(), grad, grad_scale })
}
