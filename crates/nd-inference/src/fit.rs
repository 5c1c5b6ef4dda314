//! Maximum-likelihood fitting of null, linear and single-hidden-layer models.

use nalgebra::DMatrix;
use nd_core::{Device, Error, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::init::{orthogonal, zeros};
use crate::likelihood::{Evaluation, Likelihood};
use crate::network::{NetworkParams, backward, forward, forward_pass};
use crate::optimizer::{LbfgsOptimizer, ObjectiveFunction, OptimizerConfig};

/// Model structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Output intercept only
    Null,
    /// One affine layer
    Linear,
    /// Affine, tanh, affine
    Nonlinear,
}

impl ModelKind {
    /// Short name used in report keys.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Null => "null",
            ModelKind::Linear => "linear",
            ModelKind::Nonlinear => "nonlinear",
        }
    }

    fn seed_offset(&self) -> u64 {
        match self {
            ModelKind::Null => 0,
            ModelKind::Linear => 1,
            ModelKind::Nonlinear => 2,
        }
    }
}

/// Fitting budget and optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Outer optimizer steps
    pub num_steps: u64,
    /// L-BFGS iterations allowed per step
    pub iterations_per_step: u64,
    /// Width of the hidden layer of the nonlinear model
    pub hidden_size: usize,
    /// Initial line-search step length
    pub learning_rate: f64,
    /// L-BFGS history size
    pub history_size: usize,
    /// Gradient-norm tolerance
    pub tolerance_grad: f64,
    /// Cost-change tolerance
    pub tolerance_change: f64,
    /// Seed for weight initialisation
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            num_steps: 10,
            iterations_per_step: 20,
            hidden_size: 8,
            learning_rate: 0.1,
            history_size: 100,
            tolerance_grad: 1e-7,
            tolerance_change: 1e-9,
            seed: 0,
        }
    }
}

impl FitConfig {
    /// Total iteration budget.
    pub fn max_iterations(&self) -> u64 {
        self.num_steps.saturating_mul(self.iterations_per_step)
    }

    /// Optimizer settings derived from this configuration.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            max_iter: self.max_iterations(),
            tol_grad: self.tolerance_grad,
            tol_cost: self.tolerance_change,
            m: self.history_size,
            initial_step: self.learning_rate,
        }
    }
}

/// Predictors, responses and optional per-row trial counts.
#[derive(Debug, Clone, Copy)]
pub struct Observations<'a> {
    /// N×D predictors
    pub x: &'a DMatrix<f64>,
    /// N×K responses
    pub y: &'a DMatrix<f64>,
    /// Per-row trials (binomial)
    pub total_counts: Option<&'a [u64]>,
}

impl<'a> Observations<'a> {
    /// Observations without trial counts.
    pub fn new(x: &'a DMatrix<f64>, y: &'a DMatrix<f64>) -> Self {
        Self { x, y, total_counts: None }
    }

    /// Attach per-row trial counts.
    pub fn with_total_counts(mut self, total_counts: &'a [u64]) -> Self {
        self.total_counts = Some(total_counts);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.y.nrows() == 0 {
            return Err(Error::Validation("no observations".into()));
        }
        if self.x.nrows() != self.y.nrows() {
            return Err(Error::shape("predictor rows", self.y.nrows(), self.x.nrows()));
        }
        if let Some(t) = self.total_counts {
            if t.len() != self.y.nrows() {
                return Err(Error::shape("total counts", self.y.nrows(), t.len()));
            }
        }
        Ok(())
    }
}

/// Initial parameters for `kind` with D inputs and K outputs.
pub fn initial_params(
    kind: ModelKind,
    likelihood: Likelihood,
    n_inputs: usize,
    n_outputs: usize,
    hidden_size: usize,
    rng: &mut StdRng,
) -> NetworkParams {
    let (coeffs, intercepts) = match kind {
        ModelKind::Null => (Vec::new(), vec![zeros(n_outputs)]),
        ModelKind::Linear => (vec![orthogonal(n_inputs, n_outputs, rng)], vec![zeros(n_outputs)]),
        ModelKind::Nonlinear => (
            vec![orthogonal(n_inputs, hidden_size, rng), orthogonal(hidden_size, n_outputs, rng)],
            vec![zeros(hidden_size), zeros(n_outputs)],
        ),
    };
    let scale = likelihood.needs_scale().then_some(0.0);
    NetworkParams { coeffs, intercepts, scale }
}

/// Total negative log-likelihood as a function of the flattened parameters.
struct NegLogLikelihood<'a> {
    data: Observations<'a>,
    likelihood: Likelihood,
    layout: NetworkParams,
    device: Device,
}

impl NegLogLikelihood<'_> {
    fn evaluate(&self, params: &NetworkParams) -> Result<Evaluation> {
        let out = forward(self.data.x, self.data.y, params)?;
        self.likelihood.evaluate(&out, self.data.y, params.scale, self.data.total_counts, self.device)
    }
}

impl ObjectiveFunction for NegLogLikelihood<'_> {
    fn eval(&self, flat: &[f64]) -> Result<f64> {
        let params = self.layout.with_flat(flat)?;
        Ok(-self.evaluate(&params)?.sum())
    }

    fn gradient(&self, flat: &[f64]) -> Result<Vec<f64>> {
        let params = self.layout.with_flat(flat)?;
        let pass = forward_pass(self.data.x, self.data.y, &params)?;
        let (_, grad) = self.likelihood.evaluate_with_gradient(
            &pass.output,
            self.data.y,
            params.scale,
            self.data.total_counts,
            self.device,
        )?;
        let net = backward(&pass, &params, &(-grad.output))?;
        Ok(net.to_flat(grad.scale.map(|g| -g)))
    }
}

/// Fitted parameters bound to their likelihood and device.
#[derive(Debug, Clone)]
pub struct FittedModel {
    /// Converged parameters
    pub params: NetworkParams,
    /// Observation model
    pub likelihood: Likelihood,
    /// Model structure
    pub kind: ModelKind,
    /// Device used for evaluation
    pub device: Device,
    /// Negative log-likelihood on the training data
    pub nll: f64,
    /// Optimizer iterations
    pub n_iter: u64,
    /// Whether a tolerance was met before the budget ran out
    pub converged: bool,
}

impl FittedModel {
    /// Evaluate the fitted model on (possibly new) observations.
    pub fn evaluate(&self, data: Observations<'_>) -> Result<Evaluation> {
        data.validate()?;
        let out = forward(data.x, data.y, &self.params)?;
        self.likelihood.evaluate(&out, data.y, self.params.scale, data.total_counts, self.device)
    }
}

/// Fit a model of the given kind by minimising the total negative log-likelihood.
pub fn fit_model(
    data: Observations<'_>,
    likelihood: Likelihood,
    kind: ModelKind,
    config: &FitConfig,
    device: Device,
) -> Result<FittedModel> {
    data.validate()?;
    match likelihood {
        Likelihood::Normal { eps } => {
            if data.total_counts.is_some() {
                return Err(Error::Precondition("normal likelihood does not take total counts".into()));
            }
            if !eps.is_finite() || eps < 0.0 {
                return Err(Error::Validation(format!("normal eps must be finite and >= 0, got {eps}")));
            }
        }
        Likelihood::Binomial if data.total_counts.is_none() => {
            return Err(Error::Precondition("binomial likelihood requires total counts".into()));
        }
        _ => {}
    }
    if kind == ModelKind::Nonlinear && config.hidden_size == 0 {
        return Err(Error::Validation("hidden_size must be > 0".into()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(kind.seed_offset()));
    let layout =
        initial_params(kind, likelihood, data.x.ncols(), data.y.ncols(), config.hidden_size, &mut rng);
    let init = layout.to_flat();
    let objective = NegLogLikelihood { data, likelihood, layout, device };

    let initial_nll = objective.eval(&init)?;
    if !initial_nll.is_finite() {
        return Err(Error::Computation(format!(
            "{} {} model: non-finite negative log-likelihood at initial parameters",
            likelihood.name(),
            kind.name()
        )));
    }

    log::debug!(
        "fitting {} {} model: {} parameters, {} observations, device {}",
        likelihood.name(),
        kind.name(),
        init.len(),
        data.y.nrows(),
        device.name()
    );

    let optimizer = LbfgsOptimizer::new(config.optimizer_config());
    let result = optimizer.minimize(&objective, &init)?;

    if result.converged || result.budget_exhausted {
        log::debug!("{} {} model: {}", likelihood.name(), kind.name(), result);
    } else {
        log::warn!("{} {} model stopped early: {}", likelihood.name(), kind.name(), result.message);
    }

    let params = objective.layout.with_flat(&result.parameters)?;
    Ok(FittedModel {
        params,
        likelihood,
        kind,
        device,
        nll: result.fval,
        n_iter: result.n_iter,
        converged: result.converged,
    })
}
