//! Fit the null, linear and nonlinear models on a table and collect the results.

use nalgebra::DMatrix;
use nd_core::{Device, Error, RegressionReport, Result, Table};

use crate::fit::{FitConfig, ModelKind, Observations, fit_model};
use crate::labels::{self, LOCATION_COUNT_COLUMN, LOCATION_LABELS, SUPPLEMENTARY_LABELS};
use crate::likelihood::Likelihood;
use crate::metrics::{mean_squared_error, r2_score, rho_mcf};
use crate::preprocess::standardize_columns;

const FITTED_KINDS: [ModelKind; 2] = [ModelKind::Linear, ModelKind::Nonlinear];

/// Settings for [`location_likelihoods`].
#[derive(Debug, Clone)]
pub struct LocationOptions {
    /// Proportion columns, one per category
    pub labels: Vec<String>,
    /// Observation model (multinomial by default)
    pub likelihood: Likelihood,
    /// Compute placement
    pub device: Device,
    /// Optimizer budget and initialisation
    pub fit: FitConfig,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            labels: labels::owned(&LOCATION_LABELS),
            likelihood: Likelihood::Multinomial,
            device: Device::detect(),
            fit: FitConfig::default(),
        }
    }
}

/// Settings for [`regression_likelihoods`].
#[derive(Debug, Clone)]
pub struct RegressionOptions {
    /// Response columns
    pub labels: Vec<String>,
    /// Observation model (normal by default)
    pub likelihood: Likelihood,
    /// Compute placement
    pub device: Device,
    /// Optimizer budget and initialisation
    pub fit: FitConfig,
}

impl Default for RegressionOptions {
    fn default() -> Self {
        Self {
            labels: labels::owned(&SUPPLEMENTARY_LABELS),
            likelihood: Likelihood::normal(),
            device: Device::detect(),
            fit: FitConfig::default(),
        }
    }
}

fn standardized<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<DMatrix<f64>> {
    let mut m = table.select(columns)?;
    standardize_columns(&mut m);
    Ok(m)
}

/// Categorical responses: proportions times the per-row count column.
///
/// Reports `fitted_{linear,nonlinear}` with `_mean` and `_lls`, `null`,
/// `null_mean`, `null_lls`, and `rho_mcf_{linear,nonlinear}`.
pub fn location_likelihoods<S: AsRef<str>>(
    table: &Table,
    predictors: &[S],
    options: &LocationOptions,
) -> Result<RegressionReport> {
    let x = standardized(table, predictors)?;
    let proportions = table.select(&options.labels)?;
    let count = table.column(LOCATION_COUNT_COLUMN)?;
    if let Some(bad) = count.iter().find(|c| !c.is_finite() || **c < 0.0) {
        return Err(Error::Validation(format!(
            "{LOCATION_COUNT_COLUMN} must be finite and >= 0, got {bad}"
        )));
    }

    let counts = DMatrix::from_fn(proportions.nrows(), proportions.ncols(), |i, j| {
        count[i] * proportions[(i, j)]
    });
    let totals: Vec<u64> = count.iter().map(|c| c.trunc() as u64).collect();
    let data = Observations::new(&x, &counts).with_total_counts(&totals);

    log::debug!(
        "location likelihoods: {} rows, {} predictors, {} labels, {}",
        x.nrows(),
        x.ncols(),
        counts.ncols(),
        options.likelihood.name()
    );

    let mut report = RegressionReport::new();
    let mut fitted_lls = Vec::with_capacity(FITTED_KINDS.len());
    for kind in FITTED_KINDS {
        let model = fit_model(data, options.likelihood, kind, &options.fit, options.device)?;
        let ev = model.evaluate(data)?;
        let name = kind.name();
        let ll = ev.sum();
        report.insert_scalar(format!("fitted_{name}"), ll);
        report.insert_scalar(format!("fitted_{name}_mean"), ev.mean());
        report.insert_array(format!("fitted_{name}_lls"), ev.per_observation());
        fitted_lls.push((name, ll));
    }

    let null = fit_model(data, options.likelihood, ModelKind::Null, &options.fit, options.device)?
        .evaluate(data)?;
    let null_ll = null.sum();
    report.insert_scalar("null", null_ll);
    report.insert_scalar("null_mean", null.mean());
    report.insert_array("null_lls", null.per_observation());

    for (name, ll) in fitted_lls {
        report.insert_scalar(format!("rho_mcf_{name}"), rho_mcf(ll, null_ll));
    }

    Ok(report)
}

/// Continuous responses: predictors and responses both standardised.
///
/// Reports `fitted_{linear,nonlinear}` with `_mse`, `_r2`, `_mean` and
/// `_lls`, plus `null` and `null_mean`. No pseudo-R² is computed here.
pub fn regression_likelihoods<S: AsRef<str>>(
    table: &Table,
    predictors: &[S],
    options: &RegressionOptions,
) -> Result<RegressionReport> {
    let x = standardized(table, predictors)?;
    let y = standardized(table, &options.labels)?;
    let data = Observations::new(&x, &y);

    log::debug!(
        "regression likelihoods: {} rows, {} predictors, {} responses, {}",
        x.nrows(),
        x.ncols(),
        y.ncols(),
        options.likelihood.name()
    );

    let mut report = RegressionReport::new();
    for kind in FITTED_KINDS {
        let model = fit_model(data, options.likelihood, kind, &options.fit, options.device)?;
        let ev = model.evaluate(data)?;
        let name = kind.name();
        report.insert_scalar(format!("fitted_{name}_mse"), mean_squared_error(&y, &ev.estimate)?);
        report.insert_scalar(format!("fitted_{name}_r2"), r2_score(&y, &ev.estimate)?);
        report.insert_scalar(format!("fitted_{name}"), ev.sum());
        report.insert_scalar(format!("fitted_{name}_mean"), ev.mean());
        report.insert_array(format!("fitted_{name}_lls"), ev.per_observation());
    }

    let null = fit_model(data, options.likelihood, ModelKind::Null, &options.fit, options.device)?
        .evaluate(data)?;
    report.insert_scalar("null", null.sum());
    report.insert_scalar("null_mean", null.mean());

    Ok(report)
}
