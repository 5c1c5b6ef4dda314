//! # nd-inference
//!
//! Maximum-likelihood regression of behavioural descriptors.
//!
//! This crate provides:
//! - null, linear and single-hidden-layer tanh models fitted with L-BFGS
//! - binomial, multinomial and normal observation models
//! - McFadden pseudo-R², MSE and R² reporting
//! - two table-level entry points, [`location_likelihoods`] for categorical
//!   counts and [`regression_likelihoods`] for continuous responses
//!
//! ## Architecture
//!
//! Gradients are exact: each likelihood returns `∂log p/∂output`, which
//! [`network::backward`] pushes through the layers.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Model fitting: parameter initialisation, objective, [`FittedModel`].
pub mod fit;
/// Orthogonal and zero initialisers.
pub mod init;
/// Default label sets and column names.
pub mod labels;
/// Observation models.
pub mod likelihood;
/// Table-level orchestrators.
pub mod likelihoods;
/// Pseudo-R², MSE, R².
pub mod metrics;
/// Forward and backward passes of the output transform.
pub mod network;
/// Generic numerical optimizer (L-BFGS backend).
pub mod optimizer;
/// Column standardisation.
pub mod preprocess;

pub use fit::{FitConfig, FittedModel, ModelKind, Observations, fit_model};
pub use labels::{LOCATION_COUNT_COLUMN, LOCATION_LABELS, SUPPLEMENTARY_LABELS};
pub use likelihood::{DEFAULT_NORMAL_EPS, Evaluation, Likelihood};
pub use likelihoods::{LocationOptions, RegressionOptions, location_likelihoods, regression_likelihoods};
pub use metrics::{mean_squared_error, r2_score, rho_mcf};
pub use network::NetworkParams;
pub use optimizer::{LbfgsOptimizer, OptimizationResult, OptimizerConfig};
pub use preprocess::standardize_columns;

pub use nd_core::{Device, Error, RegressionReport, ReportValue, Result, Table};
