//! Optimization algorithms
//!
//! This module wraps argmin's L-BFGS with a More–Thuente line search behind a
//! small objective trait.

use argmin::core::{
    CostFunction, Executor, Gradient, LineSearch, State, TerminationReason, TerminationStatus,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use nd_core::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configuration for the L-BFGS optimizer
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Maximum number of iterations
    pub max_iter: u64,
    /// Convergence tolerance for gradient norm
    pub tol_grad: f64,
    /// Convergence tolerance for the change in cost between iterations
    pub tol_cost: f64,
    /// Number of corrections to approximate inverse Hessian
    pub m: usize,
    /// First trial step length of every line search
    pub initial_step: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_iter: 1000, tol_grad: 1e-6, tol_cost: 1e-12, m: 10, initial_step: 1.0 }
    }
}

/// Result of optimization
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best-fit parameters
    pub parameters: Vec<f64>,
    /// Function value at minimum
    pub fval: f64,
    /// Number of iterations
    pub n_iter: u64,
    /// Number of objective (cost) evaluations.
    pub n_fev: usize,
    /// Number of gradient evaluations.
    pub n_gev: usize,
    /// Convergence status
    pub converged: bool,
    /// Whether the iteration budget was exhausted
    pub budget_exhausted: bool,
    /// Termination message
    pub message: String,
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptimizationResult(fval={:.6}, n_iter={}, n_fev={}, n_gev={}, converged={})",
            self.fval, self.n_iter, self.n_fev, self.n_gev, self.converged
        )
    }
}

/// Objective function trait for optimization
pub trait ObjectiveFunction: Send + Sync {
    /// Evaluate function at given parameters
    fn eval(&self, params: &[f64]) -> Result<f64>;

    /// Gradient of [`eval`](ObjectiveFunction::eval) at given parameters
    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>>;
}

/// Wrapper to make ObjectiveFunction compatible with argmin
struct ArgminProblem<'a> {
    objective: &'a dyn ObjectiveFunction,
    counts: Arc<FuncCounts>,
}

#[derive(Default)]
struct FuncCounts {
    cost: AtomicUsize,
    grad: AtomicUsize,
}

impl<'a> CostFunction for ArgminProblem<'a> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        self.counts.cost.fetch_add(1, Ordering::Relaxed);
        self.objective.eval(params).map_err(|e| argmin::core::Error::msg(e.to_string()))
    }
}

impl<'a> Gradient for ArgminProblem<'a> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(
        &self,
        params: &Self::Param,
    ) -> std::result::Result<Self::Gradient, argmin::core::Error> {
        self.counts.grad.fetch_add(1, Ordering::Relaxed);
        self.objective.gradient(params).map_err(|e| argmin::core::Error::msg(e.to_string()))
    }
}

/// Unconstrained L-BFGS optimizer
pub struct LbfgsOptimizer {
    config: OptimizerConfig,
}

impl LbfgsOptimizer {
    /// Create new L-BFGS optimizer with given configuration
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimize objective function starting from `init_params`.
    ///
    /// Returns the best parameters seen, whether the run converged or stopped on the
    /// iteration budget.
    pub fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        init_params: &[f64],
    ) -> Result<OptimizationResult> {
        if init_params.is_empty() {
            return Err(Error::Validation("cannot optimize zero parameters".to_string()));
        }

        let counts = Arc::new(FuncCounts::default());
        let problem = ArgminProblem { objective, counts: counts.clone() };

        let mut linesearch: MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64> =
            MoreThuenteLineSearch::new();
        linesearch.initial_step_length(self.config.initial_step).map_err(|e| {
            Error::Validation(format!("Invalid optimizer configuration (initial_step): {e}"))
        })?;

        let solver = LBFGS::new(linesearch, self.config.m)
            .with_tolerance_grad(self.config.tol_grad)
            .map_err(|e| {
                Error::Validation(format!("Invalid optimizer configuration (tol_grad): {e}"))
            })?;
        let solver = solver.with_tolerance_cost(self.config.tol_cost).map_err(|e| {
            Error::Validation(format!("Invalid optimizer configuration (tol_cost): {e}"))
        })?;

        let res = Executor::new(problem, solver)
            .configure(|state| state.param(init_params.to_vec()).max_iters(self.config.max_iter))
            .run()
            .map_err(|e| Error::Computation(format!("Optimization failed: {}", e)))?;

        let state = res.state();
        let parameters = state
            .get_best_param()
            .ok_or_else(|| Error::Computation("No best parameters found".to_string()))?
            .clone();
        let fval = state.get_best_cost();
        let n_iter = state.get_iter();
        let n_fev = counts.cost.load(Ordering::Relaxed);
        let n_gev = counts.grad.load(Ordering::Relaxed);

        let termination = state.get_termination_status();
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
                | TerminationStatus::Terminated(TerminationReason::TargetCostReached)
        );
        let budget_exhausted =
            matches!(termination, TerminationStatus::Terminated(TerminationReason::MaxItersReached));
        let message = termination.to_string();

        Ok(OptimizationResult {
            parameters,
            fval,
            n_iter,
            n_fev,
            n_gev,
            converged,
            budget_exhausted,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn default_optimizer() -> LbfgsOptimizer {
        LbfgsOptimizer::new(OptimizerConfig::default())
    }

    // f(x, y) = (x - 2)^2 + (y - 3)^2, minimum at (2, 3)
    struct QuadraticFunction;

    impl ObjectiveFunction for QuadraticFunction {
        fn eval(&self, params: &[f64]) -> Result<f64> {
            Ok((params[0] - 2.0).powi(2) + (params[1] - 3.0).powi(2))
        }

        fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![2.0 * (params[0] - 2.0), 2.0 * (params[1] - 3.0)])
        }
    }

    #[test]
    fn test_optimizer_quadratic() {
        let optimizer = default_optimizer();
        let result = optimizer.minimize(&QuadraticFunction, &[0.0, 0.0]).unwrap();

        assert!(result.converged, "Optimizer should converge: {}", result.message);
        assert_relative_eq!(result.parameters[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.parameters[1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.fval, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_optimizer_small_initial_step() {
        let config = OptimizerConfig { initial_step: 0.1, ..OptimizerConfig::default() };
        let result = LbfgsOptimizer::new(config).minimize(&QuadraticFunction, &[0.0, 0.0]).unwrap();

        assert_relative_eq!(result.parameters[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.parameters[1], 3.0, epsilon = 1e-4);
    }

    // Quadratic with negative offset: minimum is negative.
    struct QuadraticNegativeOffset;

    impl ObjectiveFunction for QuadraticNegativeOffset {
        fn eval(&self, params: &[f64]) -> Result<f64> {
            Ok((params[0] - 2.0).powi(2) - 5.0)
        }

        fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![2.0 * (params[0] - 2.0)])
        }
    }

    #[test]
    fn test_optimizer_does_not_stop_at_negative_cost() {
        let result = default_optimizer().minimize(&QuadraticNegativeOffset, &[0.0]).unwrap();

        assert!(result.converged, "Optimizer should converge");
        assert_relative_eq!(result.parameters[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.fval, -5.0, epsilon = 1e-6);
    }

    // Rosenbrock: f(x,y) = (1-x)^2 + 100(y-x^2)^2, minimum at (1, 1)
    struct RosenbrockFunction;

    impl ObjectiveFunction for RosenbrockFunction {
        fn eval(&self, params: &[f64]) -> Result<f64> {
            let (x, y) = (params[0], params[1]);
            Ok((1.0 - x).powi(2) + 100.0 * (y - x.powi(2)).powi(2))
        }

        fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
            let (x, y) = (params[0], params[1]);
            Ok(vec![-2.0 * (1.0 - x) - 400.0 * x * (y - x * x), 200.0 * (y - x * x)])
        }
    }

    #[test]
    fn test_optimizer_rosenbrock() {
        let result = default_optimizer().minimize(&RosenbrockFunction, &[0.0, 0.0]).unwrap();

        assert_relative_eq!(result.parameters[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.parameters[1], 1.0, epsilon = 1e-3);
        assert!(result.fval < 1e-4);
    }

    #[test]
    fn test_iteration_budget_is_respected() {
        let config = OptimizerConfig { max_iter: 2, ..OptimizerConfig::default() };
        let result =
            LbfgsOptimizer::new(config).minimize(&RosenbrockFunction, &[-1.2, 1.0]).unwrap();

        assert!(result.n_iter <= 2);
        assert!(!result.converged);
        assert!(result.budget_exhausted, "status: {}", result.message);
        // best-so-far is never worse than the start
        assert!(result.fval <= RosenbrockFunction.eval(&[-1.2, 1.0]).unwrap());
    }

    #[test]
    fn test_invalid_configuration() {
        let config = OptimizerConfig { initial_step: 0.0, ..OptimizerConfig::default() };
        let err = LbfgsOptimizer::new(config).minimize(&QuadraticFunction, &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = default_optimizer().minimize(&QuadraticFunction, &[]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
