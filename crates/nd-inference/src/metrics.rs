//! Goodness-of-fit measures.

use nalgebra::DMatrix;
use nd_core::{Error, Result};
use statrs::statistics::Statistics;

/// McFadden's pseudo-R²: `1 - ll_fitted / ll_null`.
pub fn rho_mcf(fitted: f64, null: f64) -> f64 {
    1.0 - fitted / null
}

fn check_shapes(y_true: &DMatrix<f64>, y_pred: &DMatrix<f64>) -> Result<()> {
    if y_true.shape() != y_pred.shape() {
        return Err(Error::shape(
            "predictions",
            format!("{:?}", y_true.shape()),
            format!("{:?}", y_pred.shape()),
        ));
    }
    if y_true.is_empty() {
        return Err(Error::Validation("cannot score empty predictions".into()));
    }
    Ok(())
}

/// Mean squared error over every element.
pub fn mean_squared_error(y_true: &DMatrix<f64>, y_pred: &DMatrix<f64>) -> Result<f64> {
    check_shapes(y_true, y_pred)?;
    Ok((y_true - y_pred).map(|r| r * r).mean())
}

/// Coefficient of determination per column, averaged uniformly.
///
/// A constant column scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &DMatrix<f64>, y_pred: &DMatrix<f64>) -> Result<f64> {
    check_shapes(y_true, y_pred)?;
    let scores: Vec<f64> = y_true
        .column_iter()
        .zip(y_pred.column_iter())
        .map(|(t, p)| {
            let mean = t.iter().mean();
            let ss_res: f64 = t.iter().zip(p.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
            let ss_tot: f64 = t.iter().map(|a| (a - mean) * (a - mean)).sum();
            if ss_tot == 0.0 {
                if ss_res == 0.0 { 1.0 } else { 0.0 }
            } else {
                1.0 - ss_res / ss_tot
            }
        })
        .collect();
    Ok(scores.mean())
}
