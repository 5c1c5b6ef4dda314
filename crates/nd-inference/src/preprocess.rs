//! Column scaling applied before fitting.

use nalgebra::DMatrix;
use statrs::statistics::Statistics;

/// Divide each column by its population standard deviation, in place.
///
/// Columns are not centred. Returns the deviations used. A zero or non-finite
/// deviation is logged and applied as is, so the affected column becomes
/// non-finite and the caller sees the failure downstream.
pub fn standardize_columns(x: &mut DMatrix<f64>) -> Vec<f64> {
    let mut stds = Vec::with_capacity(x.ncols());
    for (j, mut col) in x.column_iter_mut().enumerate() {
        let std = col.iter().population_std_dev();
        if !std.is_finite() || std == 0.0 {
            log::warn!("column {j} has degenerate standard deviation {std}");
        }
        col.unscale_mut(std);
        stds.push(std);
    }
    stds
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_population_std() {
        let mut x = DMatrix::from_row_slice(4, 2, &[1.0, 10.0, 2.0, 30.0, 3.0, 20.0, 6.0, 40.0]);
        let stds = standardize_columns(&mut x);
        assert_eq!(stds.len(), 2);
        for col in x.column_iter() {
            assert_relative_eq!(col.iter().population_std_dev(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mean_is_scaled_not_centred() {
        let mut x = DMatrix::from_column_slice(4, 1, &[2.0, 4.0, 6.0, 8.0]);
        let stds = standardize_columns(&mut x);
        let mean = x.column(0).iter().mean();
        assert_relative_eq!(mean, 5.0 / stds[0], epsilon = 1e-12);
        assert!(mean > 0.0);
    }

    #[test]
    fn test_constant_column_is_not_guarded() {
        let mut x = DMatrix::from_element(3, 1, 2.0);
        let stds = standardize_columns(&mut x);
        assert_eq!(stds[0], 0.0);
        assert!(x.iter().all(|v| !v.is_finite()));
    }
}
