//! Named-column tabular input.

use crate::{Error, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column-oriented table of `f64` values, rows = observations.
///
/// All columns share the same length. Columns are addressed by name, the way
/// the orchestrators receive their predictor and label lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<f64>>", into = "BTreeMap<String, Vec<f64>>")]
pub struct Table {
    n_rows: usize,
    columns: BTreeMap<String, Vec<f64>>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert_column`](Table::insert_column).
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Insert (or replace) a column. The first column fixes the row count.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let replacing_only = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only && values.len() != self.n_rows {
            return Err(Error::shape(
                format!("column '{name}'"),
                format!("{} rows", self.n_rows),
                format!("{} rows", values.len()),
            ));
        }
        self.n_rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Parse a columnar JSON object: `{"col": [..], "other": [..]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<f64>> = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Borrow a column by name.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Gather the named columns into an `n_rows × names.len()` matrix.
    ///
    /// Fails on an empty selection, an empty table, or non-finite entries.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<DMatrix<f64>> {
        if names.is_empty() {
            return Err(Error::Validation("column selection must not be empty".to_string()));
        }
        if self.n_rows == 0 {
            return Err(Error::Validation("table has no rows".to_string()));
        }
        let mut out = DMatrix::zeros(self.n_rows, names.len());
        for (j, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let col = self.column(name)?;
            if col.iter().any(|v| !v.is_finite()) {
                return Err(Error::Validation(format!(
                    "column '{name}' must contain only finite values"
                )));
            }
            out.column_mut(j).copy_from_slice(col);
        }
        Ok(out)
    }
}

impl TryFrom<BTreeMap<String, Vec<f64>>> for Table {
    type Error = Error;

    fn try_from(raw: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        let mut table = Table::new();
        for (name, values) in raw {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }
}

impl From<Table> for BTreeMap<String, Vec<f64>> {
    fn from(table: Table) -> Self {
        table.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new()
            .with_column("a", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("b", vec![4.0, 5.0, 6.0])
            .unwrap()
    }

    #[test]
    fn test_select_orders_columns_as_requested() {
        let t = sample();
        let m = t.select(&["b", "a"]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m[(0, 0)], 4.0);
        assert_eq!(m[(2, 1)], 3.0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = sample().with_column("c", vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_replace_single_column_with_new_length() {
        let t = Table::new()
            .with_column("a", vec![1.0])
            .unwrap()
            .with_column("a", vec![1.0, 2.0])
            .unwrap();
        assert_eq!(t.n_rows(), 2);
    }

    #[test]
    fn test_missing_column() {
        let err = sample().select(&["zzz"]).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "zzz"));
    }

    #[test]
    fn test_non_finite_rejected_on_select() {
        let t = Table::new().with_column("a", vec![1.0, f64::NAN]).unwrap();
        assert!(matches!(t.select(&["a"]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_from_json() {
        let t = Table::from_json(r#"{"x": [1.0, 2.0], "y": [0.5, 0.25]}"#).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(t.column("y").unwrap(), &[0.5, 0.25]);

        assert!(Table::from_json(r#"{"x": [1.0], "y": [0.5, 0.25]}"#).is_err());
    }

    #[test]
    fn test_serde_roundtrip_goes_through_validation() {
        let t = sample();
        let json = serde_json::to_string(&t).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
