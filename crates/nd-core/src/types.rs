//! Common data types: result mapping and device selection

use crate::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single entry of a [`RegressionReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    /// Scalar statistic (log-likelihood sum, mean, pseudo-R², MSE, R²)
    Scalar(f64),
    /// Per-observation values (log-likelihood arrays)
    Array(Vec<f64>),
}

/// Named results of one orchestrator call.
///
/// Keys follow the `fitted_linear`, `fitted_linear_mean`, `fitted_linear_lls`,
/// `null`, `rho_mcf_linear`, ... naming used by downstream reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegressionReport {
    entries: BTreeMap<String, ReportValue>,
}

impl RegressionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scalar under `key`.
    pub fn insert_scalar(&mut self, key: impl Into<String>, value: f64) {
        self.entries.insert(key.into(), ReportValue::Scalar(value));
    }

    /// Record an array under `key`.
    pub fn insert_array(&mut self, key: impl Into<String>, values: Vec<f64>) {
        self.entries.insert(key.into(), ReportValue::Array(values));
    }

    /// Scalar stored under `key`, if present and scalar.
    pub fn scalar(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(ReportValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    /// Array stored under `key`, if present and an array.
    pub fn array(&self, key: &str) -> Option<&[f64]> {
        match self.entries.get(key) {
            Some(ReportValue::Array(v)) => Some(v),
            _ => None,
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to a JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Where per-observation likelihood terms are evaluated.
///
/// Chosen once at orchestration entry and threaded through every fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Sequential evaluation on the calling thread.
    #[default]
    Cpu,
    /// Row-parallel evaluation on the rayon thread pool.
    Parallel,
}

impl Device {
    /// Prefer the parallel backend when more than one worker thread is available.
    pub fn detect() -> Self {
        if rayon::current_num_threads() > 1 { Device::Parallel } else { Device::Cpu }
    }

    /// Backend name.
    pub fn name(&self) -> &str {
        match self {
            Device::Cpu => "cpu",
            Device::Parallel => "parallel",
        }
    }

    /// Evaluate `f(i)` for `i in 0..n`, returning results in index order.
    pub fn map_rows<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            Device::Cpu => (0..n).map(f).collect(),
            Device::Parallel => (0..n).into_par_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accessors() {
        let mut r = RegressionReport::new();
        assert!(r.is_empty());
        r.insert_scalar("null", -12.5);
        r.insert_array("null_lls", vec![-6.0, -6.5]);

        assert_eq!(r.scalar("null"), Some(-12.5));
        assert_eq!(r.array("null_lls"), Some(&[-6.0, -6.5][..]));
        assert_eq!(r.scalar("null_lls"), None);
        assert_eq!(r.array("null"), None);
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["null", "null_lls"]);
        assert_eq!(r.len(), 2);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_report_json_is_flat_object() {
        let mut r = RegressionReport::new();
        r.insert_scalar("rho_mcf_linear", 0.25);
        r.insert_array("fitted_linear_lls", vec![-1.0]);
        let json = r.to_json().unwrap();
        assert_eq!(json, r#"{"fitted_linear_lls":[-1.0],"rho_mcf_linear":0.25}"#);

        let back: RegressionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_devices_agree_on_order() {
        let seq = Device::Cpu.map_rows(100, |i| (i as f64).sqrt());
        let par = Device::Parallel.map_rows(100, |i| (i as f64).sqrt());
        assert_eq!(seq, par);
    }

    #[test]
    fn test_device_names() {
        assert_eq!(Device::Cpu.name(), "cpu");
        assert_eq!(Device::Parallel.name(), "parallel");
        let d = Device::detect();
        assert!(d == Device::Cpu || d == Device::Parallel);
    }
}
