//! Default column names consumed by the orchestrators.

/// Categorical location labels; each column holds the proportion of a row's
/// observations that fell into that location.
pub const LOCATION_LABELS: [&str; 4] = ["dance_floor", "honey_storage", "near_exit", "brood_area_total"];

/// Continuous supplementary descriptors.
pub const SUPPLEMENTARY_LABELS: [&str; 8] = [
    "age",
    "days_left",
    "velocity",
    "velocity_day",
    "velocity_night",
    "r_squared",
    "phase",
    "amplitude",
];

/// Per-row number of location observations (trial count).
pub const LOCATION_COUNT_COLUMN: &str = "location_descriptor_count";

pub(crate) fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}
