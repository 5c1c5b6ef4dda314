//! Probability building blocks for the regression crates.
//!
//! This crate hosts the observation-model math used by the likelihood evaluators:
//! - base log-densities (binomial, multinomial, normal) and their derivatives
//! - small numeric helpers (stable log/exp/sigmoid/softmax primitives)

pub mod binomial;
pub mod math;
pub mod multinomial;
pub mod normal;
