//! # OSC (Online Orthogonal Sparse Coding)
//!
//! A dictionary-learning kernel for sparse-coding-based representation learning.
//!
//! ## Overview
//!
//! Each training sample is presented once as a residual signal `x`. The basis
//! vectors best aligned with `x` are adapted first with a Hebbian rule,
//! renormalized, and used to deflate `x`; every basis vector still waiting
//! its turn is orthogonalized against them. The result is a greedy,
//! order-sensitive Gram-Schmidt refinement of the dictionary, one sample at
//! a time.
//!
//! ## Structure
//!
//! - [`core`] — Basis storage, learning-rate schedule, coefficient ranking, update kernel
//! - [`patches`] — Sliding-window patch extraction and overlap-averaged reconstruction
//! - [`training`] — Sequential per-sample driver and metrics
//!
//! ## Concurrency
//!
//! Everything here is synchronous and single-threaded. An update call takes
//! the basis and residual by exclusive reference; calls that share a basis
//! must run one after another.

pub mod core;
pub mod patches;
pub mod training;

use serde::{Deserialize, Serialize};

pub use crate::core::{
    learning_rate, rank_coefficients, update_dictionary, Basis, Coefficient, OscError, OscResult,
    Schedule, UpdateReport,
};
pub use patches::{extract_patches, PatchSet};
pub use training::{train_epoch, train_sample, EpochMetrics, Metrics};

/// Update configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Minimum `|u_k · x|` for column `k` to receive the Hebbian step. Default 0.0.
    pub threshold: f64,
    /// Learning-rate schedule
    pub schedule: Schedule,
    /// Report zero-length columns as `DegenerateColumn` instead of
    /// propagating NaN. Default false.
    pub strict: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            schedule: Schedule::default(),
            strict: false,
        }
    }
}

impl UpdateConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// - `Config` if the document is malformed
    pub fn from_json(json: &str) -> OscResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    /// - `Config` if serialization fails
    pub fn to_json(&self) -> OscResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = UpdateConfig::default();
        assert_eq!(config.threshold, 0.0);
        assert!(!config.strict);
        assert_eq!(config.schedule, Schedule::default());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = UpdateConfig::from_json(r#"{"threshold": 0.25, "strict": true}"#).unwrap();
        assert_eq!(config.threshold, 0.25);
        assert!(config.strict);
        assert_eq!(config.schedule, Schedule::default());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = UpdateConfig {
            threshold: 0.5,
            schedule: Schedule {
                t_max: 20.0,
                eps_i: 0.3,
                eps_f: 0.02,
            },
            strict: true,
        };
        let json = config.to_json().unwrap();
        assert_eq!(UpdateConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_config_malformed_json() {
        assert!(matches!(
            UpdateConfig::from_json("{threshold: }"),
            Err(OscError::Config(_))
        ));
    }
}
