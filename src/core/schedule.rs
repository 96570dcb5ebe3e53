//! Exponentially decaying learning-rate schedule.

use serde::{Deserialize, Serialize};

use super::{OscError, OscResult};

/// Effective learning rate at step `t`.
///
/// ```text
/// ε_t = ε_i * (ε_f / ε_i)^(t / t_max)
/// ```
///
/// Interpolates geometrically from `eps_i` at `t = 0` to `eps_f` at
/// `t = t_max`. No validation: `eps_i`, `eps_f` and `t_max` must be
/// positive, otherwise the result is NaN or infinite.
pub fn learning_rate(t: f64, t_max: f64, eps_i: f64, eps_f: f64) -> f64 {
    eps_i * (eps_f / eps_i).powf(t / t_max)
}

/// Schedule parameters shared across update calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Step at which the rate reaches `eps_f`. Default 100000.
    pub t_max: f64,
    /// Initial learning rate. Default 0.1.
    pub eps_i: f64,
    /// Final learning rate. Default 0.001.
    pub eps_f: f64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            t_max: 100_000.0,
            eps_i: 0.1,
            eps_f: 0.001,
        }
    }
}

impl Schedule {
    /// Learning rate at step `t`.
    pub fn rate(&self, t: f64) -> f64 {
        learning_rate(t, self.t_max, self.eps_i, self.eps_f)
    }

    /// Check that every parameter is finite and positive.
    ///
    /// The update kernel does not call this; it is offered to callers that
    /// build schedules from untrusted input.
    ///
    /// # Errors
    /// - `InvalidConfig` naming the first offending parameter
    pub fn validate(&self) -> OscResult<()> {
        for (name, value) in [("t_max", self.t_max), ("eps_i", self.eps_i), ("eps_f", self.eps_f)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(OscError::InvalidConfig(format!(
                    "{} must be finite and > 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
