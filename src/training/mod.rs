//! Sequential per-sample training and metrics.
//!
//! Each sample is used once as the starting residual of an update call.
//! Samples are visited in the order given; the schedule step advances by
//! one per sample. Sample selection, shuffling and stopping criteria belong
//! to the caller.

use log::debug;
use ndarray::{Array1, Array2};

use crate::core::{update_dictionary, Basis, OscError, OscResult};
use crate::UpdateConfig;

/// Metrics from a single update call.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Learning rate used
    pub rate: f64,
    /// Columns that received the Hebbian step
    pub active: usize,
    /// L2 norm of the sample before deflation
    pub residual_before: f64,
    /// L2 norm of what the basis left unexplained
    pub residual_after: f64,
}

/// Statistics for one pass over a sample matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    /// Mean of `residual_after` across samples
    pub avg_residual: f64,
    /// Samples processed
    pub num_samples: usize,
    /// Schedule step the next sample would use
    pub final_step: f64,
    /// Per-sample `residual_after`, in visiting order
    pub residuals: Vec<f64>,
}

/// Compute L2 norm of an `Array1<f64>`.
fn l2_norm(x: &Array1<f64>) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Train the basis on a single sample at schedule step `t`.
///
/// # Errors
/// Returns `Err` on dimension mismatch, or on a degenerate column in strict mode.
pub fn train_sample(
    basis: &mut Basis,
    sample: &Array1<f64>,
    t: f64,
    config: &UpdateConfig,
) -> OscResult<Metrics> {
    let mut residual = sample.clone();
    let residual_before = l2_norm(&residual);

    let report = update_dictionary(basis, &mut residual, config, t)?;

    Ok(Metrics {
        rate: report.rate,
        active: report.active,
        residual_before,
        residual_after: l2_norm(&residual),
    })
}

/// Train on every column of `samples`, starting at schedule step `t_start`.
///
/// `samples` has shape `(num_rows, num_samples)`, the layout produced by
/// [`extract_patches`](crate::patches::extract_patches).
///
/// # Errors
/// Returns `Err` on dimension mismatch or the first failing sample. Samples
/// before the failure stay applied to `basis`.
#[allow(clippy::cast_precision_loss)]
pub fn train_epoch(
    basis: &mut Basis,
    samples: &Array2<f64>,
    t_start: f64,
    config: &UpdateConfig,
) -> OscResult<EpochMetrics> {
    if samples.nrows() != basis.num_rows() {
        return Err(OscError::ShapeMismatch(format!(
            "Sample length: expected {}, got {}",
            basis.num_rows(),
            samples.nrows()
        )));
    }

    let num_samples = samples.ncols();
    let mut residuals = Vec::with_capacity(num_samples);
    let mut t = t_start;

    for sample in samples.columns() {
        let metrics = train_sample(basis, &sample.to_owned(), t, config)?;
        residuals.push(metrics.residual_after);
        t += 1.0;
    }

    let avg_residual = if num_samples == 0 {
        0.0
    } else {
        residuals.iter().sum::<f64>() / num_samples as f64
    };

    debug!(
        "epoch: {} samples, steps {}..{}, avg residual {:.6}",
        num_samples, t_start, t, avg_residual
    );

    Ok(EpochMetrics {
        avg_residual,
        num_samples,
        final_step: t,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schedule;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn identity(n: usize) -> Basis {
        Basis::from_array(Array2::eye(n))
    }

    #[test]
    fn test_l2_norm() {
        let x = ndarray::arr1(&[3.0, 4.0]);
        assert!((l2_norm(&x) - 5.0).abs() < 1e-12);

        let zeros = Array1::<f64>::zeros(5);
        assert_eq!(l2_norm(&zeros), 0.0);
    }

    #[test]
    fn test_train_sample_basic() {
        let mut basis = identity(3);
        let sample = array![1.0, -2.0, 0.5];

        let metrics = train_sample(&mut basis, &sample, 0.0, &UpdateConfig::default()).unwrap();

        assert_abs_diff_eq!(metrics.residual_before, l2_norm(&sample), epsilon = 1e-12);
        assert!(metrics.residual_after <= metrics.residual_before);
        assert_eq!(metrics.active, 3);
        assert_abs_diff_eq!(metrics.rate, Schedule::default().eps_i, epsilon = 1e-15);
    }

    #[test]
    fn test_train_sample_does_not_mutate_sample() {
        let mut basis = identity(2);
        let sample = array![0.3, 0.4];
        train_sample(&mut basis, &sample, 0.0, &UpdateConfig::default()).unwrap();
        assert_eq!(sample, array![0.3, 0.4]);
    }

    #[test]
    fn test_train_sample_dimension_mismatch() {
        let mut basis = identity(2);
        let bad = array![1.0, 2.0, 3.0];
        assert!(train_sample(&mut basis, &bad, 0.0, &UpdateConfig::default()).is_err());
    }

    #[test]
    fn test_train_epoch_steps() {
        let mut basis = Basis::from_columns(&[array![1.0, 0.1, 0.0], array![0.0, 1.0, 0.2]]).unwrap();
        let samples = Array2::from_shape_fn((3, 5), |(r, c)| ((r + 2 * c) % 3) as f64 - 1.0);

        let metrics = train_epoch(&mut basis, &samples, 10.0, &UpdateConfig::default()).unwrap();

        assert_eq!(metrics.num_samples, 5);
        assert_eq!(metrics.residuals.len(), 5);
        assert_eq!(metrics.final_step, 15.0);
        assert!(metrics.avg_residual >= 0.0);
        for norm in basis.column_norms().iter() {
            assert_abs_diff_eq!(*norm, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_train_epoch_empty() {
        let mut basis = identity(2);
        let samples = Array2::<f64>::zeros((2, 0));
        let metrics = train_epoch(&mut basis, &samples, 0.0, &UpdateConfig::default()).unwrap();
        assert_eq!(metrics.num_samples, 0);
        assert_eq!(metrics.avg_residual, 0.0);
        assert_eq!(metrics.final_step, 0.0);
    }

    #[test]
    fn test_train_epoch_dimension_mismatch() {
        let mut basis = identity(2);
        let samples = Array2::<f64>::zeros((3, 4));
        assert!(matches!(
            train_epoch(&mut basis, &samples, 0.0, &UpdateConfig::default()),
            Err(OscError::ShapeMismatch(_))
        ));
    }
}
