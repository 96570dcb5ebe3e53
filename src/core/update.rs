//! Ranked Hebbian dictionary update with greedy re-orthogonalization.
//!
//! One call performs a single in-place sweep over all basis vectors. The
//! sweep is strictly sequential: every column observes the basis and the
//! residual as left behind by all columns ranked ahead of it.

use log::{debug, trace, warn};
use ndarray::Array1;

use super::{dot, rank_coefficients, Basis, OscError, OscResult};
use crate::UpdateConfig;

/// Summary of one update call.
///
/// The mutated basis and residual are the real output; this is bookkeeping
/// for callers and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    /// Learning rate applied to the Hebbian step
    pub rate: f64,
    /// Column indices in the order they were processed
    pub order: Vec<usize>,
    /// Number of columns whose ranking magnitude met the threshold
    pub active: usize,
}

/// Adapt `basis` to the residual `x` and deflate `x`, in place.
///
/// # Algorithm
///
/// Columns are ranked once by `|u_k · x|` (see [`rank_coefficients`]). Then,
/// for each column `k` in that order:
///
/// 1. If its ranking magnitude is `>= threshold`, recompute `y = u_k · x`
///    against the current residual and apply `u_k += ε_t y x`.
/// 2. In one pass compute `‖u_k‖` and `p = (u_k · x) / ‖u_k‖`.
/// 3. Entry by entry: `u_k[i] /= ‖u_k‖`, then `x[i] -= p u_k[i]` using the
///    freshly normalized value.
/// 4. For every column `l` ranked after `k`: `u_l -= (u_k · u_l) u_k`.
///
/// Step 4 only protects columns still ahead in the sweep. Columns already
/// processed are never touched again in this call.
///
/// # Degenerate columns
///
/// A column with zero length at step 2 divides by zero and turns the column
/// and the residual into NaN, matching the plain kernel. With
/// `config.strict` set the sweep runs on scratch copies instead and the call
/// fails with `DegenerateColumn`, leaving `basis` and `x` untouched.
///
/// # Errors
/// - `ShapeMismatch` if `x.len() != basis.num_rows()` (nothing is mutated)
/// - `DegenerateColumn` in strict mode only
pub fn update_dictionary(
    basis: &mut Basis,
    x: &mut Array1<f64>,
    config: &UpdateConfig,
    t: f64,
) -> OscResult<UpdateReport> {
    if x.len() != basis.num_rows() {
        return Err(OscError::ShapeMismatch(format!(
            "Residual length: expected {}, got {}",
            basis.num_rows(),
            x.len()
        )));
    }

    let report = if config.strict {
        let mut scratch_basis = basis.clone();
        let mut scratch_x = x.clone();
        let report = sweep(&mut scratch_basis, &mut scratch_x, config, t, true)?;
        *basis = scratch_basis;
        *x = scratch_x;
        report
    } else {
        sweep(basis, x, config, t, false)?
    };

    debug!(
        "update t={} rate={:.6e} active={}/{}",
        t,
        report.rate,
        report.active,
        report.order.len()
    );
    Ok(report)
}

fn sweep(
    basis: &mut Basis,
    x: &mut Array1<f64>,
    config: &UpdateConfig,
    t: f64,
    strict: bool,
) -> OscResult<UpdateReport> {
    let rate = config.schedule.rate(t);
    let table = rank_coefficients(basis, x)?;
    let order: Vec<usize> = table.iter().map(|c| c.column).collect();
    let u = basis.as_array_mut();
    let mut active = 0;

    for (pos, coef) in table.iter().enumerate() {
        let k = coef.column;

        // Hebbian step, gated on the magnitude seen at ranking time
        if coef.magnitude >= config.threshold {
            let y = dot(u.column(k), x.view());
            let gain = rate * y;
            for (u_i, &x_i) in u.column_mut(k).iter_mut().zip(x.iter()) {
                *u_i += gain * x_i;
            }
            active += 1;
        }

        let (sq_norm, inner) = u
            .column(k)
            .iter()
            .zip(x.iter())
            .fold((0.0, 0.0), |(sq, ip), (&u_i, &x_i)| (sq + u_i * u_i, ip + u_i * x_i));
        let norm = sq_norm.sqrt();
        let proj = inner / norm;

        if norm == 0.0 || !norm.is_finite() {
            if strict {
                return Err(OscError::DegenerateColumn { column: k, norm });
            }
            warn!("basis column {} has norm {}; values will be non-finite", k, norm);
        }

        // Deflation must read the already normalized entry.
        for (u_i, x_i) in u.column_mut(k).iter_mut().zip(x.iter_mut()) {
            *u_i /= norm;
            *x_i -= proj * *u_i;
        }

        let u_k = u.column(k).to_owned();
        for &l in &order[pos + 1..] {
            let c = dot(u_k.view(), u.column(l));
            for (u_li, &u_ki) in u.column_mut(l).iter_mut().zip(u_k.iter()) {
                *u_li -= c * u_ki;
            }
        }

        trace!(
            "column {} (rank {}): |a|={:.6e} norm={:.6e} proj={:.6e}",
            k,
            pos,
            coef.magnitude,
            norm,
            proj
        );
    }

    Ok(UpdateReport {
        rate,
        order,
        active,
    })
}
