//! Coefficient ranking: decides the order in which basis vectors are updated.

use ndarray::Array1;

use super::{dot, Basis, OscError, OscResult};

/// One row of the coefficient table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
    /// Basis column index
    pub column: usize,
    /// `|u_column · x|` at ranking time
    pub magnitude: f64,
}

/// Project `x` onto every basis vector and sort by descending magnitude.
///
/// # Algorithm
/// ```text
/// a_k = |u_k · x|        for k in 0..num_cols
/// order = argsort(a, descending)
/// ```
///
/// The sort is stable: equal magnitudes keep ascending column order. A NaN
/// magnitude sorts ahead of every finite one.
///
/// # Errors
/// - `ShapeMismatch` if `x.len() != basis.num_rows()`
pub fn rank_coefficients(basis: &Basis, x: &Array1<f64>) -> OscResult<Vec<Coefficient>> {
    if x.len() != basis.num_rows() {
        return Err(OscError::ShapeMismatch(format!(
            "Residual length: expected {}, got {}",
            basis.num_rows(),
            x.len()
        )));
    }

    let mut table: Vec<Coefficient> = (0..basis.num_cols())
        .map(|k| Coefficient {
            column: k,
            magnitude: dot(basis.column(k), x.view()).abs(),
        })
        .collect();

    table.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    Ok(table)
}
