//! Core OSC kernel.
//!
//! This module provides the fundamental structures and operations of one
//! online dictionary-update step:
//! - Basis matrix storage with a fixed column-major layout
//! - Learning-rate schedule
//! - Coefficient ranking (processing order)
//! - Ranked Hebbian update with greedy re-orthogonalization
//!
//! ## Update Rule
//!
//! For every basis vector `u_k`, visited in descending order of `|u_k · x|`:
//! ```text
//! u_k += ε_t (u_k · x) x              (only if |u_k · x| ≥ threshold)
//! u_k  = u_k / ||u_k||
//! x   -= (u_k · x) u_k
//! u_l -= (u_k · u_l) u_k              for every l visited after k
//! ```

pub mod ranking;
pub mod schedule;
pub mod update;

use ndarray::{Array1, Array2, ArrayView1, ShapeBuilder};
use thiserror::Error;

pub use ranking::{rank_coefficients, Coefficient};
pub use schedule::{learning_rate, Schedule};
pub use update::{update_dictionary, UpdateReport};

/// Error type for OSC operations.
#[derive(Error, Debug)]
pub enum OscError {
    /// Shape mismatch between the basis, the residual, or raw input data
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid configuration or geometry
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A basis vector reached normalization with zero or non-finite length
    #[error("Degenerate basis column {column}: norm = {norm}")]
    DegenerateColumn { column: usize, norm: f64 },

    /// Configuration document could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type OscResult<T> = Result<T, OscError>;

/// Dot product accumulated strictly in index order.
///
/// `ArrayBase::dot` unrolls its accumulation, which changes rounding.
pub(crate) fn dot(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).fold(0.0, |acc, (p, q)| acc + p * q)
}

/// A dictionary of `num_cols` basis vectors of length `num_rows`.
///
/// # Layout
///
/// `U` is a `(num_rows, num_cols)` matrix held in column-major order: basis
/// vector `k` is column `k` and occupies the contiguous flat range
/// `k * num_rows .. (k + 1) * num_rows`. All flat-data constructors and
/// accessors use this convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    u: Array2<f64>,
}

impl Basis {
    /// Build a basis from flat column-major data.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `data.len() != num_rows * num_cols`
    pub fn from_column_major(num_rows: usize, num_cols: usize, data: Vec<f64>) -> OscResult<Self> {
        if data.len() != num_rows * num_cols {
            return Err(OscError::ShapeMismatch(format!(
                "Basis data: expected {} values ({} x {}), got {}",
                num_rows * num_cols,
                num_rows,
                num_cols,
                data.len()
            )));
        }
        let u = Array2::from_shape_vec((num_rows, num_cols).f(), data)
            .map_err(|e| OscError::ShapeMismatch(e.to_string()))?;
        Ok(Self { u })
    }

    /// Build a basis from individual basis vectors.
    ///
    /// An empty slice yields a basis with zero rows and zero columns.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the vectors differ in length
    pub fn from_columns(columns: &[Array1<f64>]) -> OscResult<Self> {
        let num_rows = columns.first().map_or(0, |c| c.len());
        let mut data = Vec::with_capacity(num_rows * columns.len());
        for (k, col) in columns.iter().enumerate() {
            if col.len() != num_rows {
                return Err(OscError::ShapeMismatch(format!(
                    "Basis column {}: expected length {}, got {}",
                    k,
                    num_rows,
                    col.len()
                )));
            }
            data.extend(col.iter().copied());
        }
        Self::from_column_major(num_rows, columns.len(), data)
    }

    /// Wrap an existing `(num_rows, num_cols)` matrix, re-laying it out
    /// column-major if needed.
    pub fn from_array(u: Array2<f64>) -> Self {
        if u.t().is_standard_layout() {
            return Self { u };
        }
        let mut relaid = Array2::zeros(u.dim().f());
        relaid.assign(&u);
        Self { u: relaid }
    }

    /// Length of every basis vector.
    pub fn num_rows(&self) -> usize {
        self.u.nrows()
    }

    /// Number of basis vectors.
    pub fn num_cols(&self) -> usize {
        self.u.ncols()
    }

    /// Basis vector `k`.
    ///
    /// # Panics
    /// If `k >= num_cols()`.
    pub fn column(&self, k: usize) -> ArrayView1<'_, f64> {
        self.u.column(k)
    }

    /// The full `(num_rows, num_cols)` matrix.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.u
    }

    pub(crate) fn as_array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.u
    }

    /// Flat column-major data.
    pub fn into_column_major(self) -> Vec<f64> {
        self.u.t().iter().copied().collect()
    }

    /// Euclidean norm of every basis vector.
    pub fn column_norms(&self) -> Array1<f64> {
        self.u
            .columns()
            .into_iter()
            .map(|c| dot(c, c).sqrt())
            .collect()
    }

    /// Gram matrix `Uᵀ U`: entry `(k, l)` is `u_k · u_l`.
    pub fn gram(&self) -> Array2<f64> {
        let n = self.num_cols();
        Array2::from_shape_fn((n, n), |(k, l)| dot(self.u.column(k), self.u.column(l)))
    }
}
