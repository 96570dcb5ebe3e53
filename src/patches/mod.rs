//! Sliding-window patch extraction.
//!
//! Turns an image into the column-per-sample matrix the update kernel trains
//! on, and keeps enough bookkeeping to put (possibly modified) patches back
//! together.
//!
//! ## Index Conventions
//!
//! - Pixels are addressed by a flat column-major index: `col * height + row`.
//! - A patch is flattened column-major too: offset `(k, l)` (row, column)
//!   inside the patch lands at entry `l * patch_size + k`.
//! - Patches are numbered with the vertical shift varying fastest: the patch
//!   whose top-left corner is `(i, j)` is column
//!   `(j / stride) * vertical_shifts + (i / stride)`.

use log::debug;
use ndarray::{Array1, Array2};

use crate::core::{OscError, OscResult};

/// Patches cut from one image plus the bookkeeping needed to reassemble it.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSet {
    /// `(patch_size², num_patches)`: one flattened patch per column
    pub patches: Array2<f64>,
    /// Same shape as `patches`: flat pixel index each value was read from
    pub pixel_index: Array2<usize>,
    /// `height * width`: number of patches covering each flat pixel index
    pub counts: Array1<usize>,
    pub height: usize,
    pub width: usize,
    pub patch_size: usize,
    pub stride: usize,
}

/// Cut every `patch_size × patch_size` window at multiples of `stride`.
///
/// Valid top-left corners are `(i, j)` with `0 ≤ i ≤ height - patch_size`
/// and `0 ≤ j ≤ width - patch_size`. Pixels past the last window (when
/// `stride` does not divide the slack) are never covered.
///
/// # Errors
/// - `InvalidConfig` if `patch_size` or `stride` is zero, or the patch does
///   not fit in the image
pub fn extract_patches(image: &Array2<f64>, patch_size: usize, stride: usize) -> OscResult<PatchSet> {
    let (height, width) = image.dim();

    if patch_size == 0 || stride == 0 {
        return Err(OscError::InvalidConfig(format!(
            "patch_size and stride must be > 0 (got {} and {})",
            patch_size, stride
        )));
    }
    if patch_size > height || patch_size > width {
        return Err(OscError::InvalidConfig(format!(
            "Patch size {} does not fit in a {}x{} image",
            patch_size, height, width
        )));
    }

    let vertical_shifts = (height - patch_size) / stride + 1;
    let horizontal_shifts = (width - patch_size) / stride + 1;
    let patch_len = patch_size * patch_size;
    let num_patches = vertical_shifts * horizontal_shifts;

    let mut patches = Array2::zeros((patch_len, num_patches));
    let mut pixel_index = Array2::zeros((patch_len, num_patches));
    let mut counts = Array1::zeros(height * width);

    for (jj, j) in (0..=width - patch_size).step_by(stride).enumerate() {
        for (ii, i) in (0..=height - patch_size).step_by(stride).enumerate() {
            let p = jj * vertical_shifts + ii;
            for l in 0..patch_size {
                for k in 0..patch_size {
                    let entry = l * patch_size + k;
                    let pixel = (j + l) * height + (i + k);
                    patches[[entry, p]] = image[[i + k, j + l]];
                    pixel_index[[entry, p]] = pixel;
                    counts[pixel] += 1;
                }
            }
        }
    }

    debug!(
        "extracted {} patches ({}x{}, stride {}) from {}x{} image",
        num_patches, patch_size, patch_size, stride, height, width
    );

    Ok(PatchSet {
        patches,
        pixel_index,
        counts,
        height,
        width,
        patch_size,
        stride,
    })
}

impl PatchSet {
    /// Number of extracted patches.
    pub fn num_patches(&self) -> usize {
        self.patches.ncols()
    }

    /// Coverage counts laid out as a `(height, width)` image.
    pub fn counts_image(&self) -> Array2<usize> {
        let h = self.height;
        Array2::from_shape_fn((self.height, self.width), |(r, c)| self.counts[c * h + r])
    }

    /// Reassemble an image from patch values laid out like `self.patches`.
    ///
    /// Every value is added into the pixel recorded in `pixel_index` and the
    /// sum is divided by that pixel's coverage count. Pixels no patch
    /// covers come back as zero.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `values` does not have the shape of `self.patches`
    pub fn reconstruct(&self, values: &Array2<f64>) -> OscResult<Array2<f64>> {
        if values.dim() != self.patches.dim() {
            return Err(OscError::ShapeMismatch(format!(
                "Patch values: expected {:?}, got {:?}",
                self.patches.dim(),
                values.dim()
            )));
        }

        let mut sums = Array1::<f64>::zeros(self.height * self.width);
        for (&pixel, &v) in self.pixel_index.iter().zip(values.iter()) {
            sums[pixel] += v;
        }

        let h = self.height;
        Ok(Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            let pixel = c * h + r;
            match self.counts[pixel] {
                0 => 0.0,
                n => sums[pixel] / n as f64,
            }
        }))
    }
}
