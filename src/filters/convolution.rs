//! 3x3 convolution filters: Gaussian Blur, Sharpen, Mean Removal, Smooth, Emboss.
//!
//! A [`Kernel`] is a fixed 3x3 weight matrix plus a divisor (`factor`) and an
//! additive `offset`. [`apply_kernel`] reads the window around one pixel of a
//! source buffer and returns the new packed value for that pixel.
//!
//! ## Boundary policy
//!
//! The window is only defined for interior pixels. The outer one-pixel ring
//! of an image is never written by these filters; callers skip it (see
//! [`is_interior`]).

use super::pixel::{clamp_channel, decode, encode};
use crate::{FilterError, FilterResult};

/// Fixed 3x3 kernel with divisor and offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    /// Row-major weights; `weights[1][1]` is the centre.
    pub weights: [[f64; 3]; 3],
    /// Divisor applied to the weighted sum.
    pub factor: f64,
    /// Added after division.
    pub offset: f64,
}

impl Kernel {
    /// Build a custom kernel. `factor` must be non-zero.
    pub fn new(weights: [[f64; 3]; 3], factor: f64, offset: f64) -> FilterResult<Self> {
        let kernel = Self { weights, factor, offset };
        if !kernel.has_valid_factor() {
            return Err(FilterError::InvalidParameter(format!(
                "kernel factor must be non-zero and finite, got {factor}"
            )));
        }
        Ok(kernel)
    }

    /// `[[1,2,1],[2,4,2],[1,2,1]] / 16 + 10`
    pub fn gaussian_blur() -> Self {
        Self {
            weights: [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]],
            factor: 16.0,
            offset: 10.0,
        }
    }

    /// Cross of `-2` around a centre of `weight`, divided by `weight - 8`.
    ///
    /// `weight == 8` gives a zero factor.
    pub fn sharpen(weight: f64) -> Self {
        Self {
            weights: [[0.0, -2.0, 0.0], [-2.0, weight, -2.0], [0.0, -2.0, 0.0]],
            factor: weight - 8.0,
            offset: 0.0,
        }
    }

    /// `[[-1,-1,-1],[-1,9,-1],[-1,-1,-1]]`, factor 1.
    pub fn mean_removal() -> Self {
        Self {
            weights: [[-1.0, -1.0, -1.0], [-1.0, 9.0, -1.0], [-1.0, -1.0, -1.0]],
            factor: 1.0,
            offset: 0.0,
        }
    }

    /// All-ones window divided by `value + 8`, offset 1.
    ///
    /// `value == -8` gives a zero factor.
    pub fn smooth(value: f64) -> Self {
        Self {
            weights: [[1.0; 3]; 3],
            factor: value + 8.0,
            offset: 1.0,
        }
    }

    /// `[[-1,0,-1],[0,4,0],[-1,0,-1]]`, factor 1, offset `value`.
    pub fn emboss(value: f64) -> Self {
        Self {
            weights: [[-1.0, 0.0, -1.0], [0.0, 4.0, 0.0], [-1.0, 0.0, -1.0]],
            factor: 1.0,
            offset: value,
        }
    }

    /// False when the factor is zero or not finite.
    #[inline]
    pub fn has_valid_factor(&self) -> bool {
        self.factor != 0.0 && self.factor.is_finite()
    }
}

/// True if the pixel at flat `index` has all eight neighbours inside the image.
#[inline]
pub fn is_interior(index: usize, width: usize, height: usize) -> bool {
    let (x, y) = (index % width, index / width);
    x >= 1 && y >= 1 && x + 1 < width && y + 1 < height
}

/// Convolve the 3x3 window centred on `dest_index`.
///
/// Reads `source[dest_index - width - 1 ..= dest_index + width + 1]` and
/// returns the filtered pixel. Alpha is taken from the centre pixel. Each
/// channel is `clamp(sum / factor + offset)`, truncated toward zero. The
/// weighted sum itself accumulates in `f64`, so fractional weights are not
/// truncated per sample.
///
/// `dest_index` must be an interior pixel (see [`is_interior`]).
#[inline]
pub fn apply_kernel(source: &[u32], dest_index: usize, width: usize, kernel: &Kernel) -> u32 {
    debug_assert!(dest_index > width && dest_index + width + 1 < source.len());

    let top_left = dest_index - width - 1;
    let mut sum = [0.0f64; 3];

    for (i, row) in kernel.weights.iter().enumerate() {
        let row_start = top_left + i * width;
        for (j, &w) in row.iter().enumerate() {
            let (_, r, g, b) = decode(source[row_start + j]);
            sum[0] += r as f64 * w;
            sum[1] += g as f64 * w;
            sum[2] += b as f64 * w;
        }
    }

    let (alpha, _, _, _) = decode(source[dest_index]);
    let channel = |s: f64| clamp_channel(s / kernel.factor + kernel.offset);
    encode(alpha, channel(sum[0]), channel(sum[1]), channel(sum[2]))
}
