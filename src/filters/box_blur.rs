//! Gaussian blur approximated by three successive box blurs.
//!
//! [`widths_for`] picks box widths whose combined variance matches a gaussian
//! of the requested standard deviation. Each box blur is separable: a
//! horizontal moving average over every row followed by a vertical one over
//! every column. Window samples that fall outside the image repeat the edge
//! value.
//!
//! Buffer elements are treated as plain integers. Feed this path one value
//! per element (a single channel plane), or use [`gaussian_blur_rgba`] which
//! splits packed pixels into planes for you.
//!
//! Unlike the convolution filters this path covers the whole image, border
//! included.

use super::pixel::{decode, encode};
use crate::error::check_dimensions;
use crate::{FilterError, FilterResult};

/// Widest box [`widths_for`] hands out.
///
/// Keeps radii representable on 32-bit targets and window sums of `u32`
/// samples inside `i64`. Roughly `sigma <= 1.07e9`.
pub const MAX_BOX_WIDTH: usize = i32::MAX as usize;

/// Box widths approximating a gaussian of standard deviation `sigma`.
///
/// The ideal width `sqrt(12 sigma^2 / n + 1)` is floored and forced odd to
/// give `wl`; `wu = wl + 2`. The first `m` boxes use `wl` and the rest `wu`,
/// with `m = round((12 sigma^2 - n wl^2 - 4 n wl - 3 n) / (-4 wl - 4))`.
///
/// Fails for a negative or non-finite `sigma`, or when `wu` would exceed
/// [`MAX_BOX_WIDTH`].
pub fn widths_for(sigma: f64, box_count: usize) -> FilterResult<Vec<usize>> {
    check_sigma(sigma)?;
    if box_count == 0 {
        return Ok(Vec::new());
    }
    let n = box_count as f64;
    let variance12 = 12.0 * sigma * sigma;

    let ideal = (variance12 / n + 1.0).sqrt();
    let mut wl = ideal.floor();
    if wl % 2.0 == 0.0 {
        wl -= 1.0;
    }
    let wu = wl + 2.0;
    if wu > MAX_BOX_WIDTH as f64 {
        return Err(FilterError::InvalidParameter(format!(
            "sigma {sigma} needs box width {wu}, above {MAX_BOX_WIDTH}"
        )));
    }

    let m_ideal = (variance12 - n * wl * wl - 4.0 * n * wl - 3.0 * n) / (-4.0 * wl - 4.0);
    let m = m_ideal.round();

    Ok((0..box_count)
        .map(|i| if (i as f64) < m { wl as usize } else { wu as usize })
        .collect())
}

/// Three-pass box blur approximating a gaussian of standard deviation `sigma`.
///
/// Passes alternate direction: `source -> dest`, `dest -> source`,
/// `source -> dest`. The result lands in `dest`; `source` is overwritten with
/// intermediate data.
pub fn gaussian_blur4(
    source: &mut [u32],
    dest: &mut [u32],
    width: usize,
    height: usize,
    sigma: f64,
) -> FilterResult<()> {
    check_dimensions(source.len(), width, height)?;
    check_dimensions(dest.len(), width, height)?;
    let boxes = widths_for(sigma, 3)?;
    if source.is_empty() {
        return Ok(());
    }

    box_blur(source, dest, width, height, (boxes[0] - 1) / 2);
    box_blur(dest, source, width, height, (boxes[1] - 1) / 2);
    box_blur(source, dest, width, height, (boxes[2] - 1) / 2);
    Ok(())
}

/// Blur each channel of a packed RGBA buffer in place.
///
/// Splits the pixels into four planes, runs [`gaussian_blur4`] on each and
/// packs the results back.
pub fn gaussian_blur_rgba(
    pixels: &mut [u32],
    width: usize,
    height: usize,
    sigma: f64,
) -> FilterResult<()> {
    check_dimensions(pixels.len(), width, height)?;
    widths_for(sigma, 3)?;
    if pixels.is_empty() {
        return Ok(());
    }

    let mut planes: [Vec<u32>; 4] = Default::default();
    for plane in planes.iter_mut() {
        plane.reserve_exact(pixels.len());
    }
    for &p in pixels.iter() {
        let (a, r, g, b) = decode(p);
        planes[0].push(a as u32);
        planes[1].push(r as u32);
        planes[2].push(g as u32);
        planes[3].push(b as u32);
    }

    // Each plane swaps with the scratch buffer, so it ends up holding its blur
    let mut scratch = vec![0u32; pixels.len()];
    for plane in planes.iter_mut() {
        gaussian_blur4(plane, &mut scratch, width, height, sigma)?;
        std::mem::swap(plane, &mut scratch);
    }

    // Averages of 0-255 samples stay in 0-255
    for (i, p) in pixels.iter_mut().enumerate() {
        *p = encode(
            planes[0][i] as u8,
            planes[1][i] as u8,
            planes[2][i] as u8,
            planes[3][i] as u8,
        );
    }
    Ok(())
}

fn check_sigma(sigma: f64) -> FilterResult<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "sigma must be finite and >= 0, got {sigma}"
        )));
    }
    Ok(())
}

/// One box blur of radius `r`: copy `source` into `dest`, blur rows from
/// `dest` into `source`, then columns from `source` into `dest`.
fn box_blur(source: &mut [u32], dest: &mut [u32], width: usize, height: usize, r: usize) {
    if width == 0 || height == 0 {
        return;
    }
    dest.copy_from_slice(source);
    blur_horizontal(dest, source, width, r);
    blur_vertical(source, dest, width, height, r);
}

#[inline]
fn average(sum: i64, window: f64) -> u32 {
    (sum as f64 / window).round() as u32
}

/// Moving average of width `2r + 1` along each row.
fn blur_horizontal(src: &[u32], dst: &mut [u32], width: usize, r: usize) {
    let window = (2 * r + 1) as f64;
    let last = width as i64 - 1;
    let ri = r as i64;
    let head = r.min(width);

    for (row_in, row_out) in src.chunks_exact(width).zip(dst.chunks_exact_mut(width)) {
        let at = |x: i64| row_in[x.clamp(0, last) as usize] as i64;

        // Window for x = -1 covers [-1 - r, r - 1]: r + 1 copies of the first
        // sample, the first `head` samples, then copies of the last one.
        let mut sum = (ri + 1) * at(0)
            + row_in[..head].iter().map(|&v| v as i64).sum::<i64>()
            + (r - head) as i64 * at(last);
        for (x, out) in row_out.iter_mut().enumerate() {
            let x = x as i64;
            sum += at(x + ri) - at(x - ri - 1);
            *out = average(sum, window);
        }
    }
}

/// Moving average of height `2r + 1` down each column.
///
/// Columns are advanced together one row at a time so reads stay row-major.
fn blur_vertical(src: &[u32], dst: &mut [u32], width: usize, height: usize, r: usize) {
    let window = (2 * r + 1) as f64;
    let last = height as i64 - 1;
    let ri = r as i64;
    let head = r.min(height);
    let at = |y: i64, x: usize| src[y.clamp(0, last) as usize * width + x] as i64;

    let mut sums: Vec<i64> = (0..width)
        .map(|x| {
            (ri + 1) * at(0, x)
                + (0..head).map(|y| at(y as i64, x)).sum::<i64>()
                + (r - head) as i64 * at(last, x)
        })
        .collect();

    for (y, row_out) in dst.chunks_exact_mut(width).enumerate() {
        let y = y as i64;
        for (x, (sum, out)) in sums.iter_mut().zip(row_out.iter_mut()).enumerate() {
            *sum += at(y + ri, x) - at(y - ri - 1, x);
            *out = average(*sum, window);
        }
    }
}
