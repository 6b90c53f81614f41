//! WebAssembly exports for ImageFilters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Data is passed
//! as flat RGBA bytes (length = width * height * 4). Filters run on a single
//! worker since wasm32 has no threads.

use ndarray::Array3;
use wasm_bindgen::prelude::*;

use crate::filters::box_blur;
use crate::{Bitmap, FilterEngine, FilterKind};

fn to_bitmap(data: &[u8], width: usize, height: usize) -> Result<Bitmap, JsError> {
    let input = Array3::from_shape_vec((height, width, 4), data.to_vec())?;
    Ok(Bitmap::from_rgba8(input.view())?)
}

fn to_bytes(bitmap: &Bitmap) -> Vec<u8> {
    bitmap.to_rgba8().into_raw_vec_and_offset().0
}

// ============================================================================
// Engine Filters
// ============================================================================

/// Apply a named filter to an RGBA image.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `kind` - Filter name, e.g. "invert", "sharpen"
/// * `value` - Parameter for contrast, brightness, sharpen, smooth, emboss
///
/// # Returns
/// Flat array of filtered RGBA bytes
#[wasm_bindgen]
pub fn filter_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    kind: &str,
    value: Option<f64>,
) -> Result<Vec<u8>, JsError> {
    let kind: FilterKind = kind.parse()?;
    let mut bitmap = to_bitmap(data, width, height)?;
    FilterEngine::with_workers(1)?.filter_bitmap(&mut bitmap, kind, value)?;
    Ok(to_bytes(&bitmap))
}

// ============================================================================
// Box-Blur Gaussian
// ============================================================================

/// Blur an RGBA image with three box passes approximating a gaussian.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `sigma` - Standard deviation of the approximated gaussian
#[wasm_bindgen]
pub fn gaussian_blur_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    sigma: f64,
) -> Result<Vec<u8>, JsError> {
    let mut bitmap = to_bitmap(data, width, height)?;
    box_blur::gaussian_blur_rgba(bitmap.pixels_mut(), width, height, sigma)?;
    Ok(to_bytes(&bitmap))
}
