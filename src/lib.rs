//! ImageFilters
//!
//! Parallel filters over packed 32-bit RGBA bitmaps, with optional Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Pixel Format
//! A pixel is a `u32`: red in bits 0-7, green 8-15, blue 16-23, alpha 24-31.
//! Buffers are row-major with no row padding, `width * height` pixels long.
//!
//! ## Filters
//! - **Point**: invert, greyscale, contrast, brightness
//! - **3x3 convolution**: gaussian blur, sharpen, mean removal, smooth, emboss
//!   (the outer pixel ring is left untouched)
//! - **Box-blur gaussian**: three separable box passes sized from a sigma
//!
//! ## Example
//!
//! ```rust
//! use imagefilters::{FilterEngine, FilterKind};
//!
//! let (width, height) = (4, 4);
//! let mut pixels = vec![0xFFFF_FFFFu32; width * height];
//!
//! let engine = FilterEngine::with_workers(2).unwrap();
//! engine.filter(&mut pixels, width, height, FilterKind::Invert, None).unwrap();
//! assert!(pixels.iter().all(|&p| p == 0xFF00_0000));
//! ```

pub mod bitmap;
pub mod engine;
mod error;
pub mod filters;
pub mod parallel;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bitmap::Bitmap;
pub use engine::{FilterEngine, FilterKind};
pub use error::{FilterError, FilterResult};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::filters::box_blur;
    use crate::{Bitmap, FilterEngine, FilterError, FilterKind};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    // ========================================================================
    // Engine Filters
    // ========================================================================

    /// Apply a named filter to an image with 1, 3 or 4 channels.
    ///
    /// Output is always RGBA u8 with the same height and width.
    ///
    /// # Arguments
    /// * `image` - Input image (height, width, channels) as u8
    /// * `kind` - Filter name, e.g. "invert", "gaussian_blur", "emboss"
    /// * `value` - Parameter for contrast, brightness, sharpen, smooth, emboss
    /// * `workers` - Worker threads (default: hardware concurrency)
    #[pyfunction]
    #[pyo3(signature = (image, kind, value=None, workers=None))]
    pub fn filter_rgba<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        kind: &str,
        value: Option<f64>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let kind: FilterKind = kind.parse()?;
        let engine = match workers {
            Some(n) => FilterEngine::with_workers(n)?,
            None => FilterEngine::new(),
        };
        let mut bitmap = Bitmap::from_rgba8(image.as_array())?;
        py.allow_threads(|| engine.filter_bitmap(&mut bitmap, kind, value))?;
        Ok(bitmap.to_rgba8().into_pyarray(py))
    }

    // ========================================================================
    // Box-Blur Gaussian
    // ========================================================================

    /// Blur every channel with three box passes approximating a gaussian.
    ///
    /// # Arguments
    /// * `image` - Input image (height, width, channels) as u8
    /// * `sigma` - Standard deviation of the approximated gaussian
    #[pyfunction]
    pub fn gaussian_blur_rgba<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        sigma: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let mut bitmap = Bitmap::from_rgba8(image.as_array())?;
        let (width, height) = (bitmap.width(), bitmap.height());
        py.allow_threads(|| {
            box_blur::gaussian_blur_rgba(bitmap.pixels_mut(), width, height, sigma)
        })?;
        Ok(bitmap.to_rgba8().into_pyarray(py))
    }

    /// Box widths used to approximate a gaussian of standard deviation `sigma`.
    #[pyfunction]
    #[pyo3(signature = (sigma, count=3))]
    pub fn box_widths(sigma: f64, count: usize) -> PyResult<Vec<usize>> {
        Ok(box_blur::widths_for(sigma, count)?)
    }

    /// ImageFilters Rust extension module
    #[pymodule]
    pub fn imagefilters(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(filter_rgba, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian_blur_rgba, m)?)?;
        m.add_function(wrap_pyfunction!(box_widths, m)?)?;
        m.add("FILTERS", FilterKind::ALL.map(FilterKind::name).to_vec())?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::imagefilters;
