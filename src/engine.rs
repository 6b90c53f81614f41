//! Filter dispatch over a whole image.
//!
//! [`FilterEngine::filter`] validates the request, then fans the work out
//! with [`run_parallel_mut`]:
//!
//! - **Point kinds** (invert, greyscale, contrast, brightness) rewrite each
//!   segment of the live buffer in place.
//! - **Neighborhood kinds** (gaussian blur, sharpen, mean removal, smooth,
//!   emboss) first copy the buffer into a shadow. Workers read windows from
//!   the shadow and write into their own segment of the live buffer. The
//!   shadow is dropped before `filter` returns.
//!
//! Segments are sized over the full pixel range and then clipped to the
//! interior span, so neighborhood filters never write the outer pixel ring.
//!
//! ## Failure policy
//!
//! Configuration errors are returned before any thread starts. If a worker
//! panics the call returns [`FilterError::WorkerPanicked`]; segments that had
//! already finished keep their new values (best effort, no rollback).

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::bitmap::Bitmap;
use crate::error::check_dimensions;
use crate::filters::convolution::{apply_kernel, is_interior, Kernel};
use crate::filters::point::PointFilter;
use crate::parallel::{default_workers, run_parallel_mut, Segment};
use crate::{FilterError, FilterResult};

/// Environment variable overriding the worker count in [`FilterEngine::from_env`].
pub const WORKERS_ENV: &str = "IMAGEFILTERS_WORKERS";

/// Every filter the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Invert,
    Greyscale,
    Contrast,
    Brightness,
    GaussianBlur,
    Sharpen,
    MeanRemoval,
    Smooth,
    Emboss,
}

/// What a kind resolves to once its parameter is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Point(PointFilter),
    Convolve(Kernel),
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::Invert,
        FilterKind::Greyscale,
        FilterKind::Contrast,
        FilterKind::Brightness,
        FilterKind::GaussianBlur,
        FilterKind::Sharpen,
        FilterKind::MeanRemoval,
        FilterKind::Smooth,
        FilterKind::Emboss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Invert => "invert",
            FilterKind::Greyscale => "greyscale",
            FilterKind::Contrast => "contrast",
            FilterKind::Brightness => "brightness",
            FilterKind::GaussianBlur => "gaussian_blur",
            FilterKind::Sharpen => "sharpen",
            FilterKind::MeanRemoval => "mean_removal",
            FilterKind::Smooth => "smooth",
            FilterKind::Emboss => "emboss",
        }
    }

    /// Neighborhood kinds read a 3x3 window and need a shadow copy.
    pub fn needs_shadow(self) -> bool {
        matches!(
            self,
            FilterKind::GaussianBlur
                | FilterKind::Sharpen
                | FilterKind::MeanRemoval
                | FilterKind::Smooth
                | FilterKind::Emboss
        )
    }

    /// Resolve the kind with its scalar parameter. Kinds without a parameter
    /// ignore `value`.
    pub fn operation(self, value: f64) -> Operation {
        match self {
            FilterKind::Invert => Operation::Point(PointFilter::Invert),
            FilterKind::Greyscale => Operation::Point(PointFilter::Greyscale),
            FilterKind::Contrast => Operation::Point(PointFilter::Contrast(value)),
            FilterKind::Brightness => Operation::Point(PointFilter::Brightness(value)),
            FilterKind::GaussianBlur => Operation::Convolve(Kernel::gaussian_blur()),
            FilterKind::Sharpen => Operation::Convolve(Kernel::sharpen(value)),
            FilterKind::MeanRemoval => Operation::Convolve(Kernel::mean_removal()),
            FilterKind::Smooth => Operation::Convolve(Kernel::smooth(value)),
            FilterKind::Emboss => Operation::Convolve(Kernel::emboss(value)),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "invert" => Ok(FilterKind::Invert),
            "greyscale" | "grayscale" => Ok(FilterKind::Greyscale),
            "contrast" => Ok(FilterKind::Contrast),
            "brightness" => Ok(FilterKind::Brightness),
            "gaussian_blur" | "gaussianblur" => Ok(FilterKind::GaussianBlur),
            "sharpen" => Ok(FilterKind::Sharpen),
            "mean_removal" | "meanremoval" => Ok(FilterKind::MeanRemoval),
            "smooth" => Ok(FilterKind::Smooth),
            "emboss" => Ok(FilterKind::Emboss),
            _ => Err(FilterError::UnknownFilter(s.to_string())),
        }
    }
}

/// Flat index span whose pixels can have interior positions:
/// `[width + 1, width * height - width - 1)`.
///
/// Empty when the image has no interior (either side shorter than 3).
pub fn interior_span(width: usize, height: usize) -> Segment {
    if width < 3 || height < 3 {
        return Segment::new(0, 0);
    }
    Segment::new(width + 1, width * height - width - 1)
}

/// Runs filters over caller-owned buffers on a fixed number of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEngine {
    workers: usize,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    /// Engine using one worker per available hardware thread.
    pub fn new() -> Self {
        Self {
            workers: default_workers(),
        }
    }

    /// Engine with an explicit worker count. Zero is rejected.
    pub fn with_workers(workers: usize) -> FilterResult<Self> {
        if workers == 0 {
            return Err(FilterError::InvalidWorkers(workers));
        }
        Ok(Self { workers })
    }

    /// Engine configured from [`WORKERS_ENV`], falling back to [`FilterEngine::new`]
    /// when the variable is unset.
    pub fn from_env() -> FilterResult<Self> {
        match parse_workers(std::env::var(WORKERS_ENV).ok().as_deref())? {
            Some(workers) => Self::with_workers(workers),
            None => Ok(Self::new()),
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `kind` to `pixels` in place.
    ///
    /// `value` feeds contrast, brightness, sharpen, smooth and emboss and
    /// defaults to `0.0`; other kinds ignore it. A zero-area image is a no-op.
    pub fn filter(
        &self,
        pixels: &mut [u32],
        width: usize,
        height: usize,
        kind: FilterKind,
        value: Option<f64>,
    ) -> FilterResult<()> {
        let count = check_dimensions(pixels.len(), width, height)?;
        let value = value.unwrap_or(0.0);
        if !value.is_finite() {
            return Err(FilterError::InvalidParameter(format!(
                "{kind} value must be finite, got {value}"
            )));
        }

        let operation = kind.operation(value);
        if let Operation::Convolve(kernel) = &operation {
            if !kernel.has_valid_factor() {
                return Err(FilterError::ZeroFactor(kind));
            }
        }
        if count == 0 {
            return Ok(());
        }

        debug!(
            filter = %kind,
            width,
            height,
            value,
            workers = self.workers,
            "applying filter"
        );

        match operation {
            Operation::Point(point) => self.run_point(pixels, point),
            Operation::Convolve(kernel) => self.run_convolution(pixels, width, height, &kernel),
        }
    }

    /// [`filter`](Self::filter) over a [`Bitmap`].
    pub fn filter_bitmap(
        &self,
        bitmap: &mut Bitmap,
        kind: FilterKind,
        value: Option<f64>,
    ) -> FilterResult<()> {
        let (width, height) = (bitmap.width(), bitmap.height());
        self.filter(bitmap.pixels_mut(), width, height, kind, value)
    }

    fn run_point(&self, pixels: &mut [u32], point: PointFilter) -> FilterResult<()> {
        run_parallel_mut(pixels, self.workers, |_, chunk| point.apply_slice(chunk))
    }

    fn run_convolution(
        &self,
        pixels: &mut [u32],
        width: usize,
        height: usize,
        kernel: &Kernel,
    ) -> FilterResult<()> {
        let shadow = pixels.to_vec();
        let interior = interior_span(width, height);

        run_parallel_mut(pixels, self.workers, |segment, chunk| {
            let active = segment.intersect(interior);
            for i in active.range() {
                if !is_interior(i, width, height) {
                    continue;
                }
                chunk[i - segment.from] = apply_kernel(&shadow, i, width, kernel);
            }
        })?;

        debug!(shadow_pixels = shadow.len(), "releasing shadow buffer");
        Ok(())
    }
}

fn parse_workers(raw: Option<&str>) -> FilterResult<Option<usize>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<usize>().map(Some).map_err(|_| {
        FilterError::InvalidParameter(format!("{WORKERS_ENV} must be a positive integer, got {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::pixel::{decode, encode};

    fn pattern(width: usize, height: usize) -> Vec<u32> {
        (0..width * height)
            .map(|i| {
                let h = (i as u32).wrapping_mul(2_654_435_761);
                0xFF00_0000 | (h >> 8)
            })
            .collect()
    }

    fn border_indices(width: usize, height: usize) -> Vec<usize> {
        (0..width * height)
            .filter(|&i| {
                let (x, y) = (i % width, i / width);
                x == 0 || y == 0 || x == width - 1 || y == height - 1
            })
            .collect()
    }

    fn engine(workers: usize) -> FilterEngine {
        FilterEngine::with_workers(workers).unwrap()
    }

    #[test]
    fn test_invert_white_4x4() {
        let mut pixels = vec![encode(255, 255, 255, 255); 16];
        engine(2).filter(&mut pixels, 4, 4, FilterKind::Invert, None).unwrap();
        for p in pixels {
            assert_eq!(decode(p), (255, 0, 0, 0));
        }
    }

    #[test]
    fn test_mean_removal_black_3x3_unchanged() {
        let original = vec![0xFF00_0000u32; 9];
        let mut pixels = original.clone();
        engine(4)
            .filter(&mut pixels, 3, 3, FilterKind::MeanRemoval, None)
            .unwrap();
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_neighborhood_filters_skip_border() {
        let (w, h) = (11, 7);
        let original = pattern(w, h);
        let value = Some(3.0);
        for kind in FilterKind::ALL.into_iter().filter(|k| k.needs_shadow()) {
            for workers in 1..=5 {
                let mut pixels = original.clone();
                engine(workers).filter(&mut pixels, w, h, kind, value).unwrap();
                for i in border_indices(w, h) {
                    assert_eq!(pixels[i], original[i], "{kind} wrote border pixel {i}");
                }
            }
        }
    }

    #[test]
    fn test_convolution_matches_sequential_reference() {
        let (w, h) = (17, 9);
        let original = pattern(w, h);
        for kind in FilterKind::ALL.into_iter().filter(|k| k.needs_shadow()) {
            let Operation::Convolve(kernel) = kind.operation(2.0) else {
                unreachable!()
            };
            let mut expected = original.clone();
            for i in 0..w * h {
                if is_interior(i, w, h) {
                    expected[i] = apply_kernel(&original, i, w, &kernel);
                }
            }

            let mut pixels = original.clone();
            engine(3).filter(&mut pixels, w, h, kind, Some(2.0)).unwrap();
            assert_eq!(pixels, expected, "{kind} differs from sequential reference");
        }
    }

    #[test]
    fn test_gaussian_interior_gets_offset() {
        let (w, h) = (5, 4);
        let mut pixels = vec![encode(255, 100, 100, 100); w * h];
        engine(2)
            .filter(&mut pixels, w, h, FilterKind::GaussianBlur, None)
            .unwrap();
        for i in 0..w * h {
            let expected = if is_interior(i, w, h) { 110 } else { 100 };
            assert_eq!(decode(pixels[i]).1, expected, "pixel {i}");
        }
    }

    #[test]
    fn test_point_filters_independent_of_worker_count() {
        let (w, h) = (23, 13);
        let original = pattern(w, h);
        let counts = [1, 2, default_workers()];
        for (kind, value) in [
            (FilterKind::Invert, None),
            (FilterKind::Greyscale, None),
            (FilterKind::Contrast, Some(35.0)),
            (FilterKind::Brightness, Some(-20.0)),
        ] {
            let results: Vec<Vec<u32>> = counts
                .iter()
                .map(|&n| {
                    let mut pixels = original.clone();
                    engine(n).filter(&mut pixels, w, h, kind, value).unwrap();
                    pixels
                })
                .collect();
            assert_eq!(results[0], results[1], "{kind}");
            assert_eq!(results[0], results[2], "{kind}");
        }
    }

    #[test]
    fn test_more_workers_than_pixels() {
        let mut pixels = vec![encode(255, 1, 2, 3); 3];
        engine(8).filter(&mut pixels, 3, 1, FilterKind::Invert, None).unwrap();
        assert!(pixels.iter().all(|&p| p == encode(255, 254, 253, 252)));
    }

    #[test]
    fn test_zero_area_is_noop() {
        let mut pixels: Vec<u32> = Vec::new();
        for kind in FilterKind::ALL {
            engine(2).filter(&mut pixels, 0, 5, kind, None).unwrap();
        }
    }

    #[test]
    fn test_size_mismatch() {
        let mut pixels = vec![0u32; 5];
        assert_eq!(
            engine(1).filter(&mut pixels, 2, 3, FilterKind::Invert, None),
            Err(FilterError::SizeMismatch { expected: 6, actual: 5 })
        );
    }

    #[test]
    fn test_zero_factor_rejected_before_work() {
        let original = pattern(4, 4);
        let mut pixels = original.clone();
        assert_eq!(
            engine(2).filter(&mut pixels, 4, 4, FilterKind::Sharpen, Some(8.0)),
            Err(FilterError::ZeroFactor(FilterKind::Sharpen))
        );
        assert_eq!(
            engine(2).filter(&mut pixels, 4, 4, FilterKind::Smooth, Some(-8.0)),
            Err(FilterError::ZeroFactor(FilterKind::Smooth))
        );
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let mut pixels = vec![0u32; 4];
        assert!(matches!(
            engine(1).filter(&mut pixels, 2, 2, FilterKind::Brightness, Some(f64::NAN)),
            Err(FilterError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_parse_kind() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.name().parse::<FilterKind>(), Ok(kind));
        }
        assert_eq!("Gaussian-Blur".parse(), Ok(FilterKind::GaussianBlur));
        assert_eq!("grayscale".parse(), Ok(FilterKind::Greyscale));
        assert_eq!(
            "sepia".parse::<FilterKind>(),
            Err(FilterError::UnknownFilter("sepia".into()))
        );
    }

    #[test]
    fn test_worker_config() {
        assert_eq!(FilterEngine::with_workers(0), Err(FilterError::InvalidWorkers(0)));
        assert_eq!(FilterEngine::with_workers(3).unwrap().workers(), 3);
        assert!(FilterEngine::new().workers() >= 1);
        assert_eq!(parse_workers(None), Ok(None));
        assert_eq!(parse_workers(Some("  ")), Ok(None));
        assert_eq!(parse_workers(Some(" 6 ")), Ok(Some(6)));
        assert!(parse_workers(Some("many")).is_err());
    }

    // Only test touching WORKERS_ENV, so no other test races on it
    #[test]
    fn test_from_env() {
        std::env::set_var(WORKERS_ENV, "3");
        assert_eq!(FilterEngine::from_env().map(|e| e.workers()), Ok(3));

        std::env::set_var(WORKERS_ENV, "0");
        assert_eq!(FilterEngine::from_env(), Err(FilterError::InvalidWorkers(0)));

        std::env::set_var(WORKERS_ENV, "lots");
        assert!(matches!(FilterEngine::from_env(), Err(FilterError::InvalidParameter(_))));

        std::env::remove_var(WORKERS_ENV);
        assert_eq!(FilterEngine::from_env().map(|e| e.workers()), Ok(default_workers()));
    }

    #[test]
    fn test_interior_span() {
        assert!(interior_span(2, 10).is_empty());
        assert!(interior_span(10, 2).is_empty());
        assert_eq!(interior_span(3, 3), Segment::new(4, 5));
        assert_eq!(interior_span(5, 4), Segment::new(6, 14));
    }

    #[test]
    fn test_filter_bitmap() {
        let mut bitmap = Bitmap::filled(3, 3, encode(255, 10, 10, 10)).unwrap();
        engine(2)
            .filter_bitmap(&mut bitmap, FilterKind::Brightness, Some(5.0))
            .unwrap();
        assert!(bitmap.pixels().iter().all(|&p| p == encode(255, 15, 15, 15)));
    }
}
