//! Point filters: Invert, Greyscale, Contrast, Brightness.
//!
//! These are pixel-wise operations that don't require spatial context. Each
//! one mutates the RGB channels of a bound [`PixelView`] and leaves alpha
//! alone; the caller commits the view afterwards.

use super::pixel::{clamp_channel, PixelView};

// Rec. 601 luma coefficients
const GS_RED: f64 = 0.299;
const GS_GREEN: f64 = 0.587;
const GS_BLUE: f64 = 0.114;

/// A point filter together with its parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointFilter {
    Invert,
    Greyscale,
    /// Contrast in percent; 0 is no change.
    Contrast(f64),
    /// Offset added to every channel; 0 is no change.
    Brightness(f64),
}

impl PointFilter {
    /// Apply the filter to one view.
    #[inline]
    pub fn apply(&self, view: &mut PixelView<'_>) {
        match *self {
            PointFilter::Invert => invert(view),
            PointFilter::Greyscale => greyscale(view),
            PointFilter::Contrast(value) => contrast(view, value),
            PointFilter::Brightness(value) => brightness(view, value),
        }
    }

    /// Apply the filter to every pixel of `pixels`, committing each one.
    pub fn apply_slice(&self, pixels: &mut [u32]) {
        for slot in pixels.iter_mut() {
            let mut view = PixelView::bind(slot);
            self.apply(&mut view);
            view.commit();
        }
    }
}

// ============================================================================
// Invert
// ============================================================================

/// Each channel becomes `255 - channel`.
#[inline]
pub fn invert(view: &mut PixelView<'_>) {
    let (r, g, b) = (view.red(), view.green(), view.blue());
    view.set_rgb(255 - r, 255 - g, 255 - b);
}

// ============================================================================
// Greyscale
// ============================================================================

/// Replace RGB with the rounded Rec. 601 luma.
#[inline]
pub fn greyscale(view: &mut PixelView<'_>) {
    let luma = GS_RED * view.red() as f64
        + GS_GREEN * view.green() as f64
        + GS_BLUE * view.blue() as f64;
    let c = clamp_channel(luma.round());
    view.set_rgb(c, c, c);
}

// ============================================================================
// Contrast
// ============================================================================

/// Stretch channels around mid-grey by `((100 + value) / 100)^2`.
#[inline]
pub fn contrast(view: &mut PixelView<'_>, value: f64) {
    let factor = ((100.0 + value) / 100.0).powi(2);
    let adjust = |c: u8| {
        let v = ((c as f64 / 255.0 - 0.5) * factor + 0.5) * 255.0;
        clamp_channel(v.round())
    };
    let (r, g, b) = (adjust(view.red()), adjust(view.green()), adjust(view.blue()));
    view.set_rgb(r, g, b);
}

// ============================================================================
// Brightness
// ============================================================================

/// Add `value` to each channel.
#[inline]
pub fn brightness(view: &mut PixelView<'_>, value: f64) {
    let adjust = |c: u8| clamp_channel((c as f64 + value).round());
    let (r, g, b) = (adjust(view.red()), adjust(view.green()), adjust(view.blue()));
    view.set_rgb(r, g, b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::pixel::{decode, encode};

    fn run(filter: PointFilter, pixel: u32) -> u32 {
        let mut slot = pixel;
        let mut view = PixelView::bind(&mut slot);
        filter.apply(&mut view);
        view.commit()
    }

    fn sample_pixels() -> Vec<u32> {
        let mut out = Vec::new();
        for a in [0u8, 128, 255] {
            for r in (0..=255u8).step_by(51) {
                for g in (0..=255u8).step_by(85) {
                    for b in [0u8, 1, 127, 254, 255] {
                        out.push(encode(a, r, g, b));
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_invert_is_involution() {
        for p in sample_pixels() {
            let once = run(PointFilter::Invert, p);
            assert_eq!(run(PointFilter::Invert, once), p);
        }
    }

    #[test]
    fn test_invert_white() {
        let out = run(PointFilter::Invert, encode(255, 255, 255, 255));
        assert_eq!(decode(out), (255, 0, 0, 0));
    }

    #[test]
    fn test_greyscale_idempotent() {
        for p in sample_pixels() {
            let once = run(PointFilter::Greyscale, p);
            assert_eq!(run(PointFilter::Greyscale, once), once);
        }
    }

    #[test]
    fn test_greyscale_red() {
        let (a, r, g, b) = decode(run(PointFilter::Greyscale, encode(200, 255, 0, 0)));
        // 0.299 * 255 = 76.245
        assert_eq!((a, r, g, b), (200, 76, 76, 76));
    }

    #[test]
    fn test_contrast_zero_is_identity() {
        for p in sample_pixels() {
            assert_eq!(run(PointFilter::Contrast(0.0), p), p);
        }
    }

    #[test]
    fn test_contrast_stretches_and_clamps() {
        let (_, r, g, b) = decode(run(PointFilter::Contrast(100.0), encode(255, 10, 128, 250)));
        assert_eq!(r, 0);
        assert!((g as i32 - 129).abs() <= 1);
        assert_eq!(b, 255);
    }

    #[test]
    fn test_contrast_minus_hundred_flattens() {
        let (_, r, g, b) = decode(run(PointFilter::Contrast(-100.0), encode(255, 0, 77, 255)));
        assert_eq!((r, g, b), (128, 128, 128));
    }

    #[test]
    fn test_brightness_zero_is_identity() {
        for p in sample_pixels() {
            assert_eq!(run(PointFilter::Brightness(0.0), p), p);
        }
    }

    #[test]
    fn test_brightness_clamps() {
        let (a, r, g, b) = decode(run(PointFilter::Brightness(50.0), encode(9, 10, 220, 128)));
        assert_eq!((a, r, g, b), (9, 60, 255, 178));
        let (_, r, g, b) = decode(run(PointFilter::Brightness(-50.0), encode(9, 10, 220, 128)));
        assert_eq!((r, g, b), (0, 170, 78));
    }

    #[test]
    fn test_apply_slice() {
        let mut pixels = vec![encode(255, 255, 255, 255); 4];
        PointFilter::Invert.apply_slice(&mut pixels);
        assert!(pixels.iter().all(|&p| p == encode(255, 0, 0, 0)));
    }
}
