//! Owned packed-pixel image.
//!
//! [`Bitmap`] is plain data: a row-major `Vec<u32>` plus its dimensions.
//! Filters borrow its pixels for the duration of a call and keep nothing.
//!
//! ## Array interop
//!
//! Conversions to and from `(height, width, channels)` `u8` arrays accept the
//! same layouts as the rest of the crate's bindings:
//!
//! | Channels | Layout | Alpha on import |
//! |----------|--------|-----------------|
//! | 1 | grey | 255 |
//! | 3 | RGB | 255 |
//! | 4 | RGBA | from array |
//!
//! Export is always RGBA.

use ndarray::{Array3, ArrayView3};

use crate::error::check_dimensions;
use crate::filters::pixel::{decode, encode, PixelView};
use crate::{FilterError, FilterResult};

/// Row-major packed RGBA image with no row padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Bitmap {
    /// Wrap an existing buffer. `pixels.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> FilterResult<Self> {
        check_dimensions(pixels.len(), width, height)?;
        Ok(Self { width, height, pixels })
    }

    /// Image with every pixel set to `pixel`.
    pub fn filled(width: usize, height: usize, pixel: u32) -> FilterResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(FilterError::DimensionOverflow)?;
        Ok(Self {
            width,
            height,
            pixels: vec![pixel; len],
        })
    }

    /// Build from a `(height, width, channels)` array with 1, 3 or 4 channels.
    pub fn from_rgba8(input: ArrayView3<u8>) -> FilterResult<Self> {
        let (height, width, channels) = input.dim();
        let mut pixels = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let p = match channels {
                    1 => {
                        let v = input[[y, x, 0]];
                        encode(255, v, v, v)
                    }
                    3 => encode(255, input[[y, x, 0]], input[[y, x, 1]], input[[y, x, 2]]),
                    4 => encode(
                        input[[y, x, 3]],
                        input[[y, x, 0]],
                        input[[y, x, 1]],
                        input[[y, x, 2]],
                    ),
                    _ => {
                        return Err(FilterError::InvalidParameter(format!(
                            "expected 1, 3 or 4 channels, got {channels}"
                        )))
                    }
                };
                pixels.push(p);
            }
        }

        Ok(Self { width, height, pixels })
    }

    /// Export as a `(height, width, 4)` RGBA array.
    pub fn to_rgba8(&self) -> Array3<u8> {
        let mut output = Array3::<u8>::zeros((self.height, self.width, 4));
        for (i, &p) in self.pixels.iter().enumerate() {
            let (y, x) = (i / self.width, i % self.width);
            let (a, r, g, b) = decode(p);
            output[[y, x, 0]] = r;
            output[[y, x, 1]] = g;
            output[[y, x, 2]] = b;
            output[[y, x, 3]] = a;
        }
        output
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Clear every pixel to `0` (transparent black).
    pub fn zero(&mut self) {
        self.pixels.fill(0);
    }

    /// Run a tone curve over every pixel's 24-bit RGB field.
    ///
    /// See [`PixelView::apply`].
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        for slot in self.pixels.iter_mut() {
            let mut view = PixelView::bind(slot);
            view.apply(&f);
            view.commit();
        }
    }

    /// Replace every pixel with `f(pixel)`.
    pub fn map_pixels<F>(&mut self, f: F)
    where
        F: Fn(u32) -> u32,
    {
        for p in self.pixels.iter_mut() {
            *p = f(*p);
        }
    }
}
