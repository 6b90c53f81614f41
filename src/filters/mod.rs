//! Filter building blocks.
//!
//! ## Pixel Format
//!
//! Every filter works on packed `u32` pixels:
//!
//! | Bits | Channel |
//! |------|---------|
//! | 0-7 | red |
//! | 8-15 | green |
//! | 16-23 | blue |
//! | 24-31 | alpha |
//!
//! Alpha is preserved by every point and convolution filter.
//!
//! ## Filter Categories
//!
//! - **Pixel-wise** ([`point`]): invert, greyscale, contrast, brightness
//! - **3x3 convolution** ([`convolution`]): gaussian blur, sharpen, mean removal,
//!   smooth, emboss
//! - **Box-blur gaussian** ([`box_blur`]): separable three-pass approximation
//!
//! [`crate::FilterEngine`] runs the first two categories in parallel over a whole image.

pub mod box_blur;
pub mod convolution;
pub mod pixel;
pub mod point;
