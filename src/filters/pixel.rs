//! Packed pixel decomposition.
//!
//! A pixel is a `u32` with red in bits 0-7, green in 8-15, blue in 16-23 and
//! alpha in 24-31. Filters work through [`PixelView`], which splits a slot into
//! alpha plus a 24-bit RGB field and writes the result back on [`PixelView::commit`].

const RGB_MASK: u32 = 0x00FF_FFFF;
const RGB_MAX: f64 = RGB_MASK as f64;

/// Split a packed pixel into `(alpha, red, green, blue)`.
#[inline]
pub fn decode(pixel: u32) -> (u8, u8, u8, u8) {
    (
        (pixel >> 24) as u8,
        pixel as u8,
        (pixel >> 8) as u8,
        (pixel >> 16) as u8,
    )
}

/// Recombine channels into a packed pixel.
#[inline]
pub fn encode(alpha: u8, red: u8, green: u8, blue: u8) -> u32 {
    ((alpha as u32) << 24) | ((blue as u32) << 16) | ((green as u32) << 8) | red as u32
}

/// Clamp a channel value to 0-255.
///
/// Fractions are truncated toward zero, like an integer cast. Callers that
/// want rounding round before clamping.
#[inline]
pub fn clamp_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Read-modify-write handle over one pixel slot.
///
/// Changes stay local to the view until [`commit`](Self::commit) is called.
/// `commit` consumes the view, so a slot is written at most once per view;
/// dropping a view without committing leaves the slot as it was.
#[must_use = "a PixelView does nothing until it is committed"]
#[derive(Debug)]
pub struct PixelView<'a> {
    slot: &'a mut u32,
    alpha: u8,
    rgb: u32,
}

impl<'a> PixelView<'a> {
    /// Bind a view to a buffer slot, decoding its current value.
    #[inline]
    pub fn bind(slot: &'a mut u32) -> Self {
        let value = *slot;
        Self {
            slot,
            alpha: (value >> 24) as u8,
            rgb: value & RGB_MASK,
        }
    }

    #[inline]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    #[inline]
    pub fn red(&self) -> u8 {
        self.rgb as u8
    }

    #[inline]
    pub fn green(&self) -> u8 {
        (self.rgb >> 8) as u8
    }

    #[inline]
    pub fn blue(&self) -> u8 {
        (self.rgb >> 16) as u8
    }

    /// Combined 24-bit RGB field.
    #[inline]
    pub fn rgb(&self) -> u32 {
        self.rgb
    }

    #[inline]
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    #[inline]
    pub fn set_red(&mut self, red: u8) {
        self.rgb = (self.rgb & 0xFFFF00) | red as u32;
    }

    #[inline]
    pub fn set_green(&mut self, green: u8) {
        self.rgb = (self.rgb & 0xFF00FF) | ((green as u32) << 8);
    }

    #[inline]
    pub fn set_blue(&mut self, blue: u8) {
        self.rgb = (self.rgb & 0x00FFFF) | ((blue as u32) << 16);
    }

    #[inline]
    pub fn set_rgb(&mut self, red: u8, green: u8, blue: u8) {
        self.rgb = red as u32 | ((green as u32) << 8) | ((blue as u32) << 16);
    }

    /// Apply a tone curve to the whole RGB field.
    ///
    /// The 24-bit field is normalized to 0.0-1.0, passed through `f`, made
    /// absolute and scaled back to the nearest integer. Results above 1.0
    /// saturate at `0xFFFFFF`.
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        let normalized = self.rgb as f64 / RGB_MAX;
        let mapped = (f(normalized).abs() * RGB_MAX).round();
        self.rgb = mapped.min(RGB_MAX) as u32;
    }

    /// Value that [`commit`](Self::commit) would write.
    #[inline]
    pub fn packed(&self) -> u32 {
        ((self.alpha as u32) << 24) | self.rgb
    }

    /// Write alpha and RGB back to the bound slot.
    #[inline]
    pub fn commit(self) -> u32 {
        let value = self.packed();
        *self.slot = value;
        value
    }
}
