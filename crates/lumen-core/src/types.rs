//! Common types for Lumen
//!
//! Fundamental pixel types shared by the Art-Net transport, the effects
//! compiler, and the animation scheduler.

/// Channels carried by one Art-Net universe.
pub const CHANNELS_PER_UNIVERSE: usize = 512;

/// Pixels with every channel below this value are treated as background
/// and bypass brightness scaling. The jump at the boundary is documented
/// behaviour.
pub const BLACK_THRESHOLD: u8 = 30;

/// One RGB pixel as sent to the device, one byte per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True when every channel is below [`BLACK_THRESHOLD`].
    pub fn is_near_black(&self) -> bool {
        self.r < BLACK_THRESHOLD && self.g < BLACK_THRESHOLD && self.b < BLACK_THRESHOLD
    }

    /// Multiplies each channel by `factor`, flooring to a byte. Near-black
    /// pixels pass through unscaled so dark artwork keeps its detail.
    pub fn scaled(&self, factor: f32) -> Rgb {
        if self.is_near_black() {
            return *self;
        }
        Rgb {
            r: (f32::from(self.r) * factor) as u8,
            g: (f32::from(self.g) * factor) as u8,
            b: (f32::from(self.b) * factor) as u8,
        }
    }
}

/// Ordered RGB pixels for one display session, row-major, fixed at
/// `width * height` for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Builds a grid from decoded pixels; `None` when the pixel count does
    /// not match the geometry.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Option<Self> {
        if pixels.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// A grid filled with a single colour.
    pub fn solid(width: usize, height: usize, colour: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![colour; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }
}
