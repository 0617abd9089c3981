//! Raster value type handed between the renderer and effects

use crate::error::PixelError;

use super::mode::{Pixel, PixelMode};

/// A rendered raster in one of the supported [`PixelMode`] encodings.
///
/// Construction validates that the sample data length matches the
/// dimensions and mode exactly, that a palette is present only for
/// [`PixelMode::Palette`], and that every index lies inside the palette.
/// Padding bits at the end of 1-bit rows are always zero, so two buffers
/// holding the same pixels compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: PixelMode,
    data: Vec<u8>,
    palette: Option<Vec<[u8; 3]>>,
}

impl PixelBuffer {
    /// Wrap raw sample data for a direct-colour, greyscale or bilevel mode
    pub fn new(width: u32, height: u32, mode: PixelMode, data: Vec<u8>) -> Result<Self, PixelError> {
        if mode.is_indexed() {
            return Err(PixelError::MissingPalette);
        }
        Self::from_parts(width, height, mode, data, None)
    }

    /// Wrap palette indices together with their palette
    pub fn with_palette(
        width: u32,
        height: u32,
        data: Vec<u8>,
        palette: Vec<[u8; 3]>,
    ) -> Result<Self, PixelError> {
        Self::from_parts(width, height, PixelMode::Palette, data, Some(palette))
    }

    /// Build a buffer from its parts, validating every invariant.
    ///
    /// Row padding bits in 1-bit modes are cleared rather than rejected.
    pub fn from_parts(
        width: u32,
        height: u32,
        mode: PixelMode,
        data: Vec<u8>,
        palette: Option<Vec<[u8; 3]>>,
    ) -> Result<Self, PixelError> {
        let expected = mode
            .data_len(width, height)
            .ok_or(PixelError::DimensionsOverflow)?;
        if data.len() != expected {
            return Err(PixelError::DataLength {
                mode,
                expected,
                actual: data.len(),
            });
        }

        match (&palette, mode.is_indexed()) {
            (None, true) => return Err(PixelError::MissingPalette),
            (Some(_), false) => return Err(PixelError::UnexpectedPalette { mode }),
            (Some(entries), true) => {
                if entries.is_empty() || entries.len() > 256 {
                    return Err(PixelError::PaletteSize(entries.len()));
                }
                if let Some(&index) = data.iter().find(|&&i| usize::from(i) >= entries.len()) {
                    return Err(PixelError::PaletteIndex {
                        index,
                        len: entries.len(),
                    });
                }
            }
            (None, false) => {}
        }

        let mut buffer = Self {
            width,
            height,
            mode,
            data,
            palette,
        };
        buffer.clear_padding();
        Ok(buffer)
    }

    /// Zero the bits past the last pixel of every 1-bit row
    pub(crate) fn clear_padding(&mut self) {
        let used = self.width % 8;
        if self.mode.bits_per_pixel() != 1 || used == 0 {
            return;
        }
        let mask = match self.mode {
            PixelMode::BilevelReversed => (1u8 << used) - 1,
            _ => 0xFF << (8 - used),
        };
        let stride = (self.width as usize).div_ceil(8);
        for row in self.data.chunks_exact_mut(stride) {
            if let Some(last) = row.last_mut() {
                *last &= mask;
            }
        }
    }

    /// A buffer of all-zero samples
    pub fn zeroed(width: u32, height: u32, mode: PixelMode) -> Result<Self, PixelError> {
        let len = mode
            .data_len(width, height)
            .ok_or(PixelError::DimensionsOverflow)?;
        Self::new(width, height, mode, vec![0; len])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height as a pair
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> PixelMode {
        self.mode
    }

    /// Raw sample data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Companion palette, present only in [`PixelMode::Palette`]
    pub fn palette(&self) -> Option<&[[u8; 3]]> {
        self.palette.as_deref()
    }

    /// Mutable access to the samples.
    ///
    /// The length cannot change. Palette-indexed buffers are not exposed
    /// here since writes could break the index bound. Padding bits written
    /// into 1-bit rows are ignored by reads and cleared when the invoker
    /// takes the buffer back from an effect.
    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        if self.mode.is_indexed() {
            None
        } else {
            Some(&mut self.data)
        }
    }

    /// Take the buffer apart into its raw data and palette
    pub fn into_parts(self) -> (Vec<u8>, Option<Vec<[u8; 3]>>) {
        (self.data, self.palette)
    }

    /// Read one pixel in the buffer's native encoding
    pub fn sample_at(&self, x: u32, y: u32) -> Result<Pixel, PixelError> {
        if x >= self.width || y >= self.height {
            return Err(PixelError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let (x, y, w) = (x as usize, y as usize, self.width as usize);
        let d = &self.data;

        let pixel = match self.mode {
            PixelMode::Bilevel | PixelMode::BilevelInverted => {
                let byte = d[y * w.div_ceil(8) + x / 8];
                Pixel::Bit(byte & (0x80 >> (x % 8)) != 0)
            }
            PixelMode::BilevelReversed => {
                let byte = d[y * w.div_ceil(8) + x / 8];
                Pixel::Bit(byte & (1 << (x % 8)) != 0)
            }
            PixelMode::Grey | PixelMode::GreyInverted => Pixel::Grey(d[y * w + x]),
            PixelMode::Palette => Pixel::Index(d[y * w + x]),
            PixelMode::Rgb => {
                let i = (y * w + x) * 3;
                Pixel::Rgb([d[i], d[i + 1], d[i + 2]])
            }
            PixelMode::Bgr => {
                let i = (y * w + x) * 3;
                Pixel::Bgr([d[i], d[i + 1], d[i + 2]])
            }
            PixelMode::Bgrx => {
                let i = (y * w + x) * 4;
                Pixel::Bgrx([d[i], d[i + 1], d[i + 2], d[i + 3]])
            }
            PixelMode::RgbPlanar => {
                let plane = w * self.height as usize;
                let i = y * w + x;
                Pixel::Rgb([d[i], d[plane + i], d[2 * plane + i]])
            }
        };
        Ok(pixel)
    }
}
