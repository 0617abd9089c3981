//! Pixel encodings
//!
//! The ten raw encodings a rendered layer may arrive in. Layouts must match
//! the rendering engine's encoders bit for bit:
//!
//! | mode | bits/px | layout |
//! |---|---|---|
//! | `Bilevel` | 1 | 0=black, 1=white, MSB-first |
//! | `BilevelInverted` | 1 | 0=white, 1=black, MSB-first |
//! | `BilevelReversed` | 1 | 0=black, 1=white, LSB-first |
//! | `Grey` | 8 | 0=black, 255=white |
//! | `GreyInverted` | 8 | 0=white, 255=black |
//! | `Palette` | 8 | index into companion palette |
//! | `Rgb` | 24 | R, G, B |
//! | `Bgr` | 24 | B, G, R |
//! | `Bgrx` | 32 | B, G, R, unused pad |
//! | `RgbPlanar` | 24 | R plane, G plane, B plane |
//!
//! 1-bit rows are padded to a whole byte.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Raw encoding of a [`PixelBuffer`](super::PixelBuffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelMode {
    Bilevel,
    BilevelInverted,
    BilevelReversed,
    Grey,
    GreyInverted,
    Palette,
    Rgb,
    Bgr,
    Bgrx,
    RgbPlanar,
}

/// Conversion families. Modes within a family convert losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModeFamily {
    Bilevel,
    Grey,
    Indexed,
    Direct,
}

impl PixelMode {
    /// Every mode, in table order
    pub const ALL: [PixelMode; 10] = [
        PixelMode::Bilevel,
        PixelMode::BilevelInverted,
        PixelMode::BilevelReversed,
        PixelMode::Grey,
        PixelMode::GreyInverted,
        PixelMode::Palette,
        PixelMode::Rgb,
        PixelMode::Bgr,
        PixelMode::Bgrx,
        PixelMode::RgbPlanar,
    ];

    /// Bits occupied by one pixel
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelMode::Bilevel | PixelMode::BilevelInverted | PixelMode::BilevelReversed => 1,
            PixelMode::Grey | PixelMode::GreyInverted | PixelMode::Palette => 8,
            PixelMode::Rgb | PixelMode::Bgr | PixelMode::RgbPlanar => 24,
            PixelMode::Bgrx => 32,
        }
    }

    /// Whether samples index a companion palette
    pub fn is_indexed(self) -> bool {
        self == PixelMode::Palette
    }

    /// Bytes needed to store one row of `width` pixels.
    ///
    /// For `RgbPlanar` this is the row's share across all three planes.
    pub fn row_bytes(self, width: u32) -> Option<usize> {
        let width = usize::try_from(width).ok()?;
        match self.bits_per_pixel() {
            1 => Some(width.div_ceil(8)),
            bits => width.checked_mul(bits as usize / 8),
        }
    }

    /// Exact raw data length for a `width` x `height` buffer
    pub fn data_len(self, width: u32, height: u32) -> Option<usize> {
        self.row_bytes(width)?
            .checked_mul(usize::try_from(height).ok()?)
    }

    /// Short identifier, matching the serialized name
    pub fn name(self) -> &'static str {
        match self {
            PixelMode::Bilevel => "bilevel",
            PixelMode::BilevelInverted => "bilevel_inverted",
            PixelMode::BilevelReversed => "bilevel_reversed",
            PixelMode::Grey => "grey",
            PixelMode::GreyInverted => "grey_inverted",
            PixelMode::Palette => "palette",
            PixelMode::Rgb => "rgb",
            PixelMode::Bgr => "bgr",
            PixelMode::Bgrx => "bgrx",
            PixelMode::RgbPlanar => "rgb_planar",
        }
    }

    /// The single-bit set holding only this mode
    pub fn as_set(self) -> ModeSet {
        match self {
            PixelMode::Bilevel => ModeSet::BILEVEL,
            PixelMode::BilevelInverted => ModeSet::BILEVEL_INVERTED,
            PixelMode::BilevelReversed => ModeSet::BILEVEL_REVERSED,
            PixelMode::Grey => ModeSet::GREY,
            PixelMode::GreyInverted => ModeSet::GREY_INVERTED,
            PixelMode::Palette => ModeSet::PALETTE,
            PixelMode::Rgb => ModeSet::RGB,
            PixelMode::Bgr => ModeSet::BGR,
            PixelMode::Bgrx => ModeSet::BGRX,
            PixelMode::RgbPlanar => ModeSet::RGB_PLANAR,
        }
    }

    pub(crate) fn family(self) -> ModeFamily {
        match self {
            PixelMode::Bilevel | PixelMode::BilevelInverted | PixelMode::BilevelReversed => {
                ModeFamily::Bilevel
            }
            PixelMode::Grey | PixelMode::GreyInverted => ModeFamily::Grey,
            PixelMode::Palette => ModeFamily::Indexed,
            PixelMode::Rgb | PixelMode::Bgr | PixelMode::Bgrx | PixelMode::RgbPlanar => {
                ModeFamily::Direct
            }
        }
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of pixel modes, used by effects to declare what they accept.
    ///
    /// `ModeSet::all()` means the effect accepts any encoding and the
    /// invoker never converts for it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeSet: u16 {
        const BILEVEL = 1 << 0;
        const BILEVEL_INVERTED = 1 << 1;
        const BILEVEL_REVERSED = 1 << 2;
        const GREY = 1 << 3;
        const GREY_INVERTED = 1 << 4;
        const PALETTE = 1 << 5;
        const RGB = 1 << 6;
        const BGR = 1 << 7;
        const BGRX = 1 << 8;
        const RGB_PLANAR = 1 << 9;
    }
}

impl ModeSet {
    /// Whether `mode` is a member
    pub fn accepts(self, mode: PixelMode) -> bool {
        self.contains(mode.as_set())
    }

    /// Member modes, in table order
    pub fn modes(self) -> impl Iterator<Item = PixelMode> {
        PixelMode::ALL.into_iter().filter(move |m| self.accepts(*m))
    }
}

impl From<PixelMode> for ModeSet {
    fn from(mode: PixelMode) -> Self {
        mode.as_set()
    }
}

impl FromIterator<PixelMode> for ModeSet {
    fn from_iter<I: IntoIterator<Item = PixelMode>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ModeSet::empty(), |set, mode| set | mode.as_set())
    }
}

impl fmt::Display for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("any");
        }
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for mode in self.modes() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(mode.name())?;
            first = false;
        }
        Ok(())
    }
}

/// One pixel's value in its buffer's native encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    /// Raw bit of a 1-bit mode, polarity as stored
    Bit(bool),
    /// Raw 8-bit sample, polarity as stored
    Grey(u8),
    /// Palette index
    Index(u8),
    /// Channels in R, G, B order (`Rgb` and `RgbPlanar`)
    Rgb([u8; 3]),
    /// Channels in B, G, R order
    Bgr([u8; 3]),
    /// Channels in B, G, R, pad order
    Bgrx([u8; 4]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_len_per_mode() {
        assert_eq!(PixelMode::Bilevel.data_len(9, 2), Some(4));
        assert_eq!(PixelMode::BilevelReversed.data_len(8, 3), Some(3));
        assert_eq!(PixelMode::Grey.data_len(5, 1), Some(5));
        assert_eq!(PixelMode::Palette.data_len(4, 4), Some(16));
        assert_eq!(PixelMode::Rgb.data_len(4, 4), Some(48));
        assert_eq!(PixelMode::RgbPlanar.data_len(4, 4), Some(48));
        assert_eq!(PixelMode::Bgrx.data_len(4, 4), Some(64));
        assert_eq!(PixelMode::Rgb.data_len(0, 7), Some(0));
    }

    #[test]
    fn test_mode_set_membership() {
        let set: ModeSet = [PixelMode::Grey, PixelMode::Rgb].into_iter().collect();
        assert!(set.accepts(PixelMode::Grey));
        assert!(!set.accepts(PixelMode::Bgr));
        assert_eq!(
            set.modes().collect::<Vec<_>>(),
            vec![PixelMode::Grey, PixelMode::Rgb]
        );
        assert_eq!(set.to_string(), "grey, rgb");
    }

    #[test]
    fn test_mode_set_all_is_any() {
        assert_eq!(ModeSet::all().to_string(), "any");
        assert_eq!(ModeSet::all().modes().count(), PixelMode::ALL.len());
        assert_eq!(ModeSet::empty().to_string(), "none");
    }

    #[test]
    fn test_mode_serde_name() {
        let json = serde_json::to_string(&PixelMode::RgbPlanar).unwrap();
        assert_eq!(json, "\"rgb_planar\"");
    }
}
