//! Conversion between pixel encodings
//!
//! Every conversion decodes into one of two intermediates, 8-bit luma or
//! RGB triples, then encodes into the target. Permutations within a family
//! are lossless; narrowing uses [`luminance`] and [`BILEVEL_THRESHOLD`].

use std::collections::HashMap;

use crate::error::PixelError;

use super::buffer::PixelBuffer;
use super::mode::{ModeFamily, PixelMode};

/// Luma at or above this value becomes a white bilevel pixel
pub const BILEVEL_THRESHOLD: u8 = 128;

/// ITU-R 601 luma, rounded
pub fn luminance([r, g, b]: [u8; 3]) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// Whether [`convert`] has a direct mapping from `from` to `to`.
///
/// A palette is only built from interleaved colour and only resolves to
/// interleaved colour, so palette and planar RGB never exchange directly.
/// Bilevel and greyscale never become a palette either. Those routes must
/// go through [`PixelMode::Rgb`] explicitly.
pub fn conversion_defined(from: PixelMode, to: PixelMode) -> bool {
    use ModeFamily::*;

    if from == to {
        return true;
    }
    match (from.family(), to.family()) {
        (a, b) if a == b => true,
        (Bilevel | Grey, Bilevel | Grey | Direct) => true,
        (Direct | Indexed, Bilevel | Grey) => true,
        (Indexed, Direct) => to != PixelMode::RgbPlanar,
        (Direct, Indexed) => from != PixelMode::RgbPlanar,
        _ => false,
    }
}

/// Convert `buffer` into `target`.
///
/// Returns the buffer untouched when it is already in `target`.
pub fn convert(buffer: PixelBuffer, target: PixelMode) -> Result<PixelBuffer, PixelError> {
    let from = buffer.mode();
    if from == target {
        return Ok(buffer);
    }
    if !conversion_defined(from, target) {
        return Err(PixelError::UnsupportedConversion { from, to: target });
    }

    let (width, height) = buffer.dimensions();
    let samples = decode(&buffer);
    encode(samples, width, height, target)
}

enum Samples {
    Luma(Vec<u8>),
    Color(Vec<[u8; 3]>),
}

impl Samples {
    fn into_luma(self) -> Vec<u8> {
        match self {
            Samples::Luma(values) => values,
            Samples::Color(colors) => colors.into_iter().map(luminance).collect(),
        }
    }

    fn into_color(self) -> Vec<[u8; 3]> {
        match self {
            Samples::Luma(values) => values.into_iter().map(|v| [v, v, v]).collect(),
            Samples::Color(colors) => colors,
        }
    }
}

fn decode(buffer: &PixelBuffer) -> Samples {
    let data = buffer.data();
    match buffer.mode() {
        PixelMode::Bilevel => Samples::Luma(unpack_bits(buffer, BitOrder::MsbFirst, false)),
        PixelMode::BilevelInverted => Samples::Luma(unpack_bits(buffer, BitOrder::MsbFirst, true)),
        PixelMode::BilevelReversed => Samples::Luma(unpack_bits(buffer, BitOrder::LsbFirst, false)),
        PixelMode::Grey => Samples::Luma(data.to_vec()),
        PixelMode::GreyInverted => Samples::Luma(data.iter().map(|v| 255 - v).collect()),
        PixelMode::Palette => {
            let palette = buffer.palette().unwrap_or_default();
            Samples::Color(data.iter().map(|&i| palette[usize::from(i)]).collect())
        }
        PixelMode::Rgb => Samples::Color(bytemuck::cast_slice::<u8, [u8; 3]>(data).to_vec()),
        PixelMode::Bgr => Samples::Color(
            bytemuck::cast_slice::<u8, [u8; 3]>(data)
                .iter()
                .map(|&[b, g, r]| [r, g, b])
                .collect(),
        ),
        PixelMode::Bgrx => Samples::Color(
            bytemuck::cast_slice::<u8, [u8; 4]>(data)
                .iter()
                .map(|&[b, g, r, _]| [r, g, b])
                .collect(),
        ),
        PixelMode::RgbPlanar => {
            let plane = data.len() / 3;
            let (red, rest) = data.split_at(plane);
            let (green, blue) = rest.split_at(plane);
            Samples::Color(
                red.iter()
                    .zip(green)
                    .zip(blue)
                    .map(|((&r, &g), &b)| [r, g, b])
                    .collect(),
            )
        }
    }
}

fn encode(
    samples: Samples,
    width: u32,
    height: u32,
    target: PixelMode,
) -> Result<PixelBuffer, PixelError> {
    let (data, palette): (Vec<u8>, Option<Vec<[u8; 3]>>) = match target {
        PixelMode::Bilevel => (pack_bits(&samples.into_luma(), width, BitOrder::MsbFirst, false), None),
        PixelMode::BilevelInverted => {
            (pack_bits(&samples.into_luma(), width, BitOrder::MsbFirst, true), None)
        }
        PixelMode::BilevelReversed => {
            (pack_bits(&samples.into_luma(), width, BitOrder::LsbFirst, false), None)
        }
        PixelMode::Grey => (samples.into_luma(), None),
        PixelMode::GreyInverted => (samples.into_luma().into_iter().map(|v| 255 - v).collect(), None),
        PixelMode::Palette => {
            let (indices, palette) = build_palette(&samples.into_color());
            (indices, Some(palette))
        }
        PixelMode::Rgb => (bytemuck::cast_slice::<[u8; 3], u8>(&samples.into_color()).to_vec(), None),
        PixelMode::Bgr => (
            samples
                .into_color()
                .into_iter()
                .flat_map(|[r, g, b]| [b, g, r])
                .collect(),
            None,
        ),
        PixelMode::Bgrx => (
            samples
                .into_color()
                .into_iter()
                .flat_map(|[r, g, b]| [b, g, r, 0])
                .collect(),
            None,
        ),
        PixelMode::RgbPlanar => {
            let colors = samples.into_color();
            let mut planes = Vec::with_capacity(colors.len() * 3);
            for channel in 0..3 {
                planes.extend(colors.iter().map(|c| c[channel]));
            }
            (planes, None)
        }
    };
    PixelBuffer::from_parts(width, height, target, data, palette)
}

#[derive(Clone, Copy)]
enum BitOrder {
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    fn mask(self, x: usize) -> u8 {
        match self {
            BitOrder::MsbFirst => 0x80 >> (x % 8),
            BitOrder::LsbFirst => 1 << (x % 8),
        }
    }
}

/// Expand 1-bit rows to 0/255 luma
fn unpack_bits(buffer: &PixelBuffer, order: BitOrder, inverted: bool) -> Vec<u8> {
    let width = buffer.width() as usize;
    if width == 0 {
        return Vec::new();
    }
    let stride = width.div_ceil(8);
    let mut out = Vec::with_capacity(width * buffer.height() as usize);
    for row in buffer.data().chunks_exact(stride) {
        for x in 0..width {
            let set = row[x / 8] & order.mask(x) != 0;
            out.push(if set != inverted { 255 } else { 0 });
        }
    }
    out
}

/// Threshold luma into byte-padded 1-bit rows; padding bits stay zero
fn pack_bits(luma: &[u8], width: u32, order: BitOrder, inverted: bool) -> Vec<u8> {
    let width = width as usize;
    if width == 0 {
        return Vec::new();
    }
    let stride = width.div_ceil(8);
    let rows = luma.len() / width;
    let mut out = vec![0u8; stride * rows];
    for (y, row) in luma.chunks_exact(width).enumerate() {
        let packed = &mut out[y * stride..(y + 1) * stride];
        for (x, &value) in row.iter().enumerate() {
            if (value >= BILEVEL_THRESHOLD) != inverted {
                packed[x / 8] |= order.mask(x);
            }
        }
    }
    out
}

/// Exact palette in first-appearance order, or the web-safe cube when the
/// image holds more than 256 colours
fn build_palette(colors: &[[u8; 3]]) -> (Vec<u8>, Vec<[u8; 3]>) {
    let mut palette = Vec::new();
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut indices = Vec::with_capacity(colors.len());

    for &color in colors {
        let index = match lookup.get(&color) {
            Some(&index) => index,
            None => {
                if palette.len() == 256 {
                    return web_safe_palette(colors);
                }
                let index = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, index);
                index
            }
        };
        indices.push(index);
    }

    if palette.is_empty() {
        palette.push([0, 0, 0]);
    }
    (indices, palette)
}

fn web_safe_palette(colors: &[[u8; 3]]) -> (Vec<u8>, Vec<[u8; 3]>) {
    let level = |c: u8| ((u16::from(c) + 25) / 51) as u8;
    let palette = (0..216u16)
        .map(|i| [(i / 36) as u8 * 51, (i / 6 % 6) as u8 * 51, (i % 6) as u8 * 51])
        .collect();
    let indices = colors
        .iter()
        .map(|&[r, g, b]| level(r) * 36 + level(g) * 6 + level(b))
        .collect();
    (indices, palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn rgb_fixture() -> PixelBuffer {
        PixelBuffer::new(
            3,
            2,
            PixelMode::Rgb,
            vec![
                255, 0, 0, 0, 255, 0, 0, 0, 255, //
                10, 20, 30, 200, 100, 50, 7, 7, 7,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance([0, 0, 0]), 0);
        assert_eq!(luminance([255, 255, 255]), 255);
        assert_eq!(luminance([255, 0, 0]), 76);
        assert_eq!(luminance([0, 255, 0]), 150);
        assert_eq!(luminance([0, 0, 255]), 29);
        for v in 0..=255u8 {
            assert_eq!(luminance([v, v, v]), v);
        }
    }

    #[test]
    fn test_identity_conversion_keeps_allocation() {
        let buffer = rgb_fixture();
        let ptr = buffer.data().as_ptr();
        let same = convert(buffer, PixelMode::Rgb).unwrap();
        assert_eq!(same.data().as_ptr(), ptr);
    }

    #[test]
    fn test_rgb_bgr_round_trip() {
        let original = rgb_fixture();
        let bgr = convert(original.clone(), PixelMode::Bgr).unwrap();
        assert_eq!(&bgr.data()[..3], &[0, 0, 255]);
        assert_eq!(convert(bgr, PixelMode::Rgb).unwrap(), original);
    }

    #[test]
    fn test_rgb_planar_round_trip() {
        let original = rgb_fixture();
        let planar = convert(original.clone(), PixelMode::RgbPlanar).unwrap();
        assert_eq!(&planar.data()[..6], &[255, 0, 0, 10, 200, 7]);
        assert_eq!(&planar.data()[6..12], &[0, 255, 0, 20, 100, 7]);
        assert_eq!(convert(planar, PixelMode::Rgb).unwrap(), original);
    }

    #[test]
    fn test_bgrx_pad_written_as_zero() {
        let bgrx = convert(rgb_fixture(), PixelMode::Bgrx).unwrap();
        assert_eq!(bgrx.sample_at(2, 1).unwrap(), Pixel::Bgrx([7, 7, 7, 0]));

        let padded = PixelBuffer::new(1, 1, PixelMode::Bgrx, vec![3, 2, 1, 99]).unwrap();
        let rgb = convert(padded, PixelMode::Rgb).unwrap();
        assert_eq!(rgb.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_bilevel_reversed_round_trip_through_rgb() {
        // 10 wide, two rows, padding bits clear
        let original =
            PixelBuffer::new(10, 2, PixelMode::Bilevel, vec![0b1011_0001, 0b0100_0000, 0xff, 0x80])
                .unwrap();
        let rgb = convert(original.clone(), PixelMode::Rgb).unwrap();
        let reversed = convert(rgb, PixelMode::BilevelReversed).unwrap();
        assert_eq!(reversed.data(), &[0b1000_1101, 0b0000_0010, 0xff, 0x01]);

        let rgb = convert(reversed, PixelMode::Rgb).unwrap();
        assert_eq!(convert(rgb, PixelMode::Bilevel).unwrap(), original);
    }

    #[test]
    fn test_bilevel_round_trips_ignore_garbage_padding() {
        // 4 wide: the low nibble of each byte is padding and arrives dirty
        let original =
            PixelBuffer::new(4, 2, PixelMode::Bilevel, vec![0b1010_1111, 0b0110_0101]).unwrap();

        for via in [
            PixelMode::Rgb,
            PixelMode::RgbPlanar,
            PixelMode::Grey,
            PixelMode::BilevelReversed,
            PixelMode::BilevelInverted,
        ] {
            let there = convert(original.clone(), via).unwrap();
            assert_eq!(convert(there, PixelMode::Bilevel).unwrap(), original, "via {via}");
        }

        let reversed =
            PixelBuffer::new(4, 1, PixelMode::BilevelReversed, vec![0b1111_1001]).unwrap();
        let rgb = convert(reversed.clone(), PixelMode::Rgb).unwrap();
        assert_eq!(convert(rgb, PixelMode::BilevelReversed).unwrap(), reversed);
    }

    #[test]
    fn test_bilevel_direct_bit_reorder() {
        let msb = PixelBuffer::new(8, 1, PixelMode::Bilevel, vec![0b1100_0000]).unwrap();
        let lsb = convert(msb.clone(), PixelMode::BilevelReversed).unwrap();
        assert_eq!(lsb.data(), &[0b0000_0011]);
        assert_eq!(convert(lsb, PixelMode::Bilevel).unwrap(), msb);
    }

    #[test]
    fn test_bilevel_polarity() {
        let normal = PixelBuffer::new(4, 1, PixelMode::Bilevel, vec![0b1010_0000]).unwrap();
        let inverted = convert(normal.clone(), PixelMode::BilevelInverted).unwrap();
        assert_eq!(inverted.data(), &[0b0101_0000]);

        let grey = convert(inverted, PixelMode::Grey).unwrap();
        assert_eq!(grey.data(), &[255, 0, 255, 0]);
    }

    #[test]
    fn test_grey_to_bilevel_threshold() {
        let grey = PixelBuffer::new(5, 1, PixelMode::Grey, vec![0, 64, 127, 128, 255]).unwrap();
        let bilevel = convert(grey, PixelMode::Bilevel).unwrap();
        assert_eq!(bilevel.data(), &[0b0001_1000]);
    }

    #[test]
    fn test_grey_inverted() {
        let grey = PixelBuffer::new(3, 1, PixelMode::Grey, vec![0, 100, 255]).unwrap();
        let inverted = convert(grey.clone(), PixelMode::GreyInverted).unwrap();
        assert_eq!(inverted.data(), &[255, 155, 0]);
        assert_eq!(convert(inverted, PixelMode::Grey).unwrap(), grey);
    }

    #[test]
    fn test_rgb_to_grey_uses_luminance() {
        let grey = convert(rgb_fixture(), PixelMode::Grey).unwrap();
        assert_eq!(grey.data(), &[76, 150, 29, 18, 124, 7]);
    }

    #[test]
    fn test_palette_resolves_to_rgb() {
        let indexed = PixelBuffer::with_palette(
            3,
            1,
            vec![1, 0, 1],
            vec![[10, 20, 30], [200, 210, 220]],
        )
        .unwrap();
        let rgb = convert(indexed, PixelMode::Rgb).unwrap();
        assert_eq!(rgb.data(), &[200, 210, 220, 10, 20, 30, 200, 210, 220]);
    }

    #[test]
    fn test_rgb_to_exact_palette() {
        let rgb = PixelBuffer::new(3, 1, PixelMode::Rgb, vec![5, 5, 5, 9, 9, 9, 5, 5, 5]).unwrap();
        let indexed = convert(rgb.clone(), PixelMode::Palette).unwrap();
        assert_eq!(indexed.data(), &[0, 1, 0]);
        assert_eq!(indexed.palette().unwrap(), &[[5, 5, 5], [9, 9, 9]]);
        assert_eq!(convert(indexed, PixelMode::Rgb).unwrap(), rgb);
    }

    #[test]
    fn test_rgb_to_web_safe_palette() {
        // 300 distinct colours overflow an exact palette
        let data: Vec<u8> = (0..300u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8 * 255, 0])
            .collect();
        let rgb = PixelBuffer::new(300, 1, PixelMode::Rgb, data).unwrap();
        let indexed = convert(rgb, PixelMode::Palette).unwrap();
        assert_eq!(indexed.palette().unwrap().len(), 216);
        // pixel 299 is (43, 255, 0): levels (1, 5, 0)
        assert_eq!(indexed.sample_at(299, 0).unwrap(), Pixel::Index(36 + 30));
    }

    #[test]
    fn test_undefined_conversions() {
        let indexed = PixelBuffer::with_palette(1, 1, vec![0], vec![[1, 2, 3]]).unwrap();
        assert_eq!(
            convert(indexed, PixelMode::RgbPlanar).unwrap_err(),
            PixelError::UnsupportedConversion {
                from: PixelMode::Palette,
                to: PixelMode::RgbPlanar
            }
        );
        assert!(!conversion_defined(PixelMode::Grey, PixelMode::Palette));
        assert!(!conversion_defined(PixelMode::RgbPlanar, PixelMode::Palette));
        assert!(conversion_defined(PixelMode::RgbPlanar, PixelMode::Bgrx));
        assert!(conversion_defined(PixelMode::Palette, PixelMode::Bilevel));
    }

    #[test]
    fn test_planar_exchanges_with_grey_and_bilevel() {
        for mode in [
            PixelMode::Bilevel,
            PixelMode::BilevelReversed,
            PixelMode::BilevelInverted,
            PixelMode::Grey,
            PixelMode::GreyInverted,
        ] {
            assert!(conversion_defined(PixelMode::RgbPlanar, mode), "{mode}");
            assert!(conversion_defined(mode, PixelMode::RgbPlanar), "{mode}");
        }

        // 3x1 planar: black, mid grey, white
        let planar = PixelBuffer::new(
            3,
            1,
            PixelMode::RgbPlanar,
            vec![0, 128, 255, 0, 128, 255, 0, 128, 255],
        )
        .unwrap();
        let grey = convert(planar.clone(), PixelMode::Grey).unwrap();
        assert_eq!(grey.data(), &[0, 128, 255]);

        let bilevel = convert(planar, PixelMode::Bilevel).unwrap();
        assert_eq!(bilevel.data(), &[0b0110_0000]);

        let back = convert(grey, PixelMode::RgbPlanar).unwrap();
        assert_eq!(back.data(), &[0, 128, 255, 0, 128, 255, 0, 128, 255]);
    }

    #[test]
    fn test_every_defined_conversion_yields_valid_buffer() {
        let source = rgb_fixture();
        for from in PixelMode::ALL {
            let input = convert(source.clone(), from).unwrap();
            for to in PixelMode::ALL {
                let result = convert(input.clone(), to);
                assert_eq!(result.is_ok(), conversion_defined(from, to), "{from} -> {to}");
                if let Ok(out) = result {
                    assert_eq!(out.dimensions(), (3, 2));
                    assert_eq!(out.mode(), to);
                }
            }
        }
    }

    #[test]
    fn test_empty_buffer_converts() {
        let empty = PixelBuffer::zeroed(0, 0, PixelMode::Rgb).unwrap();
        assert!(convert(empty.clone(), PixelMode::Bilevel).is_ok());
        let indexed = convert(empty, PixelMode::Palette).unwrap();
        assert_eq!(indexed.palette().unwrap().len(), 1);
    }
}
