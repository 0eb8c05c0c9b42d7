//! Bit-field extraction and packing for uncompressed formats.

use image::{Rgba, Rgba32FImage};

use crate::error::{DdsError, Result, UnsupportedFormat};
use crate::format::{ChannelLayout, ChannelRole, ChannelSet, Numeric, PixelFormatInfo};
use crate::layout::surface_size;

fn packed_channels(format: &PixelFormatInfo) -> Result<(ChannelSet, usize)> {
    let ChannelLayout::Packed(set) = format.channels else {
        return Err(UnsupportedFormat::RequiresCodec(format.name).into());
    };
    if format.bits_per_pixel == 0 || format.bits_per_pixel % 8 != 0 || format.bits_per_pixel > 128 {
        return Err(DdsError::invalid(
            "format",
            format!(
                "{} has {} bits per pixel; only whole-byte pixels up to 128 bits are supported",
                format.name, format.bits_per_pixel
            ),
        ));
    }
    Ok((set, (format.bits_per_pixel / 8) as usize))
}

fn role_index(role: ChannelRole) -> Option<usize> {
    match role {
        ChannelRole::R => Some(0),
        ChannelRole::G => Some(1),
        ChannelRole::B => Some(2),
        ChannelRole::A => Some(3),
        ChannelRole::X => None,
    }
}

fn field_mask(bits: u8) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

fn read_value(raw: u128, bits: u8, numeric: Numeric) -> f32 {
    match numeric {
        Numeric::Unorm => (raw as f64 / field_mask(bits) as f64) as f32,
        Numeric::Snorm => {
            let sign_bit = 1u128 << (bits - 1);
            let signed = if raw & sign_bit != 0 {
                raw as i128 - (1i128 << bits)
            } else {
                raw as i128
            };
            let max = (sign_bit - 1) as f64;
            let value = (signed as f64 / max).max(-1.0);
            ((value + 1.0) * 0.5) as f32
        }
        Numeric::Float => match bits {
            16 => half::f16::from_bits(raw as u16).to_f32(),
            32 => f32::from_bits(raw as u32),
            _ => f32::NAN,
        },
    }
}

fn write_value(value: f32, bits: u8, numeric: Numeric) -> u128 {
    match numeric {
        Numeric::Unorm => {
            let max = field_mask(bits) as f64;
            (value.clamp(0.0, 1.0) as f64 * max).round() as u128
        }
        Numeric::Snorm => {
            let max = ((1u128 << (bits - 1)) - 1) as f64;
            let signed = (value as f64 * 2.0 - 1.0).clamp(-1.0, 1.0);
            ((signed * max).round() as i128 as u128) & field_mask(bits)
        }
        Numeric::Float => match bits {
            16 => half::f16::from_f32(value).to_bits() as u128,
            32 => value.to_bits() as u128,
            _ => 0,
        },
    }
}

/// Converts one uncompressed subresource to host RGBA.
///
/// # Errors
///
/// - `UnsupportedFormat` for block-compressed formats
/// - `MalformedContainer` when `bytes` is not exactly one `width` x `height` surface
pub fn to_host(bytes: &[u8], width: u32, height: u32, format: &PixelFormatInfo) -> Result<Rgba32FImage> {
    let (set, bytes_per_pixel) = packed_channels(format)?;
    let expected = surface_size(format, width, height);
    if bytes.len() != expected {
        return Err(DdsError::malformed(
            "pixel_data",
            bytes.len().min(expected),
            format!(
                "{}x{} {} surface needs {} bytes, got {}",
                width,
                height,
                format.name,
                expected,
                bytes.len()
            ),
        ));
    }
    if format.is_float() && set.as_slice().iter().any(|c| c.bits != 16 && c.bits != 32) {
        return Err(DdsError::invalid(
            "format",
            format!("{} has a float channel that is neither 16 nor 32 bits", format.name),
        ));
    }

    let mut image = Rgba32FImage::new(width, height);
    for (pixel, chunk) in image.pixels_mut().zip(bytes.chunks_exact(bytes_per_pixel)) {
        let mut word = [0u8; 16];
        word[..bytes_per_pixel].copy_from_slice(chunk);
        let word = u128::from_le_bytes(word);

        let mut rgba = [0.0, 0.0, 0.0, 1.0];
        for channel in set.as_slice() {
            if let Some(index) = role_index(channel.role) {
                let raw = (word >> channel.shift) & field_mask(channel.bits);
                rgba[index] = read_value(raw, channel.bits, format.numeric);
            }
        }
        *pixel = Rgba(rgba);
    }
    Ok(image)
}

/// Packs host RGBA into one uncompressed subresource.
///
/// Host channels the format lacks are dropped, including alpha.
pub fn from_host(image: &Rgba32FImage, format: &PixelFormatInfo) -> Result<Vec<u8>> {
    let (set, bytes_per_pixel) = packed_channels(format)?;
    let mut out = Vec::with_capacity(surface_size(format, image.width(), image.height()));

    for pixel in image.pixels() {
        let mut word = 0u128;
        for channel in set.as_slice() {
            let raw = match role_index(channel.role) {
                Some(index) => write_value(pixel.0[index], channel.bits, format.numeric),
                None => field_mask(channel.bits),
            };
            word |= (raw & field_mask(channel.bits)) << channel.shift;
        }
        out.extend_from_slice(&word.to_le_bytes()[..bytes_per_pixel]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{FormatId, FormatRegistry};

    fn format(id: FormatId) -> &'static PixelFormatInfo {
        FormatRegistry::global().lookup(id).unwrap()
    }

    #[test]
    fn test_bgra_is_reordered() {
        let bytes = [10u8, 20, 30, 40];
        let image = to_host(&bytes, 1, 1, format(FormatId::B8G8R8A8Unorm)).unwrap();
        let px = image.get_pixel(0, 0).0;
        for (value, expected) in px.iter().zip([30.0f32, 20.0, 10.0, 40.0]) {
            assert!((value - expected / 255.0).abs() < 1e-6);
        }
        assert_eq!(from_host(&image, format(FormatId::B8G8R8A8Unorm)).unwrap(), bytes);
    }

    #[test]
    fn test_missing_alpha_imports_opaque() {
        let image = to_host(&[0x1f, 0x00], 1, 1, format(FormatId::B5G6R5Unorm)).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_padding_channel_written_as_ones_and_alpha_dropped() {
        let mut image = Rgba32FImage::new(1, 1);
        image.put_pixel(0, 0, Rgba([1.0, 0.0, 0.0, 0.25]));
        let bytes = from_host(&image, format(FormatId::B8G8R8X8Unorm)).unwrap();
        assert_eq!(bytes, vec![0, 0, 255, 255]);
        let back = to_host(&bytes, 1, 1, format(FormatId::B8G8R8X8Unorm)).unwrap();
        assert_eq!(back.get_pixel(0, 0).0, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_snorm_maps_to_unit_range() {
        let bytes = [0x81u8, 0x7f, 0x00, 0x80];
        let image = to_host(&bytes, 1, 1, format(FormatId::R8G8B8A8Snorm)).unwrap();
        let px = image.get_pixel(0, 0).0;
        assert_eq!(px[0], 0.0);
        assert_eq!(px[1], 1.0);
        assert_eq!(px[2], 0.5);
        // -128 clamps to -1.
        assert_eq!(px[3], 0.0);
        let back = from_host(&image, format(FormatId::R8G8B8A8Snorm)).unwrap();
        assert_eq!(back, vec![0x81, 0x7f, 0x00, 0x81]);
    }

    #[test]
    fn test_half_float_values() {
        let one = half::f16::from_f32(1.5).to_bits().to_le_bytes();
        let neg = half::f16::from_f32(-2.0).to_bits().to_le_bytes();
        let bytes = [one[0], one[1], neg[0], neg[1]];
        let image = to_host(&bytes, 1, 1, format(FormatId::R16G16Float)).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1.5, -2.0, 0.0, 1.0]);
        assert_eq!(from_host(&image, format(FormatId::R16G16Float)).unwrap(), bytes);
    }

    #[test]
    fn test_ten_bit_channels() {
        let word: u32 = 1023 | (512 << 10) | (3 << 30);
        let image = to_host(&word.to_le_bytes(), 1, 1, format(FormatId::R10G10B10A2Unorm)).unwrap();
        let px = image.get_pixel(0, 0).0;
        assert_eq!(px[0], 1.0);
        assert_eq!(px[3], 1.0);
        assert!((px[1] - 512.0 / 1023.0).abs() < 1e-6);
        assert_eq!(
            from_host(&image, format(FormatId::R10G10B10A2Unorm)).unwrap(),
            word.to_le_bytes()
        );
    }

    #[test]
    fn test_alpha_only_format() {
        let image = to_host(&[0x80], 1, 1, format(FormatId::A8Unorm)).unwrap();
        assert_eq!(image.get_pixel(0, 0).0[..3], [0.0, 0.0, 0.0]);
        assert_eq!(from_host(&image, format(FormatId::A8Unorm)).unwrap(), vec![0x80]);
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        let err = to_host(&[0u8; 15], 2, 2, format(FormatId::R8G8B8A8Unorm)).unwrap_err();
        assert!(matches!(err, DdsError::MalformedContainer { field: "pixel_data", .. }));
    }

    #[test]
    fn test_block_formats_rejected() {
        let err = to_host(&[0u8; 8], 4, 4, format(FormatId::Bc1Unorm)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        let err = from_host(&Rgba32FImage::new(4, 4), format(FormatId::Bc1Unorm)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn uncompressed() -> impl Strategy<Value = &'static PixelFormatInfo> {
            let all: Vec<&'static PixelFormatInfo> = FormatRegistry::global()
                .iter()
                .filter(|f| !f.is_block_compressed())
                .collect();
            proptest::sample::select(all)
        }

        proptest! {
            #[test]
            fn unorm_and_snorm_bytes_round_trip(
                format in uncompressed(),
                seed in proptest::collection::vec(any::<u8>(), 16 * 6),
            ) {
                prop_assume!(!format.is_float());
                let bpp = format.bytes_per_pixel() as usize;
                let mut bytes = seed[..bpp * 6].to_vec();
                let ChannelLayout::Packed(set) = format.channels else { unreachable!() };

                // Canonicalize the bytes: padding reads back as ones and the
                // duplicate most-negative snorm code reads back as -max.
                for px in bytes.chunks_exact_mut(bpp) {
                    let mut word = [0u8; 16];
                    word[..bpp].copy_from_slice(px);
                    let mut word = u128::from_le_bytes(word);
                    for c in set.as_slice() {
                        let mask = field_mask(c.bits) << c.shift;
                        let raw = (word & mask) >> c.shift;
                        let fixed = if c.role == ChannelRole::X {
                            field_mask(c.bits)
                        } else if format.is_signed_normalized() && raw == 1u128 << (c.bits - 1) {
                            raw + 1
                        } else {
                            raw
                        };
                        word = (word & !mask) | (fixed << c.shift);
                    }
                    px.copy_from_slice(&word.to_le_bytes()[..bpp]);
                }

                let image = to_host(&bytes, 3, 2, format).unwrap();
                prop_assert_eq!(from_host(&image, format).unwrap(), bytes);
            }
        }
    }
}
