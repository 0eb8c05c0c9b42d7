//! Built-in codec over `texture2ddecoder` (decode) and `intel_tex_2` (encode).
//!
//! | Format        | Decode | Encode |
//! |---------------|--------|--------|
//! | BC1, BC2, BC3 | yes    | yes    |
//! | BC4, BC5 UNORM| yes    | yes    |
//! | BC4, BC5 SNORM| no     | no     |
//! | BC6H UF16     | yes    | yes    |
//! | BC6H SF16     | yes    | no     |
//! | BC7           | yes    | yes    |
//! | ASTC          | yes    | no     |
//!
//! BC6H decodes through an 8-bit intermediate, so values above 1.0 are
//! clamped on import.

use image::{Rgba, Rgba32FImage};
use intel_tex_2::{bc1, bc3, bc4, bc5, bc6h, bc7, RSurface, RgSurface, RgbaSurface};
use tracing::trace;

use super::{BlockCodec, CodecError};
use crate::format::{CodecBackend, FormatId, PixelFormatInfo};
use crate::layout::surface_size;

/// Quality preset for BC7 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bc7Quality {
    #[default]
    UltraFast,
    Fast,
    Basic,
}

/// CPU codec backed by pure-Rust decoders and ISPC encoders.
#[derive(Debug, Clone, Default)]
pub struct NativeCodec {
    bc7_quality: Bc7Quality,
}

impl NativeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bc7_quality(mut self, quality: Bc7Quality) -> Self {
        self.bc7_quality = quality;
        self
    }

    fn bc7_settings(&self) -> bc7::EncodeSettings {
        match self.bc7_quality {
            Bc7Quality::UltraFast => bc7::alpha_ultra_fast_settings(),
            Bc7Quality::Fast => bc7::alpha_fast_settings(),
            Bc7Quality::Basic => bc7::alpha_basic_settings(),
        }
    }
}

fn unsupported(format: &PixelFormatInfo, direction: &str) -> CodecError {
    CodecError::Unsupported(format!("{} {}", direction, format.name))
}

fn decoder_error(error: &str) -> CodecError {
    CodecError::Failed(format!("block decoder: {}", error))
}

fn unpack_bgra(pixel: u32) -> [f32; 4] {
    let b = (pixel & 0xff) as f32 / 255.0;
    let g = ((pixel >> 8) & 0xff) as f32 / 255.0;
    let r = ((pixel >> 16) & 0xff) as f32 / 255.0;
    let a = ((pixel >> 24) & 0xff) as f32 / 255.0;
    [r, g, b, a]
}

fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Copies `image` into a tightly packed buffer padded to whole blocks.
///
/// Padding replicates the last row and column.
fn padded<const N: usize>(
    image: &Rgba32FImage,
    block_width: u32,
    block_height: u32,
    texel: impl Fn(&[f32; 4]) -> [u8; N],
) -> (Vec<u8>, u32, u32) {
    let (width, height) = image.dimensions();
    let padded_width = width.div_ceil(block_width) * block_width;
    let padded_height = height.div_ceil(block_height) * block_height;
    let mut out = Vec::with_capacity(padded_width as usize * padded_height as usize * N);
    for y in 0..padded_height {
        let sy = y.min(height - 1);
        for x in 0..padded_width {
            let sx = x.min(width - 1);
            out.extend_from_slice(&texel(&image.get_pixel(sx, sy).0));
        }
    }
    (out, padded_width, padded_height)
}

fn rgba8(px: &[f32; 4]) -> [u8; 4] {
    [to_unorm8(px[0]), to_unorm8(px[1]), to_unorm8(px[2]), to_unorm8(px[3])]
}

fn rgba16f(px: &[f32; 4]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, value) in px.iter().enumerate() {
        // BC6H UF16 cannot store negatives.
        let bits = half::f16::from_f32(value.max(0.0)).to_bits().to_le_bytes();
        out[i * 2..i * 2 + 2].copy_from_slice(&bits);
    }
    out
}

/// Rebuilds a BC2 texture as a BC1 colour stream plus per-pixel alpha.
fn split_bc2(data: &[u8]) -> (Vec<u8>, Vec<[u8; 16]>) {
    let mut colour = Vec::with_capacity(data.len() / 2);
    let mut alpha = Vec::with_capacity(data.len() / 16);
    for block in data.chunks_exact(16) {
        let mut bits = [0u8; 8];
        bits.copy_from_slice(&block[..8]);
        let bits = u64::from_le_bytes(bits);
        let mut values = [0u8; 16];
        for (i, value) in values.iter_mut().enumerate() {
            *value = ((bits >> (i * 4)) & 0xf) as u8 * 17;
        }
        alpha.push(values);
        colour.extend_from_slice(&block[8..]);
    }
    (colour, alpha)
}

fn decode_bc2(data: &[u8], width: u32, height: u32) -> Result<Vec<u32>, CodecError> {
    let (colour, alpha) = split_bc2(data);
    let mut pixels = vec![0u32; width as usize * height as usize];
    texture2ddecoder::decode_bc1(&colour, width as usize, height as usize, &mut pixels)
        .map_err(decoder_error)?;

    let blocks_x = width.div_ceil(4);
    for y in 0..height {
        for x in 0..width {
            let block = ((y / 4) * blocks_x + x / 4) as usize;
            let texel = ((y % 4) * 4 + x % 4) as usize;
            let index = (y * width + x) as usize;
            pixels[index] = (pixels[index] & 0x00ff_ffff) | ((alpha[block][texel] as u32) << 24);
        }
    }
    Ok(pixels)
}

fn encode_bc2(surface: &RgbaSurface) -> Vec<u8> {
    let colour = bc1::compress_blocks(surface);
    let blocks_x = surface.width / 4;
    let blocks_y = surface.height / 4;
    let mut out = Vec::with_capacity((blocks_x * blocks_y * 16) as usize);
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut bits = 0u64;
            for texel in 0..16u32 {
                let x = bx * 4 + texel % 4;
                let y = by * 4 + texel / 4;
                let a = surface.data[((y * surface.stride) + x * 4 + 3) as usize];
                let quantized = (a as u64 * 15 + 127) / 255;
                bits |= quantized << (texel * 4);
            }
            out.extend_from_slice(&bits.to_le_bytes());
            let block = (by * blocks_x + bx) as usize;
            out.extend_from_slice(&colour[block * 8..block * 8 + 8]);
        }
    }
    out
}

impl BlockCodec for NativeCodec {
    fn name(&self) -> &str {
        "native"
    }

    fn decode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        format: &PixelFormatInfo,
    ) -> Result<Rgba32FImage, CodecError> {
        let Some(block) = format.block else {
            return Err(unsupported(format, "decode"));
        };
        let expected = surface_size(format, width, height);
        if data.len() != expected {
            return Err(CodecError::InvalidInput(format!(
                "{}x{} {} needs {} bytes, got {}",
                width,
                height,
                format.name,
                expected,
                data.len()
            )));
        }
        trace!(format = format.name, width, height, "native decode");

        let (w, h) = (width as usize, height as usize);
        let mut pixels = vec![0u32; w * h];
        match format.format_id {
            FormatId::Bc1Unorm | FormatId::Bc1UnormSrgb => {
                texture2ddecoder::decode_bc1(data, w, h, &mut pixels).map_err(decoder_error)?
            }
            FormatId::Bc2Unorm | FormatId::Bc2UnormSrgb => pixels = decode_bc2(data, width, height)?,
            FormatId::Bc3Unorm | FormatId::Bc3UnormSrgb => {
                texture2ddecoder::decode_bc3(data, w, h, &mut pixels).map_err(decoder_error)?
            }
            FormatId::Bc4Unorm => {
                texture2ddecoder::decode_bc4(data, w, h, &mut pixels).map_err(decoder_error)?
            }
            FormatId::Bc5Unorm => {
                texture2ddecoder::decode_bc5(data, w, h, &mut pixels).map_err(decoder_error)?
            }
            FormatId::Bc6hUf16 => texture2ddecoder::decode_bc6_unsigned(data, w, h, &mut pixels)
                .map_err(decoder_error)?,
            FormatId::Bc6hSf16 => texture2ddecoder::decode_bc6_signed(data, w, h, &mut pixels)
                .map_err(decoder_error)?,
            FormatId::Bc7Unorm | FormatId::Bc7UnormSrgb => {
                texture2ddecoder::decode_bc7(data, w, h, &mut pixels).map_err(decoder_error)?
            }
            _ if format.codec_backend == CodecBackend::Astc => texture2ddecoder::decode_astc(
                data,
                w,
                h,
                block.width as usize,
                block.height as usize,
                &mut pixels,
            )
            .map_err(decoder_error)?,
            _ => return Err(unsupported(format, "decode")),
        }

        // Single and dual channel formats only define red (and green).
        let keep = match format.format_id {
            FormatId::Bc4Unorm => 1,
            FormatId::Bc5Unorm => 2,
            _ => 4,
        };
        let mut image = Rgba32FImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(pixels) {
            let mut rgba = unpack_bgra(src);
            if keep < 4 {
                for channel in &mut rgba[keep..3] {
                    *channel = 0.0;
                }
                rgba[3] = 1.0;
            }
            *dst = Rgba(rgba);
        }
        Ok(image)
    }

    fn encode(&self, image: &Rgba32FImage, format: &PixelFormatInfo) -> Result<Vec<u8>, CodecError> {
        let Some(block) = format.block else {
            return Err(unsupported(format, "encode"));
        };
        if image.width() == 0 || image.height() == 0 {
            return Err(CodecError::InvalidInput("empty image".to_string()));
        }
        trace!(
            format = format.name,
            width = image.width(),
            height = image.height(),
            "native encode"
        );

        let rgba_surface = || padded(image, block.width, block.height, rgba8);
        let out = match format.format_id {
            FormatId::Bc1Unorm | FormatId::Bc1UnormSrgb => {
                let (data, width, height) = rgba_surface();
                bc1::compress_blocks(&RgbaSurface { data: &data, width, height, stride: width * 4 })
            }
            FormatId::Bc2Unorm | FormatId::Bc2UnormSrgb => {
                let (data, width, height) = rgba_surface();
                encode_bc2(&RgbaSurface { data: &data, width, height, stride: width * 4 })
            }
            FormatId::Bc3Unorm | FormatId::Bc3UnormSrgb => {
                let (data, width, height) = rgba_surface();
                bc3::compress_blocks(&RgbaSurface { data: &data, width, height, stride: width * 4 })
            }
            FormatId::Bc4Unorm => {
                let (data, width, height) = padded(image, 4, 4, |px| [to_unorm8(px[0])]);
                bc4::compress_blocks(&RSurface { data: &data, width, height, stride: width })
            }
            FormatId::Bc5Unorm => {
                let (data, width, height) =
                    padded(image, 4, 4, |px| [to_unorm8(px[0]), to_unorm8(px[1])]);
                bc5::compress_blocks(&RgSurface { data: &data, width, height, stride: width * 2 })
            }
            FormatId::Bc6hUf16 => {
                let (data, width, height) = padded(image, 4, 4, rgba16f);
                bc6h::compress_blocks(
                    &bc6h::very_fast_settings(),
                    &RgbaSurface { data: &data, width, height, stride: width * 8 },
                )
            }
            FormatId::Bc7Unorm | FormatId::Bc7UnormSrgb => {
                let (data, width, height) = rgba_surface();
                bc7::compress_blocks(
                    &self.bc7_settings(),
                    &RgbaSurface { data: &data, width, height, stride: width * 4 },
                )
            }
            _ => return Err(unsupported(format, "encode")),
        };

        let expected = surface_size(format, image.width(), image.height());
        if out.len() != expected {
            return Err(CodecError::Failed(format!(
                "encoder produced {} bytes for {}, expected {}",
                out.len(),
                format.name,
                expected
            )));
        }
        Ok(out)
    }

    fn is_reentrant(&self) -> bool {
        true
    }
}
