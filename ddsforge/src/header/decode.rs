//! Header decoding.

use tracing::{debug, trace};

use super::types::*;
use crate::descriptor::{AlphaMode, TextureDescriptor, TextureKind};
use crate::error::{DdsError, Result, UnsupportedFormat};
use crate::format::{FormatRegistry, LegacyPixelFormat};

/// A decoded header: the normalized descriptor plus what was on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub descriptor: TextureDescriptor,
    /// Offset of the pixel-data blob within the container.
    pub data_offset: usize,
    pub raw: RawHeader,
}

/// Derives the texture shape from legacy caps2 bits.
///
/// # Errors
///
/// `UnsupportedDimensionCombination` when both the volume and the cubemap
/// bits are set.
pub fn kind_from_caps2(caps2: u32) -> Result<TextureKind> {
    let volume = caps2 & DDSCAPS2_VOLUME != 0;
    let cubemap = caps2 & DDSCAPS2_CUBEMAP != 0;
    match (volume, cubemap) {
        (true, true) => Err(DdsError::dimensions(format!(
            "caps2 {:#010x} declares both a cubemap and a volume",
            caps2
        ))),
        (true, false) => Ok(TextureKind::Texture3D),
        (false, true) => Ok(TextureKind::Texture2DCubemap),
        (false, false) => Ok(TextureKind::Texture2D),
    }
}

/// Decodes the header of a container into a [`TextureDescriptor`].
///
/// Only the header is read; pixel data is neither required nor touched, so
/// this doubles as a cheap probe.
///
/// # Errors
///
/// - `MalformedContainer` for a bad magic, wrong declared sizes, truncation
///   or out-of-range fields
/// - `UnsupportedFormat` when the pixel format cannot be resolved
/// - `UnsupportedPartialCubemap` for legacy cubemaps with missing faces
/// - `UnsupportedDimensionCombination` for impossible shapes
pub fn decode(bytes: &[u8]) -> Result<DecodedHeader> {
    let raw = RawHeader::parse(bytes)?;

    if raw.size != HEADER_SIZE {
        return Err(DdsError::malformed(
            "size",
            OFFSET_SIZE,
            format!("declared header size {}, expected {}", raw.size, HEADER_SIZE),
        ));
    }
    if raw.pixel_format_size != PIXEL_FORMAT_SIZE {
        return Err(DdsError::malformed(
            "pixel_format.size",
            OFFSET_PIXEL_FORMAT,
            format!(
                "declared pixel format size {}, expected {}",
                raw.pixel_format_size, PIXEL_FORMAT_SIZE
            ),
        ));
    }
    if raw.width == 0 {
        return Err(DdsError::malformed("width", OFFSET_WIDTH, "width is 0"));
    }
    if raw.height == 0 {
        return Err(DdsError::malformed("height", OFFSET_HEIGHT, "height is 0"));
    }

    let has_mips = raw.caps & DDSCAPS_MIPMAP != 0 || raw.flags & DDSD_MIPMAPCOUNT != 0;
    let mip_count = if has_mips {
        raw.mip_map_count.max(1)
    } else {
        1
    };

    let descriptor = match &raw.dx10 {
        Some(dx10) => decode_extended(&raw, dx10, mip_count)?,
        None => decode_legacy(&raw, mip_count)?,
    };
    descriptor.validate().map_err(into_malformed)?;

    debug!(
        descriptor = %descriptor,
        extended = raw.dx10.is_some(),
        "Decoded container header"
    );

    Ok(DecodedHeader {
        descriptor,
        data_offset: raw.data_offset(),
        raw,
    })
}

fn decode_legacy(raw: &RawHeader, mip_count: u32) -> Result<TextureDescriptor> {
    let kind = kind_from_caps2(raw.caps2)?;

    if kind == TextureKind::Texture2DCubemap {
        let faces = (raw.caps2 & DDSCAPS2_CUBEMAP_ALLFACES).count_ones();
        if faces != 6 {
            return Err(DdsError::UnsupportedPartialCubemap {
                caps2: raw.caps2,
                faces,
            });
        }
    }

    let depth = if kind == TextureKind::Texture3D {
        if raw.depth == 0 {
            return Err(DdsError::malformed(
                "depth",
                OFFSET_DEPTH,
                "volume texture declares depth 0",
            ));
        }
        raw.depth
    } else {
        1
    };

    let resolved = FormatRegistry::global()
        .resolve_legacy(&raw.pixel_format)
        .ok_or_else(|| unresolved(&raw.pixel_format))?;
    trace!(format = %resolved.format, "Resolved legacy pixel format");

    Ok(TextureDescriptor {
        width: raw.width,
        height: raw.height,
        depth,
        mip_count,
        array_size: 1,
        dimension: kind.dimension(),
        is_cubemap: kind.is_cubemap(),
        format: resolved.format,
        alpha_mode: if resolved.premultiplied {
            AlphaMode::Premultiplied
        } else {
            AlphaMode::Unknown
        },
    })
}

fn decode_extended(raw: &RawHeader, dx10: &Dx10Header, mip_count: u32) -> Result<TextureDescriptor> {
    let format = *FormatRegistry::global().lookup_dxgi(dx10.dxgi_format)?;

    if dx10.array_size == 0 {
        return Err(DdsError::malformed(
            "array_size",
            OFFSET_ARRAY_SIZE,
            "extended header declares array size 0",
        ));
    }
    let alpha_bits = dx10.misc_flags2 & MISC_FLAGS2_ALPHA_MODE_MASK;
    let alpha_mode = AlphaMode::from_raw(alpha_bits).ok_or_else(|| {
        DdsError::malformed(
            "misc_flags2",
            OFFSET_MISC_FLAGS2,
            format!("unknown alpha mode {}", alpha_bits),
        )
    })?;
    let cube_flag = dx10.misc_flag & RESOURCE_MISC_TEXTURECUBE != 0;

    let (kind, depth) = match dx10.resource_dimension {
        RESOURCE_DIMENSION_TEXTURE1D => {
            if raw.height != 1 {
                return Err(DdsError::malformed(
                    "height",
                    OFFSET_HEIGHT,
                    format!("1D texture declares height {}", raw.height),
                ));
            }
            if cube_flag {
                return Err(DdsError::dimensions("1D texture flagged as cubemap"));
            }
            (TextureKind::Texture1D, 1)
        }
        RESOURCE_DIMENSION_TEXTURE2D => {
            let kind = if cube_flag {
                TextureKind::Texture2DCubemap
            } else {
                TextureKind::Texture2D
            };
            (kind, 1)
        }
        RESOURCE_DIMENSION_TEXTURE3D => {
            if cube_flag {
                return Err(DdsError::dimensions("volume texture flagged as cubemap"));
            }
            if dx10.array_size != 1 {
                return Err(DdsError::dimensions(format!(
                    "volume texture declares array size {}",
                    dx10.array_size
                )));
            }
            if raw.depth == 0 {
                return Err(DdsError::malformed(
                    "depth",
                    OFFSET_DEPTH,
                    "volume texture declares depth 0",
                ));
            }
            (TextureKind::Texture3D, raw.depth)
        }
        other => {
            return Err(DdsError::malformed(
                "resource_dimension",
                OFFSET_RESOURCE_DIMENSION,
                format!("unknown resource dimension {}", other),
            ))
        }
    };

    Ok(TextureDescriptor {
        width: raw.width,
        height: raw.height,
        depth,
        mip_count,
        array_size: dx10.array_size,
        dimension: kind.dimension(),
        is_cubemap: kind.is_cubemap(),
        format,
        alpha_mode,
    })
}

fn unresolved(pf: &LegacyPixelFormat) -> DdsError {
    if pf.uses_fourcc() {
        UnsupportedFormat::FourCc(pf.fourcc).into()
    } else {
        UnsupportedFormat::Masks(pf.masks()).into()
    }
}

/// Descriptor violations found in a file are container errors, not caller errors.
fn into_malformed(err: DdsError) -> DdsError {
    match err {
        DdsError::InvalidDescriptor { field, reason } => {
            let offset = match field {
                "mip_count" => OFFSET_MIP_COUNT,
                "array_size" => OFFSET_ARRAY_SIZE,
                _ => OFFSET_WIDTH,
            };
            DdsError::MalformedContainer {
                field,
                offset,
                reason,
            }
        }
        other => other,
    }
}
