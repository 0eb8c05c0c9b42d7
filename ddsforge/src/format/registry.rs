//! The static format capability table.

use super::legacy::{self, LegacyPixelFormat, LegacyResolution};
use super::types::{
    BlockInfo, ChannelLayout, ChannelRole, ChannelSet, CodecBackend, FormatId, Numeric,
    PixelFormatInfo,
};
use crate::error::{DdsError, Result, UnsupportedFormat};

use ChannelRole::{A, B, G, R, X};

const fn packed(
    format_id: FormatId,
    name: &'static str,
    roles: &[ChannelRole],
    bits: &[u8],
    numeric: Numeric,
    is_srgb: bool,
) -> PixelFormatInfo {
    let mut total = 0u32;
    let mut i = 0;
    while i < bits.len() {
        total += bits[i] as u32;
        i += 1;
    }
    PixelFormatInfo {
        format_id,
        name,
        block: None,
        bits_per_pixel: total,
        channels: ChannelLayout::Packed(ChannelSet::sequential(roles, bits)),
        numeric,
        is_srgb,
        codec_backend: CodecBackend::Copy,
        supports_volume: true,
        supports_cubemap: true,
        legacy_masks: None,
    }
}

const fn bc(
    format_id: FormatId,
    name: &'static str,
    bytes_per_block: u32,
    numeric: Numeric,
    is_srgb: bool,
) -> PixelFormatInfo {
    PixelFormatInfo {
        format_id,
        name,
        block: Some(BlockInfo {
            width: 4,
            height: 4,
            bytes_per_block,
        }),
        bits_per_pixel: 0,
        channels: ChannelLayout::Opaque,
        numeric,
        is_srgb,
        codec_backend: CodecBackend::BlockCompression,
        supports_volume: true,
        supports_cubemap: true,
        legacy_masks: None,
    }
}

const fn astc(
    format_id: FormatId,
    name: &'static str,
    width: u32,
    height: u32,
    is_srgb: bool,
) -> PixelFormatInfo {
    PixelFormatInfo {
        format_id,
        name,
        block: Some(BlockInfo {
            width,
            height,
            bytes_per_block: 16,
        }),
        bits_per_pixel: 0,
        channels: ChannelLayout::Opaque,
        numeric: Numeric::Unorm,
        is_srgb,
        codec_backend: CodecBackend::Astc,
        supports_volume: false,
        supports_cubemap: false,
        legacy_masks: None,
    }
}

use FormatId as F;
use Numeric::{Float, Snorm, Unorm};

static FORMATS: [PixelFormatInfo; 71] = [
    packed(F::R32G32B32A32Float, "R32G32B32A32_FLOAT", &[R, G, B, A], &[32, 32, 32, 32], Float, false),
    packed(F::R32G32B32Float, "R32G32B32_FLOAT", &[R, G, B], &[32, 32, 32], Float, false),
    packed(F::R16G16B16A16Float, "R16G16B16A16_FLOAT", &[R, G, B, A], &[16, 16, 16, 16], Float, false),
    packed(F::R16G16B16A16Unorm, "R16G16B16A16_UNORM", &[R, G, B, A], &[16, 16, 16, 16], Unorm, false),
    packed(F::R16G16B16A16Snorm, "R16G16B16A16_SNORM", &[R, G, B, A], &[16, 16, 16, 16], Snorm, false),
    packed(F::R32G32Float, "R32G32_FLOAT", &[R, G], &[32, 32], Float, false),
    packed(F::R10G10B10A2Unorm, "R10G10B10A2_UNORM", &[R, G, B, A], &[10, 10, 10, 2], Unorm, false),
    packed(F::R8G8B8A8Unorm, "R8G8B8A8_UNORM", &[R, G, B, A], &[8, 8, 8, 8], Unorm, false),
    packed(F::R8G8B8A8UnormSrgb, "R8G8B8A8_UNORM_SRGB", &[R, G, B, A], &[8, 8, 8, 8], Unorm, true),
    packed(F::R8G8B8A8Snorm, "R8G8B8A8_SNORM", &[R, G, B, A], &[8, 8, 8, 8], Snorm, false),
    packed(F::R16G16Float, "R16G16_FLOAT", &[R, G], &[16, 16], Float, false),
    packed(F::R16G16Unorm, "R16G16_UNORM", &[R, G], &[16, 16], Unorm, false),
    packed(F::R16G16Snorm, "R16G16_SNORM", &[R, G], &[16, 16], Snorm, false),
    packed(F::R32Float, "R32_FLOAT", &[R], &[32], Float, false),
    packed(F::R8G8Unorm, "R8G8_UNORM", &[R, G], &[8, 8], Unorm, false),
    packed(F::R8G8Snorm, "R8G8_SNORM", &[R, G], &[8, 8], Snorm, false),
    packed(F::R16Float, "R16_FLOAT", &[R], &[16], Float, false),
    packed(F::R16Unorm, "R16_UNORM", &[R], &[16], Unorm, false),
    packed(F::R16Snorm, "R16_SNORM", &[R], &[16], Snorm, false),
    packed(F::R8Unorm, "R8_UNORM", &[R], &[8], Unorm, false),
    packed(F::R8Snorm, "R8_SNORM", &[R], &[8], Snorm, false),
    packed(F::A8Unorm, "A8_UNORM", &[A], &[8], Unorm, false),
    bc(F::Bc1Unorm, "BC1_UNORM", 8, Unorm, false),
    bc(F::Bc1UnormSrgb, "BC1_UNORM_SRGB", 8, Unorm, true),
    bc(F::Bc2Unorm, "BC2_UNORM", 16, Unorm, false),
    bc(F::Bc2UnormSrgb, "BC2_UNORM_SRGB", 16, Unorm, true),
    bc(F::Bc3Unorm, "BC3_UNORM", 16, Unorm, false),
    bc(F::Bc3UnormSrgb, "BC3_UNORM_SRGB", 16, Unorm, true),
    bc(F::Bc4Unorm, "BC4_UNORM", 8, Unorm, false),
    bc(F::Bc4Snorm, "BC4_SNORM", 8, Snorm, false),
    bc(F::Bc5Unorm, "BC5_UNORM", 16, Unorm, false),
    bc(F::Bc5Snorm, "BC5_SNORM", 16, Snorm, false),
    packed(F::B5G6R5Unorm, "B5G6R5_UNORM", &[B, G, R], &[5, 6, 5], Unorm, false),
    packed(F::B5G5R5A1Unorm, "B5G5R5A1_UNORM", &[B, G, R, A], &[5, 5, 5, 1], Unorm, false),
    packed(F::B8G8R8A8Unorm, "B8G8R8A8_UNORM", &[B, G, R, A], &[8, 8, 8, 8], Unorm, false),
    packed(F::B8G8R8X8Unorm, "B8G8R8X8_UNORM", &[B, G, R, X], &[8, 8, 8, 8], Unorm, false),
    packed(F::B8G8R8A8UnormSrgb, "B8G8R8A8_UNORM_SRGB", &[B, G, R, A], &[8, 8, 8, 8], Unorm, true),
    packed(F::B8G8R8X8UnormSrgb, "B8G8R8X8_UNORM_SRGB", &[B, G, R, X], &[8, 8, 8, 8], Unorm, true),
    bc(F::Bc6hUf16, "BC6H_UF16", 16, Float, false),
    bc(F::Bc6hSf16, "BC6H_SF16", 16, Float, false),
    bc(F::Bc7Unorm, "BC7_UNORM", 16, Unorm, false),
    bc(F::Bc7UnormSrgb, "BC7_UNORM_SRGB", 16, Unorm, true),
    packed(F::B4G4R4A4Unorm, "B4G4R4A4_UNORM", &[B, G, R, A], &[4, 4, 4, 4], Unorm, false),
    astc(F::Astc4x4Unorm, "ASTC_4X4_UNORM", 4, 4, false),
    astc(F::Astc4x4UnormSrgb, "ASTC_4X4_UNORM_SRGB", 4, 4, true),
    astc(F::Astc5x4Unorm, "ASTC_5X4_UNORM", 5, 4, false),
    astc(F::Astc5x4UnormSrgb, "ASTC_5X4_UNORM_SRGB", 5, 4, true),
    astc(F::Astc5x5Unorm, "ASTC_5X5_UNORM", 5, 5, false),
    astc(F::Astc5x5UnormSrgb, "ASTC_5X5_UNORM_SRGB", 5, 5, true),
    astc(F::Astc6x5Unorm, "ASTC_6X5_UNORM", 6, 5, false),
    astc(F::Astc6x5UnormSrgb, "ASTC_6X5_UNORM_SRGB", 6, 5, true),
    astc(F::Astc6x6Unorm, "ASTC_6X6_UNORM", 6, 6, false),
    astc(F::Astc6x6UnormSrgb, "ASTC_6X6_UNORM_SRGB", 6, 6, true),
    astc(F::Astc8x5Unorm, "ASTC_8X5_UNORM", 8, 5, false),
    astc(F::Astc8x5UnormSrgb, "ASTC_8X5_UNORM_SRGB", 8, 5, true),
    astc(F::Astc8x6Unorm, "ASTC_8X6_UNORM", 8, 6, false),
    astc(F::Astc8x6UnormSrgb, "ASTC_8X6_UNORM_SRGB", 8, 6, true),
    astc(F::Astc8x8Unorm, "ASTC_8X8_UNORM", 8, 8, false),
    astc(F::Astc8x8UnormSrgb, "ASTC_8X8_UNORM_SRGB", 8, 8, true),
    astc(F::Astc10x5Unorm, "ASTC_10X5_UNORM", 10, 5, false),
    astc(F::Astc10x5UnormSrgb, "ASTC_10X5_UNORM_SRGB", 10, 5, true),
    astc(F::Astc10x6Unorm, "ASTC_10X6_UNORM", 10, 6, false),
    astc(F::Astc10x6UnormSrgb, "ASTC_10X6_UNORM_SRGB", 10, 6, true),
    astc(F::Astc10x8Unorm, "ASTC_10X8_UNORM", 10, 8, false),
    astc(F::Astc10x8UnormSrgb, "ASTC_10X8_UNORM_SRGB", 10, 8, true),
    astc(F::Astc10x10Unorm, "ASTC_10X10_UNORM", 10, 10, false),
    astc(F::Astc10x10UnormSrgb, "ASTC_10X10_UNORM_SRGB", 10, 10, true),
    astc(F::Astc12x10Unorm, "ASTC_12X10_UNORM", 12, 10, false),
    astc(F::Astc12x10UnormSrgb, "ASTC_12X10_UNORM_SRGB", 12, 10, true),
    astc(F::Astc12x12Unorm, "ASTC_12X12_UNORM", 12, 12, false),
    astc(F::Astc12x12UnormSrgb, "ASTC_12X12_UNORM_SRGB", 12, 12, true),
];

static GLOBAL: FormatRegistry = FormatRegistry { entries: &FORMATS };

/// Read-only registry of supported pixel formats.
///
/// The registry is a process-lifetime static; share it by `&'static`
/// reference across threads.
///
/// # Example
///
/// ```
/// use ddsforge::format::{FormatId, FormatRegistry};
///
/// let info = FormatRegistry::global().lookup(FormatId::Bc1Unorm).unwrap();
/// assert_eq!(info.name, "BC1_UNORM");
/// assert!(info.is_block_compressed());
/// ```
#[derive(Debug)]
pub struct FormatRegistry {
    entries: &'static [PixelFormatInfo],
}

impl FormatRegistry {
    /// The shared registry.
    pub fn global() -> &'static FormatRegistry {
        &GLOBAL
    }

    /// Looks up a format by id.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when the id is not registered. Synthesized
    /// [`FormatId::LegacyMasked`] formats are never table entries.
    pub fn lookup(&self, id: FormatId) -> Result<&'static PixelFormatInfo> {
        self.entries
            .iter()
            .find(|info| info.format_id == id)
            .ok_or_else(|| match id.dxgi() {
                Some(code) => DdsError::from(UnsupportedFormat::Dxgi(code)),
                None => DdsError::from(UnsupportedFormat::Name("LEGACY_MASKED".to_string())),
            })
    }

    /// Looks up a format by its extended-header code.
    pub fn lookup_dxgi(&self, code: u32) -> Result<&'static PixelFormatInfo> {
        self.entries
            .iter()
            .find(|info| info.format_id.dxgi() == Some(code))
            .ok_or_else(|| UnsupportedFormat::Dxgi(code).into())
    }

    /// Looks up a format by name, ignoring case and an optional `DXGI_FORMAT_` prefix.
    pub fn lookup_name(&self, name: &str) -> Result<&'static PixelFormatInfo> {
        let trimmed = name.trim();
        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix("DXGI_FORMAT_").unwrap_or(upper.as_str());
        self.entries
            .iter()
            .find(|info| info.name == bare)
            .ok_or_else(|| UnsupportedFormat::Name(trimmed.to_string()).into())
    }

    /// Maps a legacy pixel-format block to a canonical format.
    ///
    /// Returns `None` when neither the tag table, the mask priority list nor
    /// the fallback synthesis accept the description.
    pub fn resolve_legacy(&self, pf: &LegacyPixelFormat) -> Option<LegacyResolution> {
        legacy::resolve(self, pf)
    }

    /// The legacy pixel-format block that represents `format`, if any.
    pub fn legacy_encoding(&self, format: &PixelFormatInfo) -> Option<LegacyPixelFormat> {
        legacy::encoding_for(format)
    }

    /// All registered formats, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static PixelFormatInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashSet;

    #[test]
    fn test_registry_ids_and_names_are_unique() {
        let registry = FormatRegistry::global();
        let ids: HashSet<FormatId> = registry.iter().map(|f| f.format_id).collect();
        let names: HashSet<&str> = registry.iter().map(|f| f.name).collect();
        assert_eq!(ids.len(), registry.len());
        assert_eq!(names.len(), registry.len());
        assert!(!ids.contains(&FormatId::LegacyMasked));
    }

    #[test]
    fn test_lookup_every_registered_id() {
        let registry = FormatRegistry::global();
        for info in registry.iter() {
            assert_eq!(registry.lookup(info.format_id).unwrap(), info);
        }
    }

    #[test]
    fn test_lookup_legacy_masked_fails() {
        let err = FormatRegistry::global()
            .lookup(FormatId::LegacyMasked)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_lookup_dxgi_unknown_code() {
        let err = FormatRegistry::global().lookup_dxgi(42).unwrap_err();
        assert_eq!(err, DdsError::UnsupportedFormat(UnsupportedFormat::Dxgi(42)));
    }

    #[test]
    fn test_lookup_name_accepts_prefix_and_case() {
        let registry = FormatRegistry::global();
        assert_eq!(
            registry.lookup_name("dxgi_format_bc7_unorm_srgb").unwrap().format_id,
            FormatId::Bc7UnormSrgb
        );
        assert_eq!(
            registry.lookup_name(" r8g8b8a8_unorm ").unwrap().format_id,
            FormatId::R8G8B8A8Unorm
        );
        assert!(registry.lookup_name("R11G11B10_FLOAT").is_err());
    }

    #[test]
    fn test_bits_per_pixel_matches_channels() {
        let registry = FormatRegistry::global();
        assert_eq!(registry.lookup(FormatId::R32G32B32A32Float).unwrap().bits_per_pixel, 128);
        assert_eq!(registry.lookup(FormatId::R32G32B32Float).unwrap().bits_per_pixel, 96);
        assert_eq!(registry.lookup(FormatId::B5G6R5Unorm).unwrap().bits_per_pixel, 16);
        assert_eq!(registry.lookup(FormatId::A8Unorm).unwrap().bits_per_pixel, 8);
    }

    #[test]
    fn test_block_geometry() {
        let registry = FormatRegistry::global();
        let bc1 = registry.lookup(FormatId::Bc1Unorm).unwrap();
        assert_eq!(bc1.block.map(|b| b.bytes_per_block), Some(8));
        let astc = registry.lookup(FormatId::Astc10x6UnormSrgb).unwrap();
        let block = astc.block.unwrap();
        assert_eq!((block.width, block.height, block.bytes_per_block), (10, 6, 16));
        assert!(astc.is_srgb);
        assert!(!astc.supports_volume);
        assert!(!astc.supports_cubemap);
    }

    #[test]
    fn test_alpha_capability() {
        let registry = FormatRegistry::global();
        assert!(registry.lookup(FormatId::Bc3Unorm).unwrap().has_alpha());
        assert!(!registry.lookup(FormatId::Bc5Unorm).unwrap().has_alpha());
        assert!(!registry.lookup(FormatId::B8G8R8X8Unorm).unwrap().has_alpha());
        assert!(registry.lookup(FormatId::A8Unorm).unwrap().has_alpha());
    }
}
