//! Legacy pixel-format resolution.
//!
//! Containers written without the extended header describe their pixel
//! format either with a four-character code or with raw channel bit masks.
//! Both are resolved through static tables; adding a format is a table edit.
//!
//! Mask resolution is order-sensitive: the priority list is scanned first
//! and the first exact match wins. Only when nothing matches is a
//! [`FormatId::LegacyMasked`] format synthesized, preserving the masks so
//! the data round-trips even when its meaning is unknown.

use super::registry::FormatRegistry;
use super::types::{
    ChannelLayout, ChannelRole, ChannelSet, ChannelSpec, CodecBackend, FormatId, Numeric,
    PixelFormatInfo, PixelMasks,
};

/// Pixel-format flag: alpha mask is valid.
pub const DDPF_ALPHAPIXELS: u32 = 0x1;
/// Pixel-format flag: alpha-only surface.
pub const DDPF_ALPHA: u32 = 0x2;
/// Pixel-format flag: four-character code is valid.
pub const DDPF_FOURCC: u32 = 0x4;
/// Pixel-format flag: uncompressed RGB masks are valid.
pub const DDPF_RGB: u32 = 0x40;
/// Pixel-format flag: luminance surface (red mask holds luminance).
pub const DDPF_LUMINANCE: u32 = 0x20000;
/// Pixel-format flag: signed bump-map data.
pub const DDPF_BUMPDUDV: u32 = 0x80000;

/// The 32-byte pixel-format block of the legacy header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegacyPixelFormat {
    pub flags: u32,
    pub fourcc: [u8; 4],
    pub bit_count: u32,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,
}

impl LegacyPixelFormat {
    /// A four-character-code pixel format.
    pub fn from_fourcc(fourcc: [u8; 4]) -> Self {
        Self {
            flags: DDPF_FOURCC,
            fourcc,
            ..Self::default()
        }
    }

    /// Whether the four-character code should be consulted.
    pub fn uses_fourcc(&self) -> bool {
        self.flags & DDPF_FOURCC != 0 && self.fourcc != [0; 4]
    }

    pub fn masks(&self) -> PixelMasks {
        PixelMasks {
            flags: self.flags,
            bit_count: self.bit_count,
            r: self.r_mask,
            g: self.g_mask,
            b: self.b_mask,
            a: self.a_mask,
        }
    }
}

/// Result of legacy resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyResolution {
    pub format: PixelFormatInfo,
    /// The tag itself declares premultiplied alpha (DXT2, DXT4).
    pub premultiplied: bool,
}

struct FourCcEntry {
    tag: [u8; 4],
    format: FormatId,
    premultiplied: bool,
    /// The tag written when encoding `format`.
    emit: bool,
}

const fn tag(tag: &[u8; 4], format: FormatId, emit: bool) -> FourCcEntry {
    FourCcEntry {
        tag: *tag,
        format,
        premultiplied: false,
        emit,
    }
}

const fn d3dfmt(code: u32, format: FormatId) -> FourCcEntry {
    FourCcEntry {
        tag: code.to_le_bytes(),
        format,
        premultiplied: false,
        emit: true,
    }
}

const fn premultiplied(tag: &[u8; 4], format: FormatId) -> FourCcEntry {
    FourCcEntry {
        tag: *tag,
        format,
        premultiplied: true,
        emit: false,
    }
}

static FOURCC_TABLE: [FourCcEntry; 24] = [
    tag(b"DXT1", FormatId::Bc1Unorm, true),
    premultiplied(b"DXT2", FormatId::Bc2Unorm),
    tag(b"DXT3", FormatId::Bc2Unorm, true),
    premultiplied(b"DXT4", FormatId::Bc3Unorm),
    tag(b"DXT5", FormatId::Bc3Unorm, true),
    tag(b"ATI1", FormatId::Bc4Unorm, true),
    tag(b"BC4U", FormatId::Bc4Unorm, false),
    tag(b"BC4S", FormatId::Bc4Snorm, true),
    tag(b"ATI2", FormatId::Bc5Unorm, true),
    tag(b"BC5U", FormatId::Bc5Unorm, false),
    tag(b"BC5S", FormatId::Bc5Snorm, true),
    tag(b"BC6H", FormatId::Bc6hUf16, false),
    tag(b"BC7L", FormatId::Bc7Unorm, false),
    tag(b"BC7\0", FormatId::Bc7Unorm, false),
    d3dfmt(36, FormatId::R16G16B16A16Unorm),
    d3dfmt(110, FormatId::R16G16B16A16Snorm),
    d3dfmt(111, FormatId::R16Float),
    d3dfmt(112, FormatId::R16G16Float),
    d3dfmt(113, FormatId::R16G16B16A16Float),
    d3dfmt(114, FormatId::R32Float),
    d3dfmt(115, FormatId::R32G32Float),
    d3dfmt(116, FormatId::R32G32B32A32Float),
    tag(b"3DC1", FormatId::Bc4Unorm, false),
    tag(b"3DC2", FormatId::Bc5Unorm, false),
];

/// Which family of mask tables a pixel-format block selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskKind {
    Rgb,
    Luminance,
    Alpha,
    BumpDuDv,
}

impl MaskKind {
    fn of(flags: u32) -> Option<MaskKind> {
        if flags & DDPF_BUMPDUDV != 0 {
            Some(MaskKind::BumpDuDv)
        } else if flags & DDPF_RGB != 0 {
            Some(MaskKind::Rgb)
        } else if flags & DDPF_LUMINANCE != 0 {
            Some(MaskKind::Luminance)
        } else if flags & DDPF_ALPHA != 0 {
            Some(MaskKind::Alpha)
        } else {
            None
        }
    }

    fn flags(self, a_mask: u32) -> u32 {
        let alpha = if a_mask != 0 { DDPF_ALPHAPIXELS } else { 0 };
        match self {
            MaskKind::Rgb => DDPF_RGB | alpha,
            MaskKind::Luminance => DDPF_LUMINANCE | alpha,
            MaskKind::Alpha => DDPF_ALPHA,
            MaskKind::BumpDuDv => DDPF_BUMPDUDV,
        }
    }
}

struct MaskEntry {
    kind: MaskKind,
    bit_count: u32,
    masks: [u32; 4],
    format: FormatId,
}

const fn mask(kind: MaskKind, bit_count: u32, masks: [u32; 4], format: FormatId) -> MaskEntry {
    MaskEntry {
        kind,
        bit_count,
        masks,
        format,
    }
}

// Priority order matters. The reversed 10:10:10:2 mask written by some old
// tools is deliberately absent: it falls through to synthesis instead of
// aliasing R10G10B10A2.
static MASK_TABLE: [MaskEntry; 15] = [
    mask(MaskKind::Rgb, 32, [0xff, 0xff00, 0xff_0000, 0xff00_0000], FormatId::R8G8B8A8Unorm),
    mask(MaskKind::Rgb, 32, [0xff_0000, 0xff00, 0xff, 0xff00_0000], FormatId::B8G8R8A8Unorm),
    mask(MaskKind::Rgb, 32, [0xff_0000, 0xff00, 0xff, 0], FormatId::B8G8R8X8Unorm),
    mask(MaskKind::Rgb, 32, [0x3ff, 0xffc00, 0x3ff0_0000, 0xc000_0000], FormatId::R10G10B10A2Unorm),
    mask(MaskKind::Rgb, 32, [0xffff, 0xffff_0000, 0, 0], FormatId::R16G16Unorm),
    mask(MaskKind::Rgb, 16, [0x7c00, 0x3e0, 0x1f, 0x8000], FormatId::B5G5R5A1Unorm),
    mask(MaskKind::Rgb, 16, [0xf800, 0x7e0, 0x1f, 0], FormatId::B5G6R5Unorm),
    mask(MaskKind::Rgb, 16, [0xf00, 0xf0, 0xf, 0xf000], FormatId::B4G4R4A4Unorm),
    mask(MaskKind::Luminance, 8, [0xff, 0, 0, 0], FormatId::R8Unorm),
    mask(MaskKind::Luminance, 16, [0xffff, 0, 0, 0], FormatId::R16Unorm),
    mask(MaskKind::Luminance, 16, [0xff, 0, 0, 0xff00], FormatId::R8G8Unorm),
    mask(MaskKind::Alpha, 8, [0, 0, 0, 0xff], FormatId::A8Unorm),
    mask(MaskKind::BumpDuDv, 16, [0xff, 0xff00, 0, 0], FormatId::R8G8Snorm),
    mask(MaskKind::BumpDuDv, 32, [0xff, 0xff00, 0xff_0000, 0xff00_0000], FormatId::R8G8B8A8Snorm),
    mask(MaskKind::BumpDuDv, 32, [0xffff, 0xffff_0000, 0, 0], FormatId::R16G16Snorm),
];

pub(super) fn resolve(
    registry: &FormatRegistry,
    pf: &LegacyPixelFormat,
) -> Option<LegacyResolution> {
    if pf.uses_fourcc() {
        let entry = FOURCC_TABLE.iter().find(|e| e.tag == pf.fourcc)?;
        let format = registry.lookup(entry.format).ok()?;
        return Some(LegacyResolution {
            format: *format,
            premultiplied: entry.premultiplied,
        });
    }

    let kind = MaskKind::of(pf.flags)?;
    let masks = [pf.r_mask, pf.g_mask, pf.b_mask, pf.a_mask];
    if let Some(entry) = MASK_TABLE
        .iter()
        .find(|e| e.kind == kind && e.bit_count == pf.bit_count && e.masks == masks)
    {
        let format = registry.lookup(entry.format).ok()?;
        return Some(LegacyResolution {
            format: *format,
            premultiplied: false,
        });
    }

    synthesize(kind, pf.masks()).map(|format| LegacyResolution {
        format,
        premultiplied: false,
    })
}

/// Builds a [`FormatId::LegacyMasked`] format for masks outside the priority list.
fn synthesize(kind: MaskKind, masks: PixelMasks) -> Option<PixelFormatInfo> {
    if !matches!(masks.bit_count, 8 | 16 | 24 | 32) {
        return None;
    }
    let limit = if masks.bit_count == 32 {
        u32::MAX
    } else {
        (1u32 << masks.bit_count) - 1
    };

    let candidates = [
        (ChannelRole::R, masks.r),
        (ChannelRole::G, masks.g),
        (ChannelRole::B, masks.b),
        (ChannelRole::A, masks.a),
    ];
    let mut specs = Vec::with_capacity(4);
    let mut seen = 0u32;
    for (role, m) in candidates {
        if m == 0 {
            continue;
        }
        let shift = m.trailing_zeros();
        let contiguous = (m >> shift).wrapping_add(1) & (m >> shift) == 0;
        if !contiguous || m & !limit != 0 || m & seen != 0 {
            return None;
        }
        seen |= m;
        specs.push(ChannelSpec {
            role,
            shift: shift as u8,
            bits: m.count_ones() as u8,
        });
    }
    if specs.is_empty() {
        return None;
    }

    Some(PixelFormatInfo {
        format_id: FormatId::LegacyMasked,
        name: "LEGACY_MASKED",
        block: None,
        bits_per_pixel: masks.bit_count,
        channels: ChannelLayout::Packed(ChannelSet::from_specs(&specs)),
        numeric: if kind == MaskKind::BumpDuDv {
            Numeric::Snorm
        } else {
            Numeric::Unorm
        },
        is_srgb: false,
        codec_backend: CodecBackend::Copy,
        supports_volume: true,
        supports_cubemap: true,
        legacy_masks: Some(masks),
    })
}

pub(super) fn encoding_for(format: &PixelFormatInfo) -> Option<LegacyPixelFormat> {
    if let Some(masks) = format.legacy_masks {
        return Some(LegacyPixelFormat {
            flags: masks.flags & !DDPF_FOURCC,
            fourcc: [0; 4],
            bit_count: masks.bit_count,
            r_mask: masks.r,
            g_mask: masks.g,
            b_mask: masks.b,
            a_mask: masks.a,
        });
    }

    if let Some(entry) = FOURCC_TABLE
        .iter()
        .find(|e| e.emit && e.format == format.format_id)
    {
        return Some(LegacyPixelFormat::from_fourcc(entry.tag));
    }

    MASK_TABLE
        .iter()
        .find(|e| e.format == format.format_id)
        .map(|e| LegacyPixelFormat {
            flags: e.kind.flags(e.masks[3]),
            fourcc: [0; 4],
            bit_count: e.bit_count,
            r_mask: e.masks[0],
            g_mask: e.masks[1],
            b_mask: e.masks[2],
            a_mask: e.masks[3],
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> &'static FormatRegistry {
        FormatRegistry::global()
    }

    fn rgb(bit_count: u32, r: u32, g: u32, b: u32, a: u32) -> LegacyPixelFormat {
        LegacyPixelFormat {
            flags: DDPF_RGB | if a != 0 { DDPF_ALPHAPIXELS } else { 0 },
            fourcc: [0; 4],
            bit_count,
            r_mask: r,
            g_mask: g,
            b_mask: b,
            a_mask: a,
        }
    }

    fn resolve_id(pf: &LegacyPixelFormat) -> Option<FormatId> {
        registry().resolve_legacy(pf).map(|r| r.format.format_id)
    }

    #[test]
    fn test_fourcc_dxt_family() {
        let dxt1 = LegacyPixelFormat::from_fourcc(*b"DXT1");
        assert_eq!(resolve_id(&dxt1), Some(FormatId::Bc1Unorm));

        let dxt5 = LegacyPixelFormat::from_fourcc(*b"DXT5");
        let resolved = registry().resolve_legacy(&dxt5).unwrap();
        assert_eq!(resolved.format.format_id, FormatId::Bc3Unorm);
        assert!(!resolved.premultiplied);
    }

    #[test]
    fn test_dxt2_and_dxt4_are_premultiplied() {
        for (tag, id) in [(*b"DXT2", FormatId::Bc2Unorm), (*b"DXT4", FormatId::Bc3Unorm)] {
            let resolved = registry()
                .resolve_legacy(&LegacyPixelFormat::from_fourcc(tag))
                .unwrap();
            assert_eq!(resolved.format.format_id, id);
            assert!(resolved.premultiplied);
        }
    }

    #[test]
    fn test_fourcc_aliases_are_equivalent_encodings() {
        assert_eq!(
            resolve_id(&LegacyPixelFormat::from_fourcc(*b"BC4U")),
            resolve_id(&LegacyPixelFormat::from_fourcc(*b"ATI1"))
        );
        assert_eq!(
            resolve_id(&LegacyPixelFormat::from_fourcc(*b"BC5U")),
            Some(FormatId::Bc5Unorm)
        );
        assert_eq!(
            resolve_id(&LegacyPixelFormat::from_fourcc(*b"BC5S")),
            Some(FormatId::Bc5Snorm)
        );
    }

    #[test]
    fn test_d3dfmt_numeric_codes() {
        let pf = LegacyPixelFormat::from_fourcc(113u32.to_le_bytes());
        assert_eq!(resolve_id(&pf), Some(FormatId::R16G16B16A16Float));
        let pf = LegacyPixelFormat::from_fourcc(116u32.to_le_bytes());
        assert_eq!(resolve_id(&pf), Some(FormatId::R32G32B32A32Float));
    }

    #[test]
    fn test_unknown_fourcc_is_unresolved() {
        assert_eq!(resolve_id(&LegacyPixelFormat::from_fourcc(*b"ETC1")), None);
        assert_eq!(resolve_id(&LegacyPixelFormat::from_fourcc(*b"PTC2")), None);
    }

    #[test]
    fn test_fourcc_flag_without_tag_uses_masks() {
        let mut pf = rgb(32, 0xff, 0xff00, 0xff_0000, 0xff00_0000);
        pf.flags |= DDPF_FOURCC;
        assert_eq!(resolve_id(&pf), Some(FormatId::R8G8B8A8Unorm));
    }

    #[test]
    fn test_common_rgb_masks() {
        assert_eq!(
            resolve_id(&rgb(32, 0xff_0000, 0xff00, 0xff, 0xff00_0000)),
            Some(FormatId::B8G8R8A8Unorm)
        );
        assert_eq!(
            resolve_id(&rgb(32, 0xff_0000, 0xff00, 0xff, 0)),
            Some(FormatId::B8G8R8X8Unorm)
        );
        assert_eq!(
            resolve_id(&rgb(16, 0xf800, 0x7e0, 0x1f, 0)),
            Some(FormatId::B5G6R5Unorm)
        );
    }

    #[test]
    fn test_priority_list_wins_over_fallback() {
        // These masks are also valid input for synthesis.
        let pf = rgb(32, 0xff, 0xff00, 0xff_0000, 0xff00_0000);
        let resolved = registry().resolve_legacy(&pf).unwrap();
        assert_eq!(resolved.format.format_id, FormatId::R8G8B8A8Unorm);
        assert!(resolved.format.legacy_masks.is_none());
        assert!(synthesize(MaskKind::Rgb, pf.masks()).is_some());
    }

    #[test]
    fn test_reversed_ten_bit_mask_is_synthesized() {
        let pf = rgb(32, 0x3ff0_0000, 0xffc00, 0x3ff, 0xc000_0000);
        let resolved = registry().resolve_legacy(&pf).unwrap();
        assert_eq!(resolved.format.format_id, FormatId::LegacyMasked);
        assert_eq!(resolved.format.legacy_masks, Some(pf.masks()));
    }

    #[test]
    fn test_fallback_synthesizes_24_bit_rgb() {
        let pf = rgb(24, 0xff_0000, 0xff00, 0xff, 0);
        let resolved = registry().resolve_legacy(&pf).unwrap();
        let info = resolved.format;
        assert_eq!(info.format_id, FormatId::LegacyMasked);
        assert_eq!(info.bits_per_pixel, 24);
        let ChannelLayout::Packed(set) = info.channels else {
            panic!("expected packed channels");
        };
        assert_eq!(set.get(ChannelRole::R).map(|c| c.shift), Some(16));
        assert_eq!(set.get(ChannelRole::B).map(|c| c.shift), Some(0));
        assert!(!set.has(ChannelRole::A));
    }

    #[test]
    fn test_fallback_rejects_overlapping_or_broken_masks() {
        assert_eq!(resolve_id(&rgb(16, 0xff00, 0x0ff0, 0, 0)), None);
        assert_eq!(resolve_id(&rgb(16, 0xf0f0, 0, 0, 0)), None);
        assert_eq!(resolve_id(&rgb(16, 0x1_0000, 0, 0, 0)), None);
        assert_eq!(resolve_id(&rgb(12, 0xf00, 0xf0, 0xf, 0)), None);
        assert_eq!(resolve_id(&rgb(32, 0, 0, 0, 0)), None);
    }

    #[test]
    fn test_luminance_alpha_and_bump_tables() {
        let l8 = LegacyPixelFormat {
            flags: DDPF_LUMINANCE,
            bit_count: 8,
            r_mask: 0xff,
            ..LegacyPixelFormat::default()
        };
        assert_eq!(resolve_id(&l8), Some(FormatId::R8Unorm));

        let a8 = LegacyPixelFormat {
            flags: DDPF_ALPHA,
            bit_count: 8,
            a_mask: 0xff,
            ..LegacyPixelFormat::default()
        };
        assert_eq!(resolve_id(&a8), Some(FormatId::A8Unorm));

        let v8u8 = LegacyPixelFormat {
            flags: DDPF_BUMPDUDV,
            bit_count: 16,
            r_mask: 0xff,
            g_mask: 0xff00,
            ..LegacyPixelFormat::default()
        };
        assert_eq!(resolve_id(&v8u8), Some(FormatId::R8G8Snorm));
    }

    #[test]
    fn test_encoding_resolves_back_to_same_format() {
        for info in registry().iter() {
            if let Some(pf) = registry().legacy_encoding(info) {
                assert_eq!(
                    resolve_id(&pf),
                    Some(info.format_id),
                    "legacy encoding of {} does not resolve back",
                    info.name
                );
            }
        }
    }

    #[test]
    fn test_formats_without_legacy_encoding() {
        for id in [
            FormatId::Bc7Unorm,
            FormatId::Bc6hUf16,
            FormatId::Bc1UnormSrgb,
            FormatId::R32G32B32Float,
            FormatId::Astc4x4Unorm,
            FormatId::R8Snorm,
        ] {
            let info = registry().lookup(id).unwrap();
            assert!(registry().legacy_encoding(info).is_none(), "{}", info.name);
        }
    }

    #[test]
    fn test_emitted_tags() {
        let bc2 = registry().lookup(FormatId::Bc2Unorm).unwrap();
        assert_eq!(registry().legacy_encoding(bc2).unwrap().fourcc, *b"DXT3");
        let bc4 = registry().lookup(FormatId::Bc4Unorm).unwrap();
        assert_eq!(registry().legacy_encoding(bc4).unwrap().fourcc, *b"ATI1");
    }
}
