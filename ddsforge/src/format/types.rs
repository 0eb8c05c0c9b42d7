//! Pixel format descriptions shared by every other module.

use std::fmt;

/// Canonical pixel format identifiers.
///
/// Discriminants are the extended-header (DXGI) format codes. ASTC uses the
/// de-facto extended codes 133-187. [`FormatId::LegacyMasked`] is the
/// pseudo-format synthesized for legacy bit masks the registry does not know;
/// it has no extended code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FormatId {
    LegacyMasked = 0,
    R32G32B32A32Float = 2,
    R32G32B32Float = 6,
    R16G16B16A16Float = 10,
    R16G16B16A16Unorm = 11,
    R16G16B16A16Snorm = 13,
    R32G32Float = 16,
    R10G10B10A2Unorm = 24,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    R8G8B8A8Snorm = 31,
    R16G16Float = 34,
    R16G16Unorm = 35,
    R16G16Snorm = 37,
    R32Float = 41,
    R8G8Unorm = 49,
    R8G8Snorm = 51,
    R16Float = 54,
    R16Unorm = 56,
    R16Snorm = 58,
    R8Unorm = 61,
    R8Snorm = 63,
    A8Unorm = 65,
    Bc1Unorm = 71,
    Bc1UnormSrgb = 72,
    Bc2Unorm = 74,
    Bc2UnormSrgb = 75,
    Bc3Unorm = 77,
    Bc3UnormSrgb = 78,
    Bc4Unorm = 80,
    Bc4Snorm = 81,
    Bc5Unorm = 83,
    Bc5Snorm = 84,
    B5G6R5Unorm = 85,
    B5G5R5A1Unorm = 86,
    B8G8R8A8Unorm = 87,
    B8G8R8X8Unorm = 88,
    B8G8R8A8UnormSrgb = 91,
    B8G8R8X8UnormSrgb = 93,
    Bc6hUf16 = 95,
    Bc6hSf16 = 96,
    Bc7Unorm = 98,
    Bc7UnormSrgb = 99,
    B4G4R4A4Unorm = 115,
    Astc4x4Unorm = 134,
    Astc4x4UnormSrgb = 135,
    Astc5x4Unorm = 138,
    Astc5x4UnormSrgb = 139,
    Astc5x5Unorm = 142,
    Astc5x5UnormSrgb = 143,
    Astc6x5Unorm = 146,
    Astc6x5UnormSrgb = 147,
    Astc6x6Unorm = 150,
    Astc6x6UnormSrgb = 151,
    Astc8x5Unorm = 154,
    Astc8x5UnormSrgb = 155,
    Astc8x6Unorm = 158,
    Astc8x6UnormSrgb = 159,
    Astc8x8Unorm = 162,
    Astc8x8UnormSrgb = 163,
    Astc10x5Unorm = 166,
    Astc10x5UnormSrgb = 167,
    Astc10x6Unorm = 170,
    Astc10x6UnormSrgb = 171,
    Astc10x8Unorm = 174,
    Astc10x8UnormSrgb = 175,
    Astc10x10Unorm = 178,
    Astc10x10UnormSrgb = 179,
    Astc12x10Unorm = 182,
    Astc12x10UnormSrgb = 183,
    Astc12x12Unorm = 186,
    Astc12x12UnormSrgb = 187,
}

impl FormatId {
    /// Extended-header format code, or `None` for [`FormatId::LegacyMasked`].
    pub fn dxgi(self) -> Option<u32> {
        match self {
            FormatId::LegacyMasked => None,
            id => Some(id as u32),
        }
    }
}

/// Role of one channel inside a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    R,
    G,
    B,
    A,
    /// Padding; ignored on import, written as all ones on export.
    X,
}

/// One channel: its role and its bit field inside the little-endian pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelSpec {
    pub role: ChannelRole,
    pub shift: u8,
    pub bits: u8,
}

const EMPTY_CHANNEL: ChannelSpec = ChannelSpec {
    role: ChannelRole::X,
    shift: 0,
    bits: 0,
};

/// Up to four channels, ordered from the least significant bit upwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelSet {
    specs: [ChannelSpec; 4],
    len: u8,
}

impl ChannelSet {
    /// Lays out channels back to back starting at bit 0.
    pub const fn sequential(roles: &[ChannelRole], bits: &[u8]) -> Self {
        let mut specs = [EMPTY_CHANNEL; 4];
        let mut shift = 0u8;
        let mut i = 0;
        while i < roles.len() {
            specs[i] = ChannelSpec {
                role: roles[i],
                shift,
                bits: bits[i],
            };
            shift += bits[i];
            i += 1;
        }
        Self {
            specs,
            len: roles.len() as u8,
        }
    }

    /// Builds a set from arbitrary channel specs (at most four are kept).
    pub fn from_specs(specs: &[ChannelSpec]) -> Self {
        let mut out = [EMPTY_CHANNEL; 4];
        let len = specs.len().min(4);
        out[..len].copy_from_slice(&specs[..len]);
        Self {
            specs: out,
            len: len as u8,
        }
    }

    pub fn as_slice(&self) -> &[ChannelSpec] {
        &self.specs[..self.len as usize]
    }

    pub fn get(&self, role: ChannelRole) -> Option<&ChannelSpec> {
        self.as_slice().iter().find(|c| c.role == role)
    }

    pub fn has(&self, role: ChannelRole) -> bool {
        self.get(role).is_some()
    }
}

impl fmt::Debug for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Channel description of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Packed(ChannelSet),
    /// Block-compressed; channels are only visible through the codec.
    Opaque,
}

/// Numeric interpretation of channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Numeric {
    Unorm,
    Snorm,
    Float,
}

/// Which collaborator materializes pixel data for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecBackend {
    /// Uncompressed; handled by the channel remapper.
    Copy,
    BlockCompression,
    Astc,
}

/// Block geometry of a compressed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInfo {
    pub width: u32,
    pub height: u32,
    pub bytes_per_block: u32,
}

/// Raw legacy bit-mask description, preserved for round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelMasks {
    /// Legacy pixel-format flags the masks were read with.
    pub flags: u32,
    pub bit_count: u32,
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
}

impl fmt::Display for PixelMasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-bit r={:#010x} g={:#010x} b={:#010x} a={:#010x} (flags {:#x})",
            self.bit_count, self.r, self.g, self.b, self.a, self.flags
        )
    }
}

/// Everything the crate needs to know about one pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormatInfo {
    pub format_id: FormatId,
    pub name: &'static str,
    /// `Some` for block-compressed formats.
    pub block: Option<BlockInfo>,
    /// Bits per pixel; zero for block-compressed formats.
    pub bits_per_pixel: u32,
    pub channels: ChannelLayout,
    pub numeric: Numeric,
    pub is_srgb: bool,
    pub codec_backend: CodecBackend,
    pub supports_volume: bool,
    pub supports_cubemap: bool,
    /// Set only on synthesized [`FormatId::LegacyMasked`] entries.
    pub legacy_masks: Option<PixelMasks>,
}

impl PixelFormatInfo {
    pub fn is_block_compressed(&self) -> bool {
        self.block.is_some()
    }

    pub fn is_signed_normalized(&self) -> bool {
        self.numeric == Numeric::Snorm
    }

    pub fn is_float(&self) -> bool {
        self.numeric == Numeric::Float
    }

    /// Whole bytes per pixel for uncompressed formats.
    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_pixel.div_ceil(8)
    }

    /// Whether the format stores an alpha channel.
    pub fn has_alpha(&self) -> bool {
        match self.channels {
            ChannelLayout::Packed(set) => set.has(ChannelRole::A),
            ChannelLayout::Opaque => !matches!(
                self.format_id,
                FormatId::Bc4Unorm
                    | FormatId::Bc4Snorm
                    | FormatId::Bc5Unorm
                    | FormatId::Bc5Snorm
                    | FormatId::Bc6hUf16
                    | FormatId::Bc6hSf16
            ),
        }
    }
}

impl fmt::Display for PixelFormatInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.legacy_masks {
            Some(masks) => write!(f, "{} [{}]", self.name, masks),
            None => f.write_str(self.name),
        }
    }
}
