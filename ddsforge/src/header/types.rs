//! Raw container header structures and constants.
//!
//! Field layout follows the public DDS container documentation:
//! <https://learn.microsoft.com/en-us/windows/win32/direct3ddds/dds-header>

use crate::error::{DdsError, Result};
use crate::format::LegacyPixelFormat;

/// Magic marker at the start of every container: "DDS ".
pub const DDS_MAGIC: [u8; 4] = *b"DDS ";
/// Declared size of the legacy header.
pub const HEADER_SIZE: u32 = 124;
/// Declared size of the embedded pixel-format block.
pub const PIXEL_FORMAT_SIZE: u32 = 32;
/// Size of the extended header.
pub const DX10_HEADER_SIZE: usize = 20;
/// Pixel data offset without the extended header.
pub const LEGACY_DATA_OFFSET: usize = 4 + HEADER_SIZE as usize;
/// Pixel data offset with the extended header.
pub const EXTENDED_DATA_OFFSET: usize = LEGACY_DATA_OFFSET + DX10_HEADER_SIZE;
/// Four-character code announcing the extended header.
pub const DX10_FOURCC: [u8; 4] = *b"DX10";

// Byte offsets of fields within the file, used in error reports.
pub const OFFSET_SIZE: usize = 4;
pub const OFFSET_HEIGHT: usize = 12;
pub const OFFSET_WIDTH: usize = 16;
pub const OFFSET_DEPTH: usize = 24;
pub const OFFSET_MIP_COUNT: usize = 28;
pub const OFFSET_PIXEL_FORMAT: usize = 76;
pub const OFFSET_FOURCC: usize = 84;
pub const OFFSET_CAPS2: usize = 112;
pub const OFFSET_DXGI_FORMAT: usize = 128;
pub const OFFSET_RESOURCE_DIMENSION: usize = 132;
pub const OFFSET_ARRAY_SIZE: usize = 140;
pub const OFFSET_MISC_FLAGS2: usize = 144;

// Header flags
pub const DDSD_CAPS: u32 = 0x1;
pub const DDSD_HEIGHT: u32 = 0x2;
pub const DDSD_WIDTH: u32 = 0x4;
pub const DDSD_PITCH: u32 = 0x8;
pub const DDSD_PIXELFORMAT: u32 = 0x1000;
pub const DDSD_MIPMAPCOUNT: u32 = 0x20000;
pub const DDSD_LINEARSIZE: u32 = 0x80000;
pub const DDSD_DEPTH: u32 = 0x800000;

// Caps
pub const DDSCAPS_COMPLEX: u32 = 0x8;
pub const DDSCAPS_TEXTURE: u32 = 0x1000;
pub const DDSCAPS_MIPMAP: u32 = 0x400000;

// Caps2
pub const DDSCAPS2_CUBEMAP: u32 = 0x200;
pub const DDSCAPS2_CUBEMAP_POSITIVEX: u32 = 0x400;
pub const DDSCAPS2_CUBEMAP_NEGATIVEX: u32 = 0x800;
pub const DDSCAPS2_CUBEMAP_POSITIVEY: u32 = 0x1000;
pub const DDSCAPS2_CUBEMAP_NEGATIVEY: u32 = 0x2000;
pub const DDSCAPS2_CUBEMAP_POSITIVEZ: u32 = 0x4000;
pub const DDSCAPS2_CUBEMAP_NEGATIVEZ: u32 = 0x8000;
pub const DDSCAPS2_CUBEMAP_ALLFACES: u32 = DDSCAPS2_CUBEMAP_POSITIVEX
    | DDSCAPS2_CUBEMAP_NEGATIVEX
    | DDSCAPS2_CUBEMAP_POSITIVEY
    | DDSCAPS2_CUBEMAP_NEGATIVEY
    | DDSCAPS2_CUBEMAP_POSITIVEZ
    | DDSCAPS2_CUBEMAP_NEGATIVEZ;
pub const DDSCAPS2_VOLUME: u32 = 0x200000;

// Extended header
pub const RESOURCE_DIMENSION_TEXTURE1D: u32 = 2;
pub const RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
pub const RESOURCE_DIMENSION_TEXTURE3D: u32 = 4;
pub const RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;
pub const MISC_FLAGS2_ALPHA_MODE_MASK: u32 = 0x7;

/// The legacy header as stored on disk (without the magic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawHeader {
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    /// Informational only; never used for layout.
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format_size: u32,
    pub pixel_format: LegacyPixelFormat,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
    pub dx10: Option<Dx10Header>,
}

/// The optional 20-byte extended header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dx10Header {
    pub dxgi_format: u32,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
    pub misc_flags2: u32,
}

impl RawHeader {
    /// Whether the pixel-format block announces the extended header.
    pub fn announces_dx10(&self) -> bool {
        self.pixel_format.uses_fourcc() && self.pixel_format.fourcc == DX10_FOURCC
    }

    /// Offset of the pixel-data blob.
    pub fn data_offset(&self) -> usize {
        if self.dx10.is_some() {
            EXTENDED_DATA_OFFSET
        } else {
            LEGACY_DATA_OFFSET
        }
    }

    /// Reads the magic, the legacy header and, when announced, the extended header.
    ///
    /// Only framing is checked here (magic and truncation); declared sizes
    /// are validated by the decoder.
    pub fn parse(bytes: &[u8]) -> Result<RawHeader> {
        if bytes.len() < 4 || bytes[..4] != DDS_MAGIC {
            return Err(DdsError::malformed(
                "magic",
                0,
                format!(
                    "expected 'DDS ', found {:02x?}",
                    &bytes[..bytes.len().min(4)]
                ),
            ));
        }
        if bytes.len() < LEGACY_DATA_OFFSET {
            return Err(DdsError::malformed(
                "header",
                bytes.len(),
                format!(
                    "container ends after {} bytes, header needs {}",
                    bytes.len(),
                    LEGACY_DATA_OFFSET
                ),
            ));
        }

        let mut r = Reader::new(bytes, 4);
        let mut header = RawHeader {
            size: r.u32(),
            flags: r.u32(),
            height: r.u32(),
            width: r.u32(),
            pitch_or_linear_size: r.u32(),
            depth: r.u32(),
            mip_map_count: r.u32(),
            ..RawHeader::default()
        };
        for slot in header.reserved1.iter_mut() {
            *slot = r.u32();
        }
        header.pixel_format_size = r.u32();
        header.pixel_format = LegacyPixelFormat {
            flags: r.u32(),
            fourcc: r.fourcc(),
            bit_count: r.u32(),
            r_mask: r.u32(),
            g_mask: r.u32(),
            b_mask: r.u32(),
            a_mask: r.u32(),
        };
        header.caps = r.u32();
        header.caps2 = r.u32();
        header.caps3 = r.u32();
        header.caps4 = r.u32();
        header.reserved2 = r.u32();

        if header.announces_dx10() {
            if bytes.len() < EXTENDED_DATA_OFFSET {
                return Err(DdsError::malformed(
                    "extended_header",
                    bytes.len(),
                    format!(
                        "container ends after {} bytes, extended header needs {}",
                        bytes.len(),
                        EXTENDED_DATA_OFFSET
                    ),
                ));
            }
            header.dx10 = Some(Dx10Header {
                dxgi_format: r.u32(),
                resource_dimension: r.u32(),
                misc_flag: r.u32(),
                array_size: r.u32(),
                misc_flags2: r.u32(),
            });
        }
        Ok(header)
    }

    /// Serializes the magic, legacy header and optional extended header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data_offset());

        // Magic
        bytes.extend_from_slice(&DDS_MAGIC);

        // Header fields
        bytes.extend_from_slice(&self.size.to_le_bytes());
        bytes.extend_from_slice(&self.flags.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.pitch_or_linear_size.to_le_bytes());
        bytes.extend_from_slice(&self.depth.to_le_bytes());
        bytes.extend_from_slice(&self.mip_map_count.to_le_bytes());
        for &val in &self.reserved1 {
            bytes.extend_from_slice(&val.to_le_bytes());
        }

        // Pixel format (32 bytes)
        let pf = &self.pixel_format;
        bytes.extend_from_slice(&self.pixel_format_size.to_le_bytes());
        bytes.extend_from_slice(&pf.flags.to_le_bytes());
        bytes.extend_from_slice(&pf.fourcc);
        bytes.extend_from_slice(&pf.bit_count.to_le_bytes());
        bytes.extend_from_slice(&pf.r_mask.to_le_bytes());
        bytes.extend_from_slice(&pf.g_mask.to_le_bytes());
        bytes.extend_from_slice(&pf.b_mask.to_le_bytes());
        bytes.extend_from_slice(&pf.a_mask.to_le_bytes());

        // Caps
        bytes.extend_from_slice(&self.caps.to_le_bytes());
        bytes.extend_from_slice(&self.caps2.to_le_bytes());
        bytes.extend_from_slice(&self.caps3.to_le_bytes());
        bytes.extend_from_slice(&self.caps4.to_le_bytes());
        bytes.extend_from_slice(&self.reserved2.to_le_bytes());

        if let Some(dx10) = &self.dx10 {
            bytes.extend_from_slice(&dx10.dxgi_format.to_le_bytes());
            bytes.extend_from_slice(&dx10.resource_dimension.to_le_bytes());
            bytes.extend_from_slice(&dx10.misc_flag.to_le_bytes());
            bytes.extend_from_slice(&dx10.array_size.to_le_bytes());
            bytes.extend_from_slice(&dx10.misc_flags2.to_le_bytes());
        }

        bytes
    }
}

/// Little-endian cursor over a buffer whose length was checked up front.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn fourcc(&mut self) -> [u8; 4] {
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.fourcc())
    }
}
