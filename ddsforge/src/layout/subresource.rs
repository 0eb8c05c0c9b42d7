//! Subresource addressing and sizing.

use std::fmt;

use crate::format::PixelFormatInfo;

/// Address of one subresource within a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SubresourceKey {
    pub array_index: u32,
    /// Cubemap face (+X, -X, +Y, -Y, +Z, -Z); 0 for non-cubemaps.
    pub face_index: u32,
    pub mip_level: u32,
    /// Depth slice at this mip level; 0 for non-volumes.
    pub depth_slice: u32,
}

impl SubresourceKey {
    /// Key of a plain 2D image at the given mip level.
    pub fn mip(mip_level: u32) -> Self {
        Self {
            mip_level,
            ..Self::default()
        }
    }
}

impl fmt::Display for SubresourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "array {} face {} mip {} slice {}",
            self.array_index, self.face_index, self.mip_level, self.depth_slice
        )
    }
}

/// One planned subresource and its byte range in the pixel-data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subresource {
    pub key: SubresourceKey,
    /// Offset relative to the start of the pixel-data blob.
    pub byte_offset: usize,
    pub byte_length: usize,
    pub slice_width: u32,
    pub slice_height: u32,
}

impl Subresource {
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_offset..self.byte_offset + self.byte_length
    }
}

/// Bytes occupied by one `width` x `height` image in `format`.
///
/// Block-compressed formats round up to whole blocks; uncompressed formats
/// round sub-byte totals up to whole bytes. Saturates at `usize::MAX` for
/// extents that cannot be addressed; see [`checked_surface_size`].
pub fn surface_size(format: &PixelFormatInfo, width: u32, height: u32) -> usize {
    checked_surface_size(format, width, height).unwrap_or(usize::MAX)
}

/// Like [`surface_size`], but `None` when the size overflows `usize`.
pub fn checked_surface_size(format: &PixelFormatInfo, width: u32, height: u32) -> Option<usize> {
    match format.block {
        Some(block) => {
            let blocks_x = width.div_ceil(block.width) as usize;
            let blocks_y = height.div_ceil(block.height) as usize;
            blocks_x
                .checked_mul(blocks_y)?
                .checked_mul(block.bytes_per_block as usize)
        }
        None => {
            let bits = (width as u64)
                .checked_mul(height as u64)?
                .checked_mul(format.bits_per_pixel as u64)?;
            usize::try_from(bits.div_ceil(8)).ok()
        }
    }
}

/// Bytes per row (or per row of blocks) of a `width`-wide image.
///
/// Saturates at `u32::MAX`.
pub fn row_pitch(format: &PixelFormatInfo, width: u32) -> u32 {
    let pitch = match format.block {
        Some(block) => width.div_ceil(block.width) as u64 * block.bytes_per_block as u64,
        None => (width as u64 * format.bits_per_pixel as u64).div_ceil(8),
    };
    u32::try_from(pitch).unwrap_or(u32::MAX)
}
