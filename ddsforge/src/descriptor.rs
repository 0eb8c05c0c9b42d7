//! Texture descriptors.
//!
//! A [`TextureDescriptor`] is the immutable, normalized description of a
//! texture: its extent, mip chain, array and cubemap shape, pixel format and
//! alpha mode. The header codec produces one from container bytes; callers
//! build one for export.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DdsError, Result};
use crate::format::PixelFormatInfo;
use crate::layout::plan;

/// Resource dimension of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "1d")]
    Texture1D,
    #[serde(rename = "2d")]
    Texture2D,
    #[serde(rename = "3d")]
    Texture3D,
}

/// How the alpha channel is to be interpreted. Preserved verbatim; never
/// acted upon by the container codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    #[default]
    Unknown,
    Straight,
    Premultiplied,
    Opaque,
    Custom,
}

impl AlphaMode {
    /// Parses the low bits of the extended header's second flags field.
    pub fn from_raw(raw: u32) -> Option<AlphaMode> {
        match raw {
            0 => Some(AlphaMode::Unknown),
            1 => Some(AlphaMode::Straight),
            2 => Some(AlphaMode::Premultiplied),
            3 => Some(AlphaMode::Opaque),
            4 => Some(AlphaMode::Custom),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            AlphaMode::Unknown => 0,
            AlphaMode::Straight => 1,
            AlphaMode::Premultiplied => 2,
            AlphaMode::Opaque => 3,
            AlphaMode::Custom => 4,
        }
    }
}

/// The shape of a texture as a single tagged value.
///
/// Consumed by the layout planner and the header encoder so dimension and
/// cubemap logic lives in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture1D,
    Texture2D,
    Texture2DCubemap,
    Texture3D,
}

impl TextureKind {
    /// The kind described by a resource dimension and cubemap flag.
    pub fn from_shape(dimension: Dimension, is_cubemap: bool) -> Self {
        match (dimension, is_cubemap) {
            (Dimension::Texture1D, _) => TextureKind::Texture1D,
            (Dimension::Texture2D, true) => TextureKind::Texture2DCubemap,
            (Dimension::Texture2D, false) => TextureKind::Texture2D,
            (Dimension::Texture3D, _) => TextureKind::Texture3D,
        }
    }

    pub fn dimension(self) -> Dimension {
        match self {
            TextureKind::Texture1D => Dimension::Texture1D,
            TextureKind::Texture2D | TextureKind::Texture2DCubemap => Dimension::Texture2D,
            TextureKind::Texture3D => Dimension::Texture3D,
        }
    }

    pub fn is_cubemap(self) -> bool {
        self == TextureKind::Texture2DCubemap
    }

    /// Faces per array element: 6 for cubemaps, otherwise 1.
    pub fn faces(self) -> u32 {
        if self.is_cubemap() {
            6
        } else {
            1
        }
    }
}

/// Number of levels in a full mip chain for the largest of the given extents.
pub fn max_mip_count(width: u32, height: u32, depth: u32) -> u32 {
    let largest = width.max(height).max(depth).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Extent of `size` at mip level `level`, never below one.
pub fn mip_extent(size: u32, level: u32) -> u32 {
    size.checked_shr(level).unwrap_or(0).max(1)
}

/// Immutable description of one texture.
///
/// # Example
///
/// ```
/// use ddsforge::descriptor::{TextureDescriptor, TextureKind};
/// use ddsforge::format::{FormatId, FormatRegistry};
///
/// let bc1 = *FormatRegistry::global().lookup(FormatId::Bc1Unorm).unwrap();
/// let cube = TextureDescriptor::new_cubemap(128, bc1).with_mip_count(8);
///
/// assert_eq!(cube.kind(), TextureKind::Texture2DCubemap);
/// assert!(cube.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    /// 1 unless the texture is a volume.
    pub depth: u32,
    pub mip_count: u32,
    /// Array elements. For cubemaps this counts whole cubes.
    pub array_size: u32,
    pub dimension: Dimension,
    pub is_cubemap: bool,
    pub format: PixelFormatInfo,
    pub alpha_mode: AlphaMode,
}

impl TextureDescriptor {
    fn base(width: u32, height: u32, depth: u32, dimension: Dimension, format: PixelFormatInfo) -> Self {
        Self {
            width,
            height,
            depth,
            mip_count: 1,
            array_size: 1,
            dimension,
            is_cubemap: false,
            format,
            alpha_mode: AlphaMode::Unknown,
        }
    }

    /// A single-mip 1D texture.
    pub fn new_1d(width: u32, format: PixelFormatInfo) -> Self {
        Self::base(width, 1, 1, Dimension::Texture1D, format)
    }

    /// A single-mip 2D texture.
    pub fn new_2d(width: u32, height: u32, format: PixelFormatInfo) -> Self {
        Self::base(width, height, 1, Dimension::Texture2D, format)
    }

    /// A single-mip cubemap with square faces of `size`.
    pub fn new_cubemap(size: u32, format: PixelFormatInfo) -> Self {
        Self {
            is_cubemap: true,
            ..Self::base(size, size, 1, Dimension::Texture2D, format)
        }
    }

    /// A single-mip volume texture.
    pub fn new_volume(width: u32, height: u32, depth: u32, format: PixelFormatInfo) -> Self {
        Self::base(width, height, depth, Dimension::Texture3D, format)
    }

    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    /// Sets the mip count to the full chain for the current extent.
    pub fn with_full_mip_chain(mut self) -> Self {
        self.mip_count = self.full_mip_chain();
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    pub fn with_format(mut self, format: PixelFormatInfo) -> Self {
        self.format = format;
        self
    }

    /// The tagged shape of this texture.
    pub fn kind(&self) -> TextureKind {
        TextureKind::from_shape(self.dimension, self.is_cubemap)
    }

    pub fn faces(&self) -> u32 {
        self.kind().faces()
    }

    /// Length of the longest possible mip chain for this extent.
    pub fn full_mip_chain(&self) -> u32 {
        let depth = if self.dimension == Dimension::Texture3D {
            self.depth
        } else {
            1
        };
        max_mip_count(self.width, self.height, depth)
    }

    /// Checks every descriptor invariant, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(DdsError::invalid(
                "extent",
                format!(
                    "width, height and depth must be at least 1 (got {}x{}x{})",
                    self.width, self.height, self.depth
                ),
            ));
        }
        if self.array_size == 0 {
            return Err(DdsError::invalid("array_size", "must be at least 1"));
        }
        let chain = self.full_mip_chain();
        if self.mip_count == 0 || self.mip_count > chain {
            return Err(DdsError::invalid(
                "mip_count",
                format!(
                    "{} is outside 1..={} for a {}x{}x{} texture",
                    self.mip_count, chain, self.width, self.height, self.depth
                ),
            ));
        }

        if self.depth > 1 && self.dimension != Dimension::Texture3D {
            return Err(DdsError::dimensions(format!(
                "depth {} requires a volume texture",
                self.depth
            )));
        }
        match self.kind() {
            TextureKind::Texture1D => {
                if self.height != 1 {
                    return Err(DdsError::dimensions(format!(
                        "1D texture with height {}",
                        self.height
                    )));
                }
                if self.is_cubemap {
                    return Err(DdsError::dimensions("1D cubemap"));
                }
            }
            TextureKind::Texture2D => {}
            TextureKind::Texture2DCubemap => {
                if self.width != self.height {
                    return Err(DdsError::dimensions(format!(
                        "cubemap faces must be square (got {}x{})",
                        self.width, self.height
                    )));
                }
                if !self.format.supports_cubemap {
                    return Err(DdsError::dimensions(format!(
                        "{} cannot be used for cubemaps",
                        self.format.name
                    )));
                }
            }
            TextureKind::Texture3D => {
                if self.is_cubemap {
                    return Err(DdsError::dimensions("volume cubemap"));
                }
                if self.array_size != 1 {
                    return Err(DdsError::dimensions(format!(
                        "volume texture with array size {}",
                        self.array_size
                    )));
                }
                if !self.format.supports_volume {
                    return Err(DdsError::dimensions(format!(
                        "{} cannot be used for volume textures",
                        self.format.name
                    )));
                }
            }
        }

        if plan(self).checked_total_size().is_none() {
            return Err(DdsError::invalid(
                "width",
                format!(
                    "{}x{}x{} {} with {} element(s) is too large to address",
                    self.width, self.height, self.depth, self.format.name, self.array_size
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for TextureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.kind() {
            TextureKind::Texture1D => format!("1D {}", self.width),
            TextureKind::Texture2D => format!("2D {}x{}", self.width, self.height),
            TextureKind::Texture2DCubemap => format!("cube {}x{}", self.width, self.height),
            TextureKind::Texture3D => {
                format!("volume {}x{}x{}", self.width, self.height, self.depth)
            }
        };
        write!(
            f,
            "{} {}, {} mip(s), array {}",
            shape, self.format, self.mip_count, self.array_size
        )?;
        if self.alpha_mode != AlphaMode::Unknown {
            write!(f, ", alpha {:?}", self.alpha_mode)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{FormatId, FormatRegistry};

    fn format(id: FormatId) -> PixelFormatInfo {
        *FormatRegistry::global().lookup(id).unwrap()
    }

    #[test]
    fn test_max_mip_count() {
        assert_eq!(max_mip_count(1, 1, 1), 1);
        assert_eq!(max_mip_count(256, 256, 1), 9);
        assert_eq!(max_mip_count(256, 1, 1), 9);
        assert_eq!(max_mip_count(300, 20, 1), 9);
        assert_eq!(max_mip_count(64, 64, 8), 7);
    }

    #[test]
    fn test_mip_extent_clamps_to_one() {
        assert_eq!(mip_extent(64, 0), 64);
        assert_eq!(mip_extent(64, 3), 8);
        assert_eq!(mip_extent(64, 10), 1);
        assert_eq!(mip_extent(5, 40), 1);
    }

    #[test]
    fn test_kind_variants() {
        let rgba = format(FormatId::R8G8B8A8Unorm);
        assert_eq!(TextureDescriptor::new_1d(16, rgba).kind(), TextureKind::Texture1D);
        assert_eq!(TextureDescriptor::new_2d(16, 8, rgba).kind(), TextureKind::Texture2D);
        assert_eq!(
            TextureDescriptor::new_cubemap(16, rgba).kind(),
            TextureKind::Texture2DCubemap
        );
        assert_eq!(
            TextureDescriptor::new_volume(16, 16, 4, rgba).kind(),
            TextureKind::Texture3D
        );
    }

    #[test]
    fn test_full_mip_chain_is_valid() {
        let desc = TextureDescriptor::new_2d(256, 64, format(FormatId::Bc1Unorm)).with_full_mip_chain();
        assert_eq!(desc.mip_count, 9);
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_mip_count_beyond_chain_rejected() {
        let desc = TextureDescriptor::new_2d(16, 16, format(FormatId::R8Unorm)).with_mip_count(6);
        let err = desc.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
    }

    #[test]
    fn test_zero_extent_rejected() {
        let desc = TextureDescriptor::new_2d(0, 16, format(FormatId::R8Unorm));
        assert_eq!(desc.validate().unwrap_err().kind(), ErrorKind::InvalidDescriptor);
    }

    #[test]
    fn test_unaddressable_extent_rejected() {
        let huge = 1u32 << 31;
        let desc = TextureDescriptor::new_2d(huge, huge, format(FormatId::R32G32B32A32Float));
        match desc.validate().unwrap_err() {
            DdsError::InvalidDescriptor { field, .. } => assert_eq!(field, "width"),
            other => panic!("expected InvalidDescriptor, got {:?}", other),
        }
        assert!(TextureDescriptor::new_2d(huge, 1, format(FormatId::R8Unorm)).validate().is_ok());
    }

    #[test]
    fn test_depth_requires_volume() {
        let mut desc = TextureDescriptor::new_2d(16, 16, format(FormatId::R8Unorm));
        desc.depth = 4;
        assert_eq!(
            desc.validate().unwrap_err().kind(),
            ErrorKind::UnsupportedDimensionCombination
        );
    }

    #[test]
    fn test_volume_array_rejected() {
        let desc = TextureDescriptor::new_volume(16, 16, 4, format(FormatId::R8Unorm)).with_array_size(2);
        assert_eq!(
            desc.validate().unwrap_err().kind(),
            ErrorKind::UnsupportedDimensionCombination
        );
    }

    #[test]
    fn test_astc_volume_and_cubemap_rejected() {
        let astc = format(FormatId::Astc6x6Unorm);
        let volume = TextureDescriptor::new_volume(36, 36, 2, astc);
        assert_eq!(
            volume.validate().unwrap_err().kind(),
            ErrorKind::UnsupportedDimensionCombination
        );
        let cube = TextureDescriptor::new_cubemap(36, astc);
        assert_eq!(
            cube.validate().unwrap_err().kind(),
            ErrorKind::UnsupportedDimensionCombination
        );
        assert!(TextureDescriptor::new_2d(36, 36, astc).with_array_size(3).validate().is_ok());
    }

    #[test]
    fn test_cubemap_faces_must_be_square() {
        let mut desc = TextureDescriptor::new_cubemap(32, format(FormatId::Bc3Unorm));
        desc.height = 16;
        assert_eq!(
            desc.validate().unwrap_err().kind(),
            ErrorKind::UnsupportedDimensionCombination
        );
    }

    #[test]
    fn test_alpha_mode_raw_round_trip() {
        for raw in 0..5 {
            assert_eq!(AlphaMode::from_raw(raw).map(AlphaMode::as_raw), Some(raw));
        }
        assert_eq!(AlphaMode::from_raw(5), None);
    }

    #[test]
    fn test_display() {
        let desc = TextureDescriptor::new_cubemap(128, format(FormatId::Bc1Unorm))
            .with_mip_count(2)
            .with_alpha_mode(AlphaMode::Premultiplied);
        assert_eq!(
            desc.to_string(),
            "cube 128x128 BC1_UNORM, 2 mip(s), array 1, alpha Premultiplied"
        );
    }
}
