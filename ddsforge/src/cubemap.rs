//! Cubemap face layouts for flat host images.
//!
//! Face cells, in face order +X, -X, +Y, -Y, +Z, -Z:
//!
//! ```text
//! h-cross (4x3)      v-cross (3x4)      h-strip (6x1)       v-strip (1x6)
//!    . +Y .  .         . +Y .           +X -X +Y -Y +Z -Z   +X
//!   -X +Z +X -Z       -X +Z +X                              -X
//!    . -Y .  .         . -Y .                               ...
//!                      . -Z .                               -Z
//! ```
//!
//! The vertical cross stores -Z rotated by 180 degrees so the cross folds
//! into a cube. The `-fnz` variants invert that choice.

use std::fmt;
use std::str::FromStr;

use image::imageops;
use image::Rgba32FImage;
use serde::{Deserialize, Serialize};

use crate::descriptor::{AlphaMode, Dimension};
use crate::error::{DdsError, Result};
use crate::host::{HostTexture, TextureMetadata, TextureType};
use crate::layout::SubresourceKey;

const NEGATIVE_Z: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CubemapLayout {
    #[default]
    HCross,
    VCross,
    HCrossFnz,
    VCrossFnz,
    HStrip,
    VStrip,
}

impl CubemapLayout {
    pub const ALL: [CubemapLayout; 6] = [
        CubemapLayout::HCross,
        CubemapLayout::VCross,
        CubemapLayout::HCrossFnz,
        CubemapLayout::VCrossFnz,
        CubemapLayout::HStrip,
        CubemapLayout::VStrip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CubemapLayout::HCross => "h-cross",
            CubemapLayout::VCross => "v-cross",
            CubemapLayout::HCrossFnz => "h-cross-fnz",
            CubemapLayout::VCrossFnz => "v-cross-fnz",
            CubemapLayout::HStrip => "h-strip",
            CubemapLayout::VStrip => "v-strip",
        }
    }

    /// Columns and rows of face cells.
    pub fn grid(self) -> (u32, u32) {
        match self {
            CubemapLayout::HCross | CubemapLayout::HCrossFnz => (4, 3),
            CubemapLayout::VCross | CubemapLayout::VCrossFnz => (3, 4),
            CubemapLayout::HStrip => (6, 1),
            CubemapLayout::VStrip => (1, 6),
        }
    }

    fn cells(self) -> [(u32, u32); 6] {
        match self {
            CubemapLayout::HCross | CubemapLayout::HCrossFnz => {
                [(2, 1), (0, 1), (1, 0), (1, 2), (1, 1), (3, 1)]
            }
            CubemapLayout::VCross | CubemapLayout::VCrossFnz => {
                [(2, 1), (0, 1), (1, 0), (1, 2), (1, 1), (1, 3)]
            }
            CubemapLayout::HStrip => [(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0)],
            CubemapLayout::VStrip => [(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5)],
        }
    }

    fn rotates_negative_z(self) -> bool {
        matches!(self, CubemapLayout::VCross | CubemapLayout::HCrossFnz)
    }

    /// Edge length of one face in a `width` x `height` image.
    ///
    /// # Errors
    ///
    /// `InvalidDescriptor` when the image does not have the layout's
    /// aspect ratio.
    pub fn face_size(self, width: u32, height: u32) -> Result<u32> {
        let (columns, rows) = self.grid();
        let size = width / columns;
        if size == 0 || width % columns != 0 || height != size * rows {
            return Err(DdsError::invalid(
                "cubemap_layout",
                format!(
                    "{} expects a {}:{} image, got {}x{}",
                    self, columns, rows, width, height
                ),
            ));
        }
        Ok(size)
    }

    /// Cuts a flat image into the six faces.
    pub fn split(self, image: &Rgba32FImage) -> Result<[Rgba32FImage; 6]> {
        let size = self.face_size(image.width(), image.height())?;
        let cells = self.cells();
        Ok(std::array::from_fn(|face| {
            let (column, row) = cells[face];
            let cut = imageops::crop_imm(image, column * size, row * size, size, size).to_image();
            if face == NEGATIVE_Z && self.rotates_negative_z() {
                imageops::rotate180(&cut)
            } else {
                cut
            }
        }))
    }

    /// Lays six square faces out on one image; unused cells stay zero.
    pub fn assemble(self, faces: &[Rgba32FImage; 6]) -> Result<Rgba32FImage> {
        let size = faces[0].width();
        if let Some((index, face)) = faces
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != (size, size))
        {
            return Err(DdsError::invalid(
                "faces",
                format!(
                    "face {} is {}x{}, expected {}x{}",
                    index,
                    face.width(),
                    face.height(),
                    size,
                    size
                ),
            ));
        }

        let (columns, rows) = self.grid();
        let mut canvas = Rgba32FImage::new(columns * size, rows * size);
        for (face, (column, row)) in self.cells().into_iter().enumerate() {
            let (x, y) = ((column * size) as i64, (row * size) as i64);
            if face == NEGATIVE_Z && self.rotates_negative_z() {
                imageops::replace(&mut canvas, &imageops::rotate180(&faces[face]), x, y);
            } else {
                imageops::replace(&mut canvas, &faces[face], x, y);
            }
        }
        Ok(canvas)
    }

    /// A single-mip cubemap host texture from a flat image.
    pub fn to_host(self, image: &Rgba32FImage) -> Result<HostTexture> {
        let faces = self.split(image)?;
        let size = faces[0].width();
        let mut texture = HostTexture::new(TextureMetadata {
            format: String::new(),
            srgb: false,
            texture_type: TextureType::Cube,
            dimension: Dimension::Texture2D,
            width: size,
            height: size,
            depth: 1,
            mip_count: 1,
            array_size: 1,
            is_cubemap: true,
            alpha_mode: AlphaMode::Unknown,
        });
        for (face_index, image) in faces.into_iter().enumerate() {
            let key = SubresourceKey {
                face_index: face_index as u32,
                ..SubresourceKey::default()
            };
            texture.push(key, image);
        }
        Ok(texture)
    }

    /// Flattens one mip level of one cube of a host cubemap.
    pub fn from_host(self, texture: &HostTexture, array_index: u32, mip_level: u32) -> Result<Rgba32FImage> {
        if !texture.metadata.is_cubemap {
            return Err(DdsError::dimensions("not a cubemap"));
        }
        let mut faces = Vec::with_capacity(6);
        for face_index in 0..6 {
            let key = SubresourceKey {
                array_index,
                face_index,
                mip_level,
                depth_slice: 0,
            };
            let image = texture
                .image(key)
                .ok_or_else(|| DdsError::invalid("surfaces", format!("no host image for {}", key)))?;
            faces.push(image.clone());
        }
        let faces: [Rgba32FImage; 6] = faces
            .try_into()
            .map_err(|_| DdsError::invalid("faces", "expected six faces"))?;
        self.assemble(&faces)
    }
}

impl fmt::Display for CubemapLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CubemapLayout {
    type Err = DdsError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.name() == wanted)
            .ok_or_else(|| {
                DdsError::invalid(
                    "cubemap_layout",
                    format!(
                        "unknown layout '{}' (expected one of h-cross, v-cross, h-cross-fnz, v-cross-fnz, h-strip, v-strip)",
                        s
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Each face is a solid colour whose red channel encodes its index,
    /// with one marked corner to detect rotation.
    fn faces(size: u32) -> [Rgba32FImage; 6] {
        std::array::from_fn(|face| {
            let mut image = Rgba32FImage::from_pixel(size, size, Rgba([face as f32 / 10.0, 0.0, 0.0, 1.0]));
            image.put_pixel(0, 0, Rgba([face as f32 / 10.0, 1.0, 0.0, 1.0]));
            image
        })
    }

    #[test]
    fn test_round_trip_all_layouts() {
        let source = faces(4);
        for layout in CubemapLayout::ALL {
            let flat = layout.assemble(&source).unwrap();
            let (columns, rows) = layout.grid();
            assert_eq!(flat.dimensions(), (columns * 4, rows * 4), "{}", layout);
            assert_eq!(layout.split(&flat).unwrap(), source, "{}", layout);
        }
    }

    #[test]
    fn test_v_cross_rotates_negative_z() {
        let flat = CubemapLayout::VCross.assemble(&faces(4)).unwrap();
        // -Z occupies cell (1, 3); its marked corner lands bottom-right.
        assert_eq!(flat.get_pixel(4 + 3, 12 + 3).0[1], 1.0);
        assert_eq!(flat.get_pixel(4, 12).0[1], 0.0);

        let flat = CubemapLayout::HCross.assemble(&faces(4)).unwrap();
        assert_eq!(flat.get_pixel(12, 4).0[1], 1.0);
    }

    #[test]
    fn test_h_cross_cells() {
        let flat = CubemapLayout::HCross.assemble(&faces(2)).unwrap();
        // +Y sits above +Z; the top-left cell is empty.
        assert!((flat.get_pixel(3, 1).0[0] - 0.2).abs() < 1e-6);
        assert_eq!(flat.get_pixel(1, 1).0, [0.0; 4]);
    }

    #[test]
    fn test_wrong_aspect_ratio() {
        let image = Rgba32FImage::new(16, 16);
        let err = CubemapLayout::HCross.split(&image).unwrap_err();
        assert!(matches!(err, DdsError::InvalidDescriptor { field: "cubemap_layout", .. }));
    }

    #[test]
    fn test_parse_names() {
        for layout in CubemapLayout::ALL {
            assert_eq!(layout.name().parse::<CubemapLayout>().unwrap(), layout);
        }
        assert_eq!(" V-Strip ".parse::<CubemapLayout>().unwrap(), CubemapLayout::VStrip);
        assert!("diagonal".parse::<CubemapLayout>().is_err());
    }

    #[test]
    fn test_host_round_trip() {
        let flat = CubemapLayout::HStrip.assemble(&faces(4)).unwrap();
        let texture = CubemapLayout::HStrip.to_host(&flat).unwrap();
        assert_eq!(texture.metadata.texture_type, TextureType::Cube);
        assert_eq!(texture.surfaces.len(), 6);
        assert_eq!(CubemapLayout::HStrip.from_host(&texture, 0, 0).unwrap(), flat);
    }
}
