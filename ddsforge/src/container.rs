//! Whole-container restructuring without touching pixel data.
//!
//! Subresources are moved as opaque byte ranges, so these work for every
//! format including block-compressed ones, with no codec involved.

use tracing::debug;

use crate::descriptor::{TextureDescriptor, TextureKind};
use crate::error::{DdsError, Result};
use crate::header::{self, DecodedHeader, EncodeOptions};
use crate::layout::{plan, surface_size};

/// How [`assemble`] combines its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleMode {
    /// Concatenate array elements; parts may be arrays or cubemaps themselves.
    Array,
    /// Stack mip-less 2D parts as depth slices of a volume.
    Volume,
    /// Six square 2D parts become the faces +X, -X, +Y, -Y, +Z, -Z.
    Cubemap,
}

struct Part<'a> {
    header: DecodedHeader,
    blob: &'a [u8],
}

fn open(bytes: &[u8]) -> Result<Part<'_>> {
    let header = header::decode(bytes)?;
    let size = plan(&header.descriptor).total_size();
    let end = header
        .data_offset
        .checked_add(size)
        .filter(|&end| end <= bytes.len());
    let Some(end) = end else {
        return Err(DdsError::malformed(
            "pixel_data",
            header.data_offset,
            format!("{} needs {} bytes of pixel data", header.descriptor, size),
        ));
    };
    let blob = &bytes[header.data_offset..end];
    Ok(Part { header, blob })
}

fn write(descriptor: &TextureDescriptor, extended: bool, blob: &[&[u8]]) -> Result<Vec<u8>> {
    let options = EncodeOptions::default().with_force_extended(extended);
    let mut out = header::encode(descriptor, options)?;
    for chunk in blob {
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

/// Splits an array into one container per element, or a mip-less volume
/// into one 2D container per depth slice.
///
/// Array elements keep their faces and mip chains.
///
/// # Errors
///
/// `UnsupportedDimensionCombination` when the texture has a single element
/// or is a volume with mips.
pub fn split(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let part = open(bytes)?;
    let descriptor = part.header.descriptor;
    let extended = part.header.raw.dx10.is_some();

    if descriptor.array_size > 1 {
        let element = descriptor.with_array_size(1);
        let element_size = plan(&element).total_size();
        debug!(elements = descriptor.array_size, element_size, "splitting array");
        return part
            .blob
            .chunks_exact(element_size)
            .map(|chunk| write(&element, extended, &[chunk]))
            .collect();
    }

    if descriptor.kind() == TextureKind::Texture3D {
        if descriptor.mip_count > 1 {
            return Err(DdsError::dimensions(format!(
                "cannot split a volume with {} mips into slices",
                descriptor.mip_count
            )));
        }
        let slice = TextureDescriptor::new_2d(descriptor.width, descriptor.height, descriptor.format)
            .with_alpha_mode(descriptor.alpha_mode);
        let slice_size = surface_size(&descriptor.format, descriptor.width, descriptor.height);
        debug!(slices = descriptor.depth, slice_size, "splitting volume");
        return part
            .blob
            .chunks_exact(slice_size)
            .map(|chunk| write(&slice, extended, &[chunk]))
            .collect();
    }

    Err(DdsError::dimensions(format!(
        "{} has a single element; nothing to split",
        descriptor
    )))
}

/// Combines containers into one array, volume or cubemap.
///
/// Every part must share format, extent, mip count and alpha mode; see [`AssembleMode`]
/// for the shapes each mode accepts.
pub fn assemble(parts: &[&[u8]], mode: AssembleMode) -> Result<Vec<u8>> {
    let opened = parts.iter().map(|bytes| open(bytes)).collect::<Result<Vec<_>>>()?;
    let Some(first) = opened.first() else {
        return Err(DdsError::invalid("parts", "nothing to assemble"));
    };
    let base = first.header.descriptor;

    for (index, part) in opened.iter().enumerate().skip(1) {
        let d = &part.header.descriptor;
        let same = d.format == base.format
            && (d.width, d.height, d.depth) == (base.width, base.height, base.depth)
            && d.mip_count == base.mip_count
            && d.kind() == base.kind()
            && d.alpha_mode == base.alpha_mode;
        if !same {
            return Err(DdsError::invalid(
                "parts",
                format!("part {} is {}, expected the shape of part 0 ({})", index, d, base),
            ));
        }
    }

    let extended = opened.iter().any(|p| p.header.raw.dx10.is_some());
    let count = opened.len() as u32;
    let flat_2d = |what: &str| -> Result<()> {
        if base.kind() != TextureKind::Texture2D || base.array_size != 1 {
            return Err(DdsError::dimensions(format!(
                "{} needs single 2D parts, got {}",
                what, base
            )));
        }
        Ok(())
    };

    let descriptor = match mode {
        AssembleMode::Array => {
            let array_size = opened.iter().map(|p| p.header.descriptor.array_size).sum();
            base.with_array_size(array_size)
        }
        AssembleMode::Volume => {
            flat_2d("a volume")?;
            if base.mip_count != 1 {
                return Err(DdsError::dimensions("volume slices must not have mips"));
            }
            TextureDescriptor::new_volume(base.width, base.height, count, base.format)
                .with_alpha_mode(base.alpha_mode)
        }
        AssembleMode::Cubemap => {
            flat_2d("a cubemap")?;
            if count != 6 {
                return Err(DdsError::invalid(
                    "parts",
                    format!("a cubemap needs 6 faces, got {}", count),
                ));
            }
            TextureDescriptor {
                is_cubemap: true,
                ..base
            }
        }
    };

    debug!(parts = count, ?mode, texture = %descriptor, "assembling");
    let blobs: Vec<&[u8]> = opened.iter().map(|p| p.blob).collect();
    write(&descriptor, extended, &blobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AlphaMode;
    use crate::error::ErrorKind;
    use crate::format::{FormatId, FormatRegistry, PixelFormatInfo};

    fn format(id: FormatId) -> PixelFormatInfo {
        *FormatRegistry::global().lookup(id).unwrap()
    }

    /// A container whose blob bytes are a running counter.
    fn container(descriptor: &TextureDescriptor, seed: u8) -> Vec<u8> {
        let mut bytes = header::encode(descriptor, EncodeOptions::default()).unwrap();
        let size = plan(descriptor).total_size();
        bytes.extend((0..size).map(|i| (i as u8).wrapping_add(seed)));
        bytes
    }

    #[test]
    fn test_array_split_assemble_round_trip() {
        let d = TextureDescriptor::new_2d(16, 8, format(FormatId::Bc3Unorm))
            .with_mip_count(3)
            .with_array_size(3);
        let original = container(&d, 0);

        let parts = split(&original).unwrap();
        assert_eq!(parts.len(), 3);
        let element = header::decode(&parts[1]).unwrap().descriptor;
        assert_eq!(element.array_size, 1);
        assert_eq!(element.mip_count, 3);

        let refs: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        let rebuilt = assemble(&refs, AssembleMode::Array).unwrap();
        // Original used the extended header because it was an array.
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_cube_array_elements_keep_faces() {
        let d = TextureDescriptor::new_cubemap(8, format(FormatId::R8G8B8A8Unorm)).with_array_size(2);
        let parts = split(&container(&d, 0)).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(header::decode(&parts[0]).unwrap().descriptor.is_cubemap);
    }

    #[test]
    fn test_volume_split_into_slices() {
        let d = TextureDescriptor::new_volume(4, 4, 3, format(FormatId::R8G8B8A8Unorm));
        let original = container(&d, 0);
        let parts = split(&original).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2][128..], original[128 + 128..]);

        let refs: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        let rebuilt = assemble(&refs, AssembleMode::Volume).unwrap();
        assert_eq!(header::decode(&rebuilt).unwrap().descriptor, d);
        assert_eq!(rebuilt[128..], original[128..]);
    }

    #[test]
    fn test_volume_with_mips_cannot_split() {
        let d = TextureDescriptor::new_volume(4, 4, 4, format(FormatId::R8G8B8A8Unorm)).with_mip_count(2);
        let err = split(&container(&d, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDimensionCombination);
    }

    #[test]
    fn test_single_texture_cannot_split() {
        let d = TextureDescriptor::new_2d(4, 4, format(FormatId::Bc1Unorm));
        assert!(split(&container(&d, 0)).is_err());
    }

    #[test]
    fn test_assemble_cubemap_from_faces() {
        let d = TextureDescriptor::new_2d(8, 8, format(FormatId::Bc1Unorm)).with_mip_count(2);
        let faces: Vec<Vec<u8>> = (0..6).map(|i| container(&d, i * 40)).collect();
        let refs: Vec<&[u8]> = faces.iter().map(Vec::as_slice).collect();

        let cube = assemble(&refs, AssembleMode::Cubemap).unwrap();
        let decoded = header::decode(&cube).unwrap();
        assert!(decoded.descriptor.is_cubemap);
        let face_size = plan(&d).total_size();
        assert_eq!(cube[128 + 3 * face_size..128 + 4 * face_size], faces[3][128..]);

        assert!(assemble(&refs[..5], AssembleMode::Cubemap).is_err());
    }

    #[test]
    fn test_assemble_rejects_mismatched_parts() {
        let a = container(&TextureDescriptor::new_2d(8, 8, format(FormatId::Bc1Unorm)), 0);
        let b = container(&TextureDescriptor::new_2d(8, 8, format(FormatId::Bc3Unorm)), 0);
        let err = assemble(&[&a, &b], AssembleMode::Array).unwrap_err();
        assert!(matches!(err, DdsError::InvalidDescriptor { field: "parts", .. }));
        assert!(assemble(&[], AssembleMode::Array).is_err());
    }

    #[test]
    fn test_assemble_rejects_mixed_alpha_modes() {
        let straight = TextureDescriptor::new_2d(8, 8, format(FormatId::R8G8B8A8Unorm))
            .with_alpha_mode(AlphaMode::Straight);
        let premultiplied = straight.with_alpha_mode(AlphaMode::Premultiplied);
        let a = container(&straight, 0);
        let b = container(&premultiplied, 0);

        for mode in [AssembleMode::Array, AssembleMode::Volume] {
            let err = assemble(&[&a, &b], mode).unwrap_err();
            assert!(matches!(err, DdsError::InvalidDescriptor { field: "parts", .. }));
        }

        let merged = assemble(&[&b, &b], AssembleMode::Array).unwrap();
        let decoded = header::decode(&merged).unwrap().descriptor;
        assert_eq!(decoded.alpha_mode, AlphaMode::Premultiplied);
        assert_eq!(decoded.array_size, 2);
    }
}
