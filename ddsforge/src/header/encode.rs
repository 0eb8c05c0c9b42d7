//! Header encoding.

use tracing::debug;

use super::types::*;
use crate::descriptor::{AlphaMode, TextureDescriptor, TextureKind};
use crate::error::{Result, UnsupportedFormat};
use crate::format::{FormatRegistry, LegacyPixelFormat};
use crate::layout::{row_pitch, surface_size};

/// Options controlling header emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Always write the extended header, even when a legacy one suffices.
    pub force_extended: bool,
}

impl EncodeOptions {
    pub fn with_force_extended(mut self, force_extended: bool) -> Self {
        self.force_extended = force_extended;
        self
    }
}

/// Whether `descriptor` must be written with the extended header.
///
/// True when the format has no legacy encoding, the texture is an array or
/// 1D, the alpha mode is not `Unknown`, or the caller asks for it.
pub fn requires_extended(descriptor: &TextureDescriptor, options: EncodeOptions) -> bool {
    options.force_extended
        || descriptor.array_size > 1
        || descriptor.alpha_mode != AlphaMode::Unknown
        || descriptor.kind() == TextureKind::Texture1D
        || FormatRegistry::global()
            .legacy_encoding(&descriptor.format)
            .is_none()
}

/// Builds the on-disk header for `descriptor`.
pub fn build_header(descriptor: &TextureDescriptor, options: EncodeOptions) -> Result<RawHeader> {
    descriptor.validate()?;

    let kind = descriptor.kind();
    let format = &descriptor.format;

    let (pixel_format, dx10) = if requires_extended(descriptor, options) {
        let dxgi_format = format
            .format_id
            .dxgi()
            .ok_or(UnsupportedFormat::NoExtendedEncoding(format.name))?;
        let resource_dimension = match kind {
            TextureKind::Texture1D => RESOURCE_DIMENSION_TEXTURE1D,
            TextureKind::Texture2D | TextureKind::Texture2DCubemap => RESOURCE_DIMENSION_TEXTURE2D,
            TextureKind::Texture3D => RESOURCE_DIMENSION_TEXTURE3D,
        };
        let dx10 = Dx10Header {
            dxgi_format,
            resource_dimension,
            misc_flag: if kind.is_cubemap() {
                RESOURCE_MISC_TEXTURECUBE
            } else {
                0
            },
            array_size: descriptor.array_size,
            misc_flags2: descriptor.alpha_mode.as_raw(),
        };
        (LegacyPixelFormat::from_fourcc(DX10_FOURCC), Some(dx10))
    } else {
        match FormatRegistry::global().legacy_encoding(format) {
            Some(pf) => (pf, None),
            None => return Err(UnsupportedFormat::NoExtendedEncoding(format.name).into()),
        }
    };

    let (pitch_flag, pitch_or_linear_size) = if format.is_block_compressed() {
        let top = surface_size(format, descriptor.width, descriptor.height);
        (DDSD_LINEARSIZE, u32::try_from(top).unwrap_or(u32::MAX))
    } else {
        (DDSD_PITCH, row_pitch(format, descriptor.width))
    };

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | pitch_flag;
    let mut caps = DDSCAPS_TEXTURE;
    let mut caps2 = 0;
    if descriptor.mip_count > 1 {
        flags |= DDSD_MIPMAPCOUNT;
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }
    match kind {
        TextureKind::Texture2DCubemap => {
            caps |= DDSCAPS_COMPLEX;
            caps2 |= DDSCAPS2_CUBEMAP | DDSCAPS2_CUBEMAP_ALLFACES;
        }
        TextureKind::Texture3D => {
            flags |= DDSD_DEPTH;
            caps |= DDSCAPS_COMPLEX;
            caps2 |= DDSCAPS2_VOLUME;
        }
        TextureKind::Texture1D | TextureKind::Texture2D => {}
    }
    if descriptor.array_size > 1 {
        caps |= DDSCAPS_COMPLEX;
    }

    Ok(RawHeader {
        size: HEADER_SIZE,
        flags,
        height: descriptor.height,
        width: descriptor.width,
        pitch_or_linear_size,
        depth: if kind == TextureKind::Texture3D {
            descriptor.depth
        } else {
            0
        },
        mip_map_count: descriptor.mip_count,
        reserved1: [0; 11],
        pixel_format_size: PIXEL_FORMAT_SIZE,
        pixel_format,
        caps,
        caps2,
        caps3: 0,
        caps4: 0,
        reserved2: 0,
        dx10,
    })
}

/// Encodes the container header for `descriptor`.
///
/// The compact legacy header is written whenever it can express the
/// texture; otherwise the extended header follows it.
///
/// # Example
///
/// ```
/// use ddsforge::descriptor::TextureDescriptor;
/// use ddsforge::format::{FormatId, FormatRegistry};
/// use ddsforge::header::{decode, encode, EncodeOptions};
///
/// let bc7 = *FormatRegistry::global().lookup(FormatId::Bc7Unorm).unwrap();
/// let desc = TextureDescriptor::new_2d(64, 64, bc7).with_mip_count(7);
///
/// let bytes = encode(&desc, EncodeOptions::default()).unwrap();
/// assert_eq!(bytes.len(), 148);
/// assert_eq!(decode(&bytes).unwrap().descriptor, desc);
/// ```
pub fn encode(descriptor: &TextureDescriptor, options: EncodeOptions) -> Result<Vec<u8>> {
    let header = build_header(descriptor, options)?;
    debug!(
        descriptor = %descriptor,
        extended = header.dx10.is_some(),
        "Encoded container header"
    );
    Ok(header.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DdsError, ErrorKind};
    use crate::format::{FormatId, PixelFormatInfo, DDPF_FOURCC, DDPF_RGB};
    use crate::header::decode;

    fn format(id: FormatId) -> PixelFormatInfo {
        *FormatRegistry::global().lookup(id).unwrap()
    }

    #[test]
    fn test_bc1_uses_legacy_dxt1() {
        let desc = TextureDescriptor::new_2d(256, 256, format(FormatId::Bc1Unorm));
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        assert!(header.dx10.is_none());
        assert_eq!(header.pixel_format.fourcc, *b"DXT1");
        assert_eq!(header.pixel_format.flags, DDPF_FOURCC);
        assert_eq!(encode(&desc, EncodeOptions::default()).unwrap().len(), 128);
    }

    #[test]
    fn test_compressed_formats_write_linear_size() {
        let desc = TextureDescriptor::new_2d(256, 256, format(FormatId::Bc1Unorm)).with_mip_count(3);
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        assert_eq!(header.flags & DDSD_LINEARSIZE, DDSD_LINEARSIZE);
        assert_eq!(header.flags & DDSD_PITCH, 0);
        assert_eq!(header.pitch_or_linear_size, 64 * 64 * 8);

        let bc7 = TextureDescriptor::new_2d(6, 6, format(FormatId::Bc7Unorm));
        let header = build_header(&bc7, EncodeOptions::default().with_force_extended(true)).unwrap();
        assert_eq!(header.flags & DDSD_LINEARSIZE, DDSD_LINEARSIZE);
        assert_eq!(header.pitch_or_linear_size, 2 * 2 * 16);
    }

    #[test]
    fn test_uncompressed_pitch_and_masks() {
        let desc = TextureDescriptor::new_2d(7, 3, format(FormatId::B8G8R8A8Unorm));
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        assert_eq!(header.pitch_or_linear_size, 28);
        assert_ne!(header.pixel_format.flags & DDPF_RGB, 0);
        assert_eq!(header.pixel_format.bit_count, 32);
        assert_eq!(header.pixel_format.r_mask, 0x00ff_0000);
        assert_eq!(header.flags & DDSD_PITCH, DDSD_PITCH);
        assert_eq!(header.flags & DDSD_LINEARSIZE, 0);
    }

    #[test]
    fn test_mip_flags() {
        let desc = TextureDescriptor::new_2d(64, 64, format(FormatId::Bc3Unorm)).with_mip_count(4);
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        assert_eq!(header.flags & DDSD_MIPMAPCOUNT, DDSD_MIPMAPCOUNT);
        assert_eq!(header.caps, DDSCAPS_TEXTURE | DDSCAPS_COMPLEX | DDSCAPS_MIPMAP);
        assert_eq!(header.mip_map_count, 4);

        let single = TextureDescriptor::new_2d(64, 64, format(FormatId::Bc3Unorm));
        let header = build_header(&single, EncodeOptions::default()).unwrap();
        assert_eq!(header.flags & DDSD_MIPMAPCOUNT, 0);
        assert_eq!(header.caps, DDSCAPS_TEXTURE);
    }

    #[test]
    fn test_cubemap_caps() {
        let desc = TextureDescriptor::new_cubemap(32, format(FormatId::Bc1Unorm));
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        assert!(header.dx10.is_none());
        assert_eq!(header.caps2, DDSCAPS2_CUBEMAP | DDSCAPS2_CUBEMAP_ALLFACES);
        assert_ne!(header.caps & DDSCAPS_COMPLEX, 0);
    }

    #[test]
    fn test_volume_caps_and_depth() {
        let desc = TextureDescriptor::new_volume(16, 16, 4, format(FormatId::R8G8B8A8Unorm));
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        assert_eq!(header.caps2, DDSCAPS2_VOLUME);
        assert_eq!(header.depth, 4);
        assert_ne!(header.flags & DDSD_DEPTH, 0);
    }

    #[test]
    fn test_extended_path_selection() {
        let rgba = format(FormatId::R8G8B8A8Unorm);
        let plain = TextureDescriptor::new_2d(8, 8, rgba);
        assert!(!requires_extended(&plain, EncodeOptions::default()));
        assert!(requires_extended(&plain, EncodeOptions::default().with_force_extended(true)));
        assert!(requires_extended(&plain.with_array_size(2), EncodeOptions::default()));
        assert!(requires_extended(
            &plain.with_alpha_mode(AlphaMode::Straight),
            EncodeOptions::default()
        ));
        assert!(requires_extended(&TextureDescriptor::new_1d(8, rgba), EncodeOptions::default()));
        assert!(requires_extended(
            &TextureDescriptor::new_2d(8, 8, format(FormatId::Bc7UnormSrgb)),
            EncodeOptions::default()
        ));
    }

    #[test]
    fn test_extended_header_fields() {
        let desc = TextureDescriptor::new_cubemap(16, format(FormatId::Bc7Unorm))
            .with_array_size(3)
            .with_alpha_mode(AlphaMode::Opaque);
        let header = build_header(&desc, EncodeOptions::default()).unwrap();
        let dx10 = header.dx10.unwrap();
        assert_eq!(header.pixel_format.fourcc, DX10_FOURCC);
        assert_eq!(dx10.dxgi_format, 98);
        assert_eq!(dx10.resource_dimension, RESOURCE_DIMENSION_TEXTURE2D);
        assert_eq!(dx10.misc_flag, RESOURCE_MISC_TEXTURECUBE);
        assert_eq!(dx10.array_size, 3);
        assert_eq!(dx10.misc_flags2, 3);
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let desc = TextureDescriptor::new_2d(4, 4, format(FormatId::Bc1Unorm)).with_mip_count(9);
        assert_eq!(
            encode(&desc, EncodeOptions::default()).unwrap_err().kind(),
            ErrorKind::InvalidDescriptor
        );
    }

    #[test]
    fn test_legacy_masked_cannot_use_extended() {
        let mut raw = build_header(
            &TextureDescriptor::new_2d(4, 4, format(FormatId::R8G8B8A8Unorm)),
            EncodeOptions::default(),
        )
        .unwrap();
        // 24-bit RGB only resolves through synthesis.
        raw.pixel_format.bit_count = 24;
        raw.pixel_format.r_mask = 0xff_0000;
        raw.pixel_format.g_mask = 0xff00;
        raw.pixel_format.b_mask = 0xff;
        raw.pixel_format.a_mask = 0;
        let desc = decode(&raw.to_bytes()).unwrap().descriptor;
        assert_eq!(desc.format.format_id, FormatId::LegacyMasked);

        let again = decode(&encode(&desc, EncodeOptions::default()).unwrap()).unwrap();
        assert_eq!(again.descriptor, desc);

        let err = encode(&desc.with_array_size(2), EncodeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DdsError::UnsupportedFormat(UnsupportedFormat::NoExtendedEncoding(_))
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_format() -> impl Strategy<Value = PixelFormatInfo> {
            let all: Vec<PixelFormatInfo> = FormatRegistry::global().iter().copied().collect();
            proptest::sample::select(all)
        }

        fn any_alpha() -> impl Strategy<Value = AlphaMode> {
            prop_oneof![
                Just(AlphaMode::Unknown),
                Just(AlphaMode::Straight),
                Just(AlphaMode::Premultiplied),
                Just(AlphaMode::Opaque),
                Just(AlphaMode::Custom),
            ]
        }

        proptest! {
            #[test]
            fn encode_decode_round_trip(
                format in any_format(),
                shape in 0u8..4,
                width in 1u32..512,
                height in 1u32..512,
                depth in 1u32..16,
                array in 1u32..5,
                mips in 1u32..12,
                alpha in any_alpha(),
                force in any::<bool>(),
            ) {
                let mut desc = match shape {
                    0 => TextureDescriptor::new_1d(width, format).with_array_size(array),
                    1 => TextureDescriptor::new_2d(width, height, format).with_array_size(array),
                    2 => TextureDescriptor::new_cubemap(width, format).with_array_size(array),
                    _ => TextureDescriptor::new_volume(width, height, depth, format),
                };
                desc.mip_count = mips.min(desc.full_mip_chain());
                desc.alpha_mode = alpha;
                prop_assume!(desc.validate().is_ok());

                let options = EncodeOptions::default().with_force_extended(force);
                let bytes = encode(&desc, options).unwrap();
                let decoded = decode(&bytes).unwrap();
                prop_assert_eq!(decoded.descriptor, desc);
                prop_assert_eq!(decoded.data_offset, bytes.len());
            }
        }
    }
}
