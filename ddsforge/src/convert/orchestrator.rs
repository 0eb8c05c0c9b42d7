//! Import, export and probe.

use std::borrow::Cow;

use image::Rgba32FImage;
use tracing::{debug, info, warn};

use super::state::{Conversion, ConversionState};
use crate::codec::CodecHandle;
use crate::descriptor::{AlphaMode, TextureDescriptor};
use crate::error::{DdsError, Result};
use crate::format::{CodecBackend, PixelFormatInfo};
use crate::header::{self, EncodeOptions};
use crate::host::{HostTexture, TextureMetadata};
use crate::layout::{plan, Subresource};
use crate::remap;

/// Options applied while importing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Invert the green channel of every surface.
    pub invert_normals: bool,
    /// Divide colour by alpha, only for premultiplied textures. The
    /// metadata keeps its original alpha mode.
    pub unpremultiply_alpha: bool,
}

impl ImportOptions {
    pub fn with_invert_normals(mut self, invert_normals: bool) -> Self {
        self.invert_normals = invert_normals;
        self
    }

    pub fn with_unpremultiply_alpha(mut self, unpremultiply_alpha: bool) -> Self {
        self.unpremultiply_alpha = unpremultiply_alpha;
        self
    }
}

/// Options applied while exporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub invert_normals: bool,
    /// Write only the base level even when the host has a mip chain.
    pub no_mip: bool,
    pub force_extended: bool,
}

impl ExportOptions {
    pub fn with_invert_normals(mut self, invert_normals: bool) -> Self {
        self.invert_normals = invert_normals;
        self
    }

    pub fn with_no_mip(mut self, no_mip: bool) -> Self {
        self.no_mip = no_mip;
        self
    }

    pub fn with_force_extended(mut self, force_extended: bool) -> Self {
        self.force_extended = force_extended;
        self
    }
}

/// Entry point for converting containers to host textures and back.
///
/// The converter owns no state besides its codec handle, so one instance
/// can serve any number of threads.
///
/// # Example
///
/// ```
/// use ddsforge::convert::{ExportOptions, ImportOptions, TextureConverter};
/// use ddsforge::codec::CodecHandle;
/// use ddsforge::format::{FormatId, FormatRegistry};
/// use ddsforge::host::HostTexture;
/// use image::{Rgba, Rgba32FImage};
///
/// let converter = TextureConverter::new(CodecHandle::native());
/// let rgba = FormatRegistry::global().lookup(FormatId::R8G8B8A8Unorm).unwrap();
///
/// let host = HostTexture::from_image(Rgba32FImage::from_pixel(4, 4, Rgba([1.0, 0.0, 0.0, 1.0])));
/// let bytes = converter.export(&host, rgba, &ExportOptions::default()).unwrap();
///
/// let back = converter.import(&bytes, &ImportOptions::default()).unwrap();
/// assert_eq!(back.metadata.format, "R8G8B8A8_UNORM");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextureConverter {
    codec: CodecHandle,
}

impl TextureConverter {
    pub fn new(codec: CodecHandle) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &CodecHandle {
        &self.codec
    }

    /// Decodes only the header; pixel data is neither required nor read.
    pub fn probe(&self, bytes: &[u8]) -> Result<TextureDescriptor> {
        self.run_probe(bytes, &mut Conversion::new("probe"))
    }

    /// Decodes a whole container into host images.
    ///
    /// # Errors
    ///
    /// Any header error, `MalformedContainer` for a short pixel blob, and
    /// `CodecFailure` naming the first subresource the codec rejected. No
    /// partial texture is returned.
    pub fn import(&self, bytes: &[u8], options: &ImportOptions) -> Result<HostTexture> {
        self.run_import(bytes, options, &mut Conversion::new("import"))
    }

    /// Encodes a host texture as a container in `target` format.
    ///
    /// The shape comes from `texture.metadata`; every planned subresource
    /// must have a host surface of matching extent.
    pub fn export(
        &self,
        texture: &HostTexture,
        target: &PixelFormatInfo,
        options: &ExportOptions,
    ) -> Result<Vec<u8>> {
        self.run_export(texture, target, options, &mut Conversion::new("export"))
    }

    pub(crate) fn run_probe(&self, bytes: &[u8], conversion: &mut Conversion) -> Result<TextureDescriptor> {
        let decoded = conversion.step(ConversionState::HeaderParsed, || header::decode(bytes))?;
        Ok(decoded.descriptor)
    }

    pub(crate) fn run_import(
        &self,
        bytes: &[u8],
        options: &ImportOptions,
        conversion: &mut Conversion,
    ) -> Result<HostTexture> {
        let decoded = conversion.step(ConversionState::HeaderParsed, || header::decode(bytes))?;
        let descriptor = decoded.descriptor;
        let data_offset = decoded.data_offset;

        let layout = conversion.step(ConversionState::LayoutPlanned, || {
            let layout = plan(&descriptor);
            let available = bytes.len().saturating_sub(data_offset);
            let needed = layout.total_size();
            if available < needed {
                return Err(DdsError::malformed(
                    "pixel_data",
                    data_offset,
                    format!(
                        "{} needs {} bytes of pixel data, only {} present",
                        descriptor, needed, available
                    ),
                ));
            }
            if available > needed {
                warn!(
                    trailing = available - needed,
                    "ignoring bytes after the last subresource"
                );
            }
            Ok(layout)
        })?;

        let blob = &bytes[data_offset..];
        let unpremultiply =
            options.unpremultiply_alpha && descriptor.alpha_mode == AlphaMode::Premultiplied;
        let texture = conversion.step(ConversionState::PixelsMaterialized, || {
            let mut texture = HostTexture::new(TextureMetadata::from_descriptor(&descriptor));
            texture.surfaces.reserve(layout.len());
            for subresource in &layout {
                let data = &blob[subresource.byte_range()];
                let mut image = self.decode_surface(data, &subresource, &descriptor.format)?;
                if options.invert_normals {
                    remap::flip_green(&mut image);
                }
                if unpremultiply {
                    remap::unpremultiply(&mut image);
                }
                debug!(subresource = %subresource.key, bytes = data.len(), "materialized");
                texture.push(subresource.key, image);
            }
            Ok(texture)
        })?;

        conversion.advance(ConversionState::Done);
        info!(
            texture = %descriptor,
            subresources = texture.surfaces.len(),
            "imported texture"
        );
        Ok(texture)
    }

    pub(crate) fn run_export(
        &self,
        texture: &HostTexture,
        target: &PixelFormatInfo,
        options: &ExportOptions,
        conversion: &mut Conversion,
    ) -> Result<Vec<u8>> {
        let (descriptor, header) = conversion.step(ConversionState::HeaderParsed, || {
            let mut descriptor = texture.metadata.descriptor(*target);
            if options.no_mip {
                descriptor.mip_count = 1;
            }
            let encode_options = EncodeOptions::default().with_force_extended(options.force_extended);
            let header = header::encode(&descriptor, encode_options)?;
            Ok((descriptor, header))
        })?;

        let layout = conversion.step(ConversionState::LayoutPlanned, || Ok(plan(&descriptor)))?;

        let bytes = conversion.step(ConversionState::PixelsMaterialized, || {
            let mut out = Vec::with_capacity(header.len() + layout.total_size());
            out.extend_from_slice(&header);
            let surfaces = texture.surface_index();
            for subresource in &layout {
                let surface = surfaces.get(&subresource.key).ok_or_else(|| {
                    DdsError::invalid(
                        "surfaces",
                        format!("no host image for {}", subresource.key),
                    )
                })?;
                let expected = (subresource.slice_width, subresource.slice_height);
                if surface.image.dimensions() != expected {
                    return Err(DdsError::invalid(
                        "surfaces",
                        format!(
                            "{} is {}x{}, expected {}x{}",
                            subresource.key,
                            surface.image.width(),
                            surface.image.height(),
                            expected.0,
                            expected.1
                        ),
                    ));
                }

                let image = if options.invert_normals {
                    let mut flipped = surface.image.clone();
                    remap::flip_green(&mut flipped);
                    Cow::Owned(flipped)
                } else {
                    Cow::Borrowed(&surface.image)
                };
                let data = self.encode_surface(&image, &subresource, target)?;
                debug!(subresource = %subresource.key, bytes = data.len(), "packed");
                out.extend_from_slice(&data);
            }
            Ok(out)
        })?;

        conversion.advance(ConversionState::Done);
        info!(texture = %descriptor, bytes = bytes.len(), "exported texture");
        Ok(bytes)
    }

    fn decode_surface(
        &self,
        data: &[u8],
        subresource: &Subresource,
        format: &PixelFormatInfo,
    ) -> Result<Rgba32FImage> {
        let (width, height) = (subresource.slice_width, subresource.slice_height);
        if format.codec_backend == CodecBackend::Copy {
            return remap::to_host(data, width, height, format);
        }

        let image = self
            .codec
            .session()
            .decode(data, width, height, format)
            .map_err(|e| codec_failure(subresource, format, e.to_string()))?;
        if image.dimensions() != (width, height) {
            return Err(codec_failure(
                subresource,
                format,
                format!(
                    "decoded {}x{}, expected {}x{}",
                    image.width(),
                    image.height(),
                    width,
                    height
                ),
            ));
        }
        Ok(image)
    }

    fn encode_surface(
        &self,
        image: &Rgba32FImage,
        subresource: &Subresource,
        format: &PixelFormatInfo,
    ) -> Result<Vec<u8>> {
        if format.codec_backend == CodecBackend::Copy {
            return remap::from_host(image, format);
        }

        let data = self
            .codec
            .session()
            .encode(image, format)
            .map_err(|e| codec_failure(subresource, format, e.to_string()))?;
        if data.len() != subresource.byte_length {
            return Err(codec_failure(
                subresource,
                format,
                format!(
                    "encoded {} bytes, expected {}",
                    data.len(),
                    subresource.byte_length
                ),
            ));
        }
        Ok(data)
    }
}

fn codec_failure(subresource: &Subresource, format: &PixelFormatInfo, reason: String) -> DdsError {
    DdsError::CodecFailure {
        subresource: subresource.key,
        format: format.name,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BlockCodec, CodecError};
    use crate::error::ErrorKind;
    use crate::format::{FormatId, FormatRegistry};
    use crate::layout::SubresourceKey;
    use image::Rgba;

    fn format(id: FormatId) -> &'static PixelFormatInfo {
        FormatRegistry::global().lookup(id).unwrap()
    }

    fn converter() -> TextureConverter {
        TextureConverter::new(CodecHandle::native())
    }

    /// Fails on one chosen mip level and fills everything else with grey.
    struct FailOnMip(u32);

    impl BlockCodec for FailOnMip {
        fn name(&self) -> &str {
            "fail-on-mip"
        }

        fn decode(
            &self,
            _data: &[u8],
            width: u32,
            height: u32,
            _format: &PixelFormatInfo,
        ) -> std::result::Result<Rgba32FImage, CodecError> {
            Ok(Rgba32FImage::from_pixel(width, height, Rgba([0.5; 4])))
        }

        fn encode(
            &self,
            image: &Rgba32FImage,
            format: &PixelFormatInfo,
        ) -> std::result::Result<Vec<u8>, CodecError> {
            let level = (0..16)
                .find(|l| crate::descriptor::mip_extent(8, *l) == image.width())
                .unwrap_or(0);
            if level == self.0 {
                return Err(CodecError::Failed("synthetic failure".into()));
            }
            Ok(vec![0; crate::layout::surface_size(format, image.width(), image.height())])
        }
    }

    fn gradient(width: u32, height: u32) -> Rgba32FImage {
        Rgba32FImage::from_fn(width, height, |x, y| {
            Rgba([x as f32 / 255.0, y as f32 / 255.0, 0.5, 1.0])
        })
    }

    #[test]
    fn test_export_import_uncompressed() {
        let host = HostTexture::from_image(gradient(5, 3));
        let bytes = converter()
            .export(&host, format(FormatId::B8G8R8A8Unorm), &ExportOptions::default())
            .unwrap();
        assert_eq!(bytes.len(), 128 + 5 * 3 * 4);

        let back = converter().import(&bytes, &ImportOptions::default()).unwrap();
        assert_eq!(back.metadata.format, "B8G8R8A8_UNORM");
        assert_eq!(back.surfaces.len(), 1);
        let px = back.image(SubresourceKey::default()).unwrap().get_pixel(4, 2).0;
        assert!((px[0] - 4.0 / 255.0).abs() < 1e-6);
        assert!((px[1] - 2.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_probe_does_not_need_pixels() {
        let host = HostTexture::from_image(gradient(16, 16));
        let bytes = converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &ExportOptions::default())
            .unwrap();
        let descriptor = converter().probe(&bytes[..128]).unwrap();
        assert_eq!((descriptor.width, descriptor.height), (16, 16));
    }

    #[test]
    fn test_short_blob_is_malformed() {
        let host = HostTexture::from_image(gradient(4, 4));
        let bytes = converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &ExportOptions::default())
            .unwrap();
        let err = converter()
            .import(&bytes[..bytes.len() - 1], &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, DdsError::MalformedContainer { field: "pixel_data", .. }));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let host = HostTexture::from_image(gradient(4, 4));
        let mut bytes = converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &ExportOptions::default())
            .unwrap();
        bytes.extend_from_slice(&[0xaa; 7]);
        assert!(converter().import(&bytes, &ImportOptions::default()).is_ok());
    }

    #[test]
    fn test_export_accepts_surfaces_in_any_order() {
        let rgba = format(FormatId::R8G8B8A8Unorm);
        let desc = TextureDescriptor::new_2d(4, 4, *rgba).with_array_size(3).with_mip_count(3);
        let mut host = HostTexture::new(TextureMetadata::from_descriptor(&desc));
        for sub in &plan(&desc) {
            let shade = sub.key.array_index as f32 / 4.0 + sub.key.mip_level as f32 / 16.0;
            let pixel = Rgba([shade, 0.0, 0.0, 1.0]);
            host.push(sub.key, Rgba32FImage::from_pixel(sub.slice_width, sub.slice_height, pixel));
        }
        let ordered = converter().export(&host, rgba, &ExportOptions::default()).unwrap();

        host.surfaces.reverse();
        let reversed = converter().export(&host, rgba, &ExportOptions::default()).unwrap();
        assert_eq!(ordered, reversed);
    }

    #[test]
    fn test_missing_surface_is_invalid() {
        let mut host = HostTexture::from_image(gradient(8, 8));
        host.metadata.mip_count = 2;
        let err = converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, DdsError::InvalidDescriptor { field: "surfaces", .. }));

        // Dropping the chain makes the same texture exportable.
        let options = ExportOptions::default().with_no_mip(true);
        assert!(converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &options)
            .is_ok());
    }

    #[test]
    fn test_wrong_surface_extent_is_invalid() {
        let mut host = HostTexture::from_image(gradient(8, 8));
        host.metadata.width = 4;
        host.metadata.height = 4;
        let err = converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &ExportOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
    }

    #[test]
    fn test_codec_failure_names_subresource() {
        let mut host = HostTexture::from_image(gradient(8, 8));
        host.push(SubresourceKey::mip(1), gradient(4, 4));
        host.push(SubresourceKey::mip(2), gradient(2, 2));
        host.metadata.mip_count = 3;

        let converter = TextureConverter::new(CodecHandle::new(FailOnMip(2)));
        let err = converter
            .export(&host, format(FormatId::Bc1Unorm), &ExportOptions::default())
            .unwrap_err();
        match err {
            DdsError::CodecFailure { subresource, format, reason } => {
                assert_eq!(subresource, SubresourceKey::mip(2));
                assert_eq!(format, "BC1_UNORM");
                assert!(reason.contains("synthetic failure"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invert_normals_on_both_paths() {
        let host = HostTexture::from_image(Rgba32FImage::from_pixel(2, 2, Rgba([0.0, 1.0, 0.0, 1.0])));
        let options = ExportOptions::default().with_invert_normals(true);
        let bytes = converter()
            .export(&host, format(FormatId::R8G8B8A8Unorm), &options)
            .unwrap();
        assert_eq!(&bytes[128..132], &[0, 0, 0, 255]);

        let back = converter()
            .import(&bytes, &ImportOptions::default().with_invert_normals(true))
            .unwrap();
        assert_eq!(back.surfaces[0].image.get_pixel(1, 1).0, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unpremultiply_only_for_premultiplied_alpha() {
        let mut host = HostTexture::from_image(Rgba32FImage::from_pixel(1, 1, Rgba([0.4, 0.4, 0.4, 0.8])));
        host.metadata.alpha_mode = AlphaMode::Premultiplied;
        let target = format(FormatId::R32G32B32A32Float);
        let options = ImportOptions::default().with_unpremultiply_alpha(true);

        let bytes = converter().export(&host, target, &ExportOptions::default()).unwrap();
        let back = converter().import(&bytes, &options).unwrap();
        assert_eq!(back.metadata.alpha_mode, AlphaMode::Premultiplied);
        assert!((back.surfaces[0].image.get_pixel(0, 0).0[0] - 0.5).abs() < 1e-6);

        host.metadata.alpha_mode = AlphaMode::Straight;
        let bytes = converter().export(&host, target, &ExportOptions::default()).unwrap();
        let back = converter().import(&bytes, &options).unwrap();
        assert!((back.surfaces[0].image.get_pixel(0, 0).0[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_failed_import_reports_state() {
        let mut conversion = Conversion::new("import");
        let result = converter().run_import(b"nope", &ImportOptions::default(), &mut conversion);
        assert!(result.is_err());
        assert!(matches!(conversion.state(), ConversionState::Failed(_)));
    }
}
