//! Host-side texture model.
//!
//! A [`HostTexture`] is what import hands to the host and what export takes
//! back: one linear RGBA image per subresource plus the container metadata
//! the host stores as custom properties.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use image::Rgba32FImage;
use serde::de::{value, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::{mip_extent, AlphaMode, Dimension, TextureDescriptor, TextureKind};
use crate::error::{DdsError, Result};
use crate::format::PixelFormatInfo;
use crate::layout::SubresourceKey;

/// Property key prefix used by [`TextureMetadata::to_properties`].
pub const PROPERTY_PREFIX: &str = "dds.";

/// Shape of a texture as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureType {
    #[serde(rename = "1d")]
    Texture1D,
    #[serde(rename = "1d_array")]
    Texture1DArray,
    #[serde(rename = "2d")]
    Texture2D,
    #[serde(rename = "2d_array")]
    Texture2DArray,
    #[serde(rename = "cube")]
    Cube,
    #[serde(rename = "cube_array")]
    CubeArray,
    #[serde(rename = "volume")]
    Volume,
}

impl TextureType {
    pub fn from_kind(kind: TextureKind, array_size: u32) -> Self {
        let array = array_size > 1;
        match (kind, array) {
            (TextureKind::Texture1D, false) => TextureType::Texture1D,
            (TextureKind::Texture1D, true) => TextureType::Texture1DArray,
            (TextureKind::Texture2D, false) => TextureType::Texture2D,
            (TextureKind::Texture2D, true) => TextureType::Texture2DArray,
            (TextureKind::Texture2DCubemap, false) => TextureType::Cube,
            (TextureKind::Texture2DCubemap, true) => TextureType::CubeArray,
            (TextureKind::Texture3D, _) => TextureType::Volume,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextureType::Texture1D => "1d",
            TextureType::Texture1DArray => "1d_array",
            TextureType::Texture2D => "2d",
            TextureType::Texture2DArray => "2d_array",
            TextureType::Cube => "cube",
            TextureType::CubeArray => "cube_array",
            TextureType::Volume => "volume",
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            TextureType::Texture1DArray | TextureType::Texture2DArray | TextureType::CubeArray
        )
    }
}

impl fmt::Display for TextureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureType {
    type Err = DdsError;

    fn from_str(s: &str) -> Result<Self> {
        parse_variant("texture_type", s)
    }
}

/// The serde name of a unit variant.
fn variant_name<T: Serialize>(field: &'static str, value: &T) -> Result<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => Ok(name),
        Ok(other) => Err(DdsError::invalid(field, format!("{} is not a name", other))),
        Err(e) => Err(DdsError::invalid(field, e.to_string())),
    }
}

/// Parses a unit variant from its serde name.
fn parse_variant<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T> {
    T::deserialize(raw.into_deserializer())
        .map_err(|e: value::Error| DdsError::invalid(field, e.to_string()))
}

/// Container metadata carried alongside host images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureMetadata {
    /// Canonical format name of the source container.
    pub format: String,
    pub srgb: bool,
    pub texture_type: TextureType,
    pub dimension: Dimension,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_count: u32,
    pub array_size: u32,
    pub is_cubemap: bool,
    #[serde(default)]
    pub alpha_mode: AlphaMode,
}

impl TextureMetadata {
    pub fn from_descriptor(descriptor: &TextureDescriptor) -> Self {
        Self {
            format: descriptor.format.name.to_string(),
            srgb: descriptor.format.is_srgb,
            texture_type: TextureType::from_kind(descriptor.kind(), descriptor.array_size),
            dimension: descriptor.dimension,
            width: descriptor.width,
            height: descriptor.height,
            depth: descriptor.depth,
            mip_count: descriptor.mip_count,
            array_size: descriptor.array_size,
            is_cubemap: descriptor.is_cubemap,
            alpha_mode: descriptor.alpha_mode,
        }
    }

    /// Rebuilds a descriptor for `format` from this metadata.
    ///
    /// The result is not validated.
    pub fn descriptor(&self, format: PixelFormatInfo) -> TextureDescriptor {
        TextureDescriptor {
            width: self.width,
            height: self.height,
            depth: self.depth,
            mip_count: self.mip_count,
            array_size: self.array_size,
            dimension: self.dimension,
            is_cubemap: self.is_cubemap,
            format,
            alpha_mode: self.alpha_mode,
        }
    }

    pub fn faces(&self) -> u32 {
        if self.is_cubemap {
            6
        } else {
            1
        }
    }

    /// Flattens the metadata into `dds.`-prefixed string properties.
    pub fn to_properties(&self) -> Result<BTreeMap<String, String>> {
        let entries = [
            ("format", self.format.clone()),
            ("srgb", self.srgb.to_string()),
            ("texture_type", self.texture_type.to_string()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("depth", self.depth.to_string()),
            ("mip_count", self.mip_count.to_string()),
            ("array_size", self.array_size.to_string()),
            ("cubemap", self.is_cubemap.to_string()),
            ("alpha_mode", variant_name("alpha_mode", &self.alpha_mode)?),
        ];
        Ok(entries
            .into_iter()
            .map(|(key, value)| (format!("{}{}", PROPERTY_PREFIX, key), value))
            .collect())
    }

    /// Parses metadata from host properties written by [`to_properties`].
    ///
    /// Unrelated properties are ignored. The dimension is derived from the
    /// texture type.
    ///
    /// [`to_properties`]: TextureMetadata::to_properties
    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &'static str| -> Result<&str> {
            properties
                .get(&format!("{}{}", PROPERTY_PREFIX, key))
                .map(String::as_str)
                .ok_or_else(|| DdsError::invalid(key, "missing host property"))
        };
        let number = |key: &'static str| -> Result<u32> {
            let raw = get(key)?;
            raw.parse()
                .map_err(|_| DdsError::invalid(key, format!("'{}' is not a number", raw)))
        };
        let flag = |key: &'static str| -> Result<bool> {
            let raw = get(key)?;
            raw.parse()
                .map_err(|_| DdsError::invalid(key, format!("'{}' is not true or false", raw)))
        };

        let texture_type: TextureType = get("texture_type")?.parse()?;
        let alpha_mode = match properties.get(&format!("{}alpha_mode", PROPERTY_PREFIX)) {
            Some(raw) => parse_variant("alpha_mode", raw)?,
            None => AlphaMode::Unknown,
        };
        let dimension = match texture_type {
            TextureType::Texture1D | TextureType::Texture1DArray => Dimension::Texture1D,
            TextureType::Volume => Dimension::Texture3D,
            _ => Dimension::Texture2D,
        };

        let metadata = Self {
            format: get("format")?.to_string(),
            srgb: flag("srgb")?,
            texture_type,
            dimension,
            width: number("width")?,
            height: number("height")?,
            depth: number("depth")?,
            mip_count: number("mip_count")?,
            array_size: number("array_size")?,
            is_cubemap: flag("cubemap")?,
            alpha_mode,
        };
        let kind = TextureKind::from_shape(metadata.dimension, metadata.is_cubemap);
        if TextureType::from_kind(kind, metadata.array_size) != texture_type {
            return Err(DdsError::invalid(
                "texture_type",
                format!(
                    "'{}' disagrees with cubemap = {} and array size {}",
                    texture_type, metadata.is_cubemap, metadata.array_size
                ),
            ));
        }
        Ok(metadata)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DdsError::invalid("metadata", e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DdsError::invalid("metadata", e.to_string()))
    }
}

/// One subresource image.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSurface {
    pub key: SubresourceKey,
    pub image: Rgba32FImage,
}

/// A fully materialized texture on the host side.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTexture {
    pub metadata: TextureMetadata,
    /// Surfaces in container order after import; any order for export.
    pub surfaces: Vec<HostSurface>,
}

impl HostTexture {
    pub fn new(metadata: TextureMetadata) -> Self {
        Self {
            metadata,
            surfaces: Vec::new(),
        }
    }

    /// A single-image 2D texture, the common case when exporting a picture.
    pub fn from_image(image: Rgba32FImage) -> Self {
        let metadata = TextureMetadata {
            format: String::new(),
            srgb: false,
            texture_type: TextureType::Texture2D,
            dimension: Dimension::Texture2D,
            width: image.width(),
            height: image.height(),
            depth: 1,
            mip_count: 1,
            array_size: 1,
            is_cubemap: false,
            alpha_mode: AlphaMode::Unknown,
        };
        let mut texture = Self::new(metadata);
        texture.push(SubresourceKey::default(), image);
        texture
    }

    pub fn push(&mut self, key: SubresourceKey, image: Rgba32FImage) {
        self.surfaces.push(HostSurface { key, image });
    }

    /// Scans for `key`. Use [`surface_index`](Self::surface_index) when
    /// looking up many surfaces.
    pub fn surface(&self, key: SubresourceKey) -> Option<&HostSurface> {
        self.surfaces.iter().find(|s| s.key == key)
    }

    /// Surfaces by key; the first of duplicate keys wins, as in [`surface`](Self::surface).
    pub fn surface_index(&self) -> HashMap<SubresourceKey, &HostSurface> {
        let mut index = HashMap::with_capacity(self.surfaces.len());
        for surface in &self.surfaces {
            index.entry(surface.key).or_insert(surface);
        }
        index
    }

    pub fn image(&self, key: SubresourceKey) -> Option<&Rgba32FImage> {
        self.surface(key).map(|s| &s.image)
    }

    /// Replaces the mip chain of every 2D surface with `levels` generated
    /// levels (base included).
    ///
    /// # Errors
    ///
    /// - `UnsupportedDimensionCombination` for volumes
    /// - `InvalidDescriptor` when a base image is missing, `levels` exceeds
    ///   the full chain, or the generator returns wrong extents
    pub fn generate_mips(&mut self, generator: &dyn MipGenerator, levels: u32) -> Result<()> {
        let m = &self.metadata;
        if m.dimension == Dimension::Texture3D {
            return Err(DdsError::dimensions("mip generation for volume textures"));
        }
        let chain = crate::descriptor::max_mip_count(m.width, m.height, 1);
        if levels == 0 || levels > chain {
            return Err(DdsError::invalid(
                "mip_count",
                format!("{} is outside 1..={} for {}x{}", levels, chain, m.width, m.height),
            ));
        }

        let index = self.surface_index();
        let mut surfaces = Vec::with_capacity(index.len() * levels as usize);
        for array_index in 0..m.array_size {
            for face_index in 0..m.faces() {
                let base_key = SubresourceKey {
                    array_index,
                    face_index,
                    ..SubresourceKey::default()
                };
                let base = index
                    .get(&base_key)
                    .ok_or_else(|| DdsError::invalid("surfaces", format!("missing {}", base_key)))?
                    .image
                    .clone();
                let generated = generator.generate(&base, levels);
                if generated.len() + 1 != levels as usize {
                    return Err(DdsError::invalid(
                        "mip_generator",
                        format!("produced {} levels, expected {}", generated.len(), levels - 1),
                    ));
                }
                surfaces.push(HostSurface { key: base_key, image: base });
                for (level, image) in (1..levels).zip(generated) {
                    let expected = (mip_extent(m.width, level), mip_extent(m.height, level));
                    if image.dimensions() != expected {
                        return Err(DdsError::invalid(
                            "mip_generator",
                            format!(
                                "level {} is {}x{}, expected {}x{}",
                                level,
                                image.width(),
                                image.height(),
                                expected.0,
                                expected.1
                            ),
                        ));
                    }
                    surfaces.push(HostSurface {
                        key: SubresourceKey {
                            mip_level: level,
                            ..base_key
                        },
                        image,
                    });
                }
            }
        }

        debug!(levels, surfaces = surfaces.len(), "generated mip chain");
        self.surfaces = surfaces;
        self.metadata.mip_count = levels;
        Ok(())
    }
}

/// Supplies downsampled mip levels; the library never resamples itself.
pub trait MipGenerator: Send + Sync {
    /// Returns levels `1..levels` of the chain starting at `base`.
    fn generate(&self, base: &Rgba32FImage, levels: u32) -> Vec<Rgba32FImage>;
}
