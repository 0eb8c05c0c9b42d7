//! Settings structs for each configuration section.

use std::path::PathBuf;

use crate::convert::{ExportOptions, ImportOptions};
use crate::cubemap::CubemapLayout;
use crate::error::Result;
use crate::format::{FormatId, FormatRegistry, PixelFormatInfo};

/// Format used by `export` when none is given.
pub const DEFAULT_EXPORT_FORMAT: FormatId = FormatId::Bc1Unorm;

pub const DEFAULT_LOG_FILE: &str = "ddsforge.log";

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub export: ExportSettings,
    pub import: ImportSettings,
    pub logging: LoggingSettings,
}

/// `[export]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub format: FormatId,
    pub force_extended: bool,
    pub no_mip: bool,
    /// Levels to generate for images without a chain; `None` means the
    /// full chain.
    pub mip_count: Option<u32>,
    /// Layout of flattened cubemap images given to export.
    pub cubemap_layout: CubemapLayout,
}

impl ExportSettings {
    /// The registry entry for [`format`](Self::format).
    pub fn format_info(&self) -> Result<&'static PixelFormatInfo> {
        FormatRegistry::global().lookup(self.format)
    }

    pub fn options(&self) -> ExportOptions {
        ExportOptions::default()
            .with_no_mip(self.no_mip)
            .with_force_extended(self.force_extended)
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: DEFAULT_EXPORT_FORMAT,
            force_extended: false,
            no_mip: false,
            mip_count: None,
            cubemap_layout: CubemapLayout::default(),
        }
    }
}

/// `[import]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSettings {
    pub invert_normals: bool,
    pub unpremultiply_alpha: bool,
    /// Layout used when flattening cubemaps into one image.
    pub cubemap_layout: CubemapLayout,
}

impl ImportSettings {
    pub fn options(&self) -> ImportOptions {
        ImportOptions::default()
            .with_invert_normals(self.invert_normals)
            .with_unpremultiply_alpha(self.unpremultiply_alpha)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
