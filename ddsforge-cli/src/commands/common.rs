//! Common types and utilities shared across CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use ddsforge::config::ConfigFile;
use ddsforge::container::AssembleMode;
use ddsforge::{FormatRegistry, PixelFormatInfo};
use image::{DynamicImage, Rgba32FImage};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;

/// How `assemble` combines its inputs.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum AssembleKind {
    /// Texture array, one element per input
    Array,
    /// Volume texture, one depth slice per input
    Volume,
    /// Cubemap from six faces in +X, -X, +Y, -Y, +Z, -Z order
    Cubemap,
}

impl From<AssembleKind> for AssembleMode {
    fn from(kind: AssembleKind) -> Self {
        match kind {
            AssembleKind::Array => AssembleMode::Array,
            AssembleKind::Volume => AssembleMode::Volume,
            AssembleKind::Cubemap => AssembleMode::Cubemap,
        }
    }
}

/// Resolve the export format from CLI args, then sidecar metadata, then config.
pub fn resolve_format(
    cli_format: Option<&str>,
    metadata_format: Option<&str>,
    config: &ConfigFile,
) -> Result<&'static PixelFormatInfo, CliError> {
    let registry = FormatRegistry::global();
    let lookup = |name: &str| {
        registry
            .lookup_name(name)
            .map_err(|e| CliError::Config(format!("{} (see 'ddsforge formats')", e)))
    };

    match (cli_format, metadata_format.filter(|f| !f.is_empty())) {
        (Some(name), _) | (None, Some(name)) => lookup(name),
        (None, None) => config
            .export
            .format_info()
            .map_err(|e| CliError::Config(e.to_string())),
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| CliError::io(path, e))
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| CliError::io(path, e))
}

/// Open any image format the `image` crate reads, as linear RGBA floats.
pub fn load_image(path: &Path) -> Result<Rgba32FImage, CliError> {
    image::open(path)
        .map(DynamicImage::into_rgba32f)
        .map_err(|e| CliError::image(path, e))
}

/// Save as EXR (full float) or any 8-bit format chosen by extension.
pub fn save_image(path: &Path, image: &Rgba32FImage) -> Result<(), CliError> {
    let dynamic = DynamicImage::ImageRgba32F(image.clone());
    let result = if is_float_target(path) {
        dynamic.save(path)
    } else {
        DynamicImage::ImageRgba8(dynamic.to_rgba8()).save(path)
    };
    result.map_err(|e| CliError::image(path, e))
}

fn is_float_target(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("exr"))
}

/// `dir/stem<suffix>.ext`, next to `input` unless `dir` is given.
pub fn sibling_path(input: &Path, dir: Option<&Path>, suffix: &str, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "texture".to_string());
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}.{}", stem, suffix, ext))
}

/// Progress bar for multi-file commands; hidden for a single file.
pub fn progress_bar(len: usize, verb: &str) -> ProgressBar {
    if len < 2 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {prefix} [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.set_prefix(verb.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
