//! Export command - encode images as containers.

use std::path::{Path, PathBuf};

use ddsforge::config::ConfigFile;
use ddsforge::cubemap::CubemapLayout;
use ddsforge::descriptor::max_mip_count;
use ddsforge::{HostTexture, TextureMetadata};
use tracing::{debug, warn};

use super::common::{load_image, progress_bar, read_file, resolve_format, sibling_path, write_file};
use crate::error::CliError;
use crate::mipmap::BoxFilter;
use crate::runner::CliRunner;

/// Arguments for the export command.
pub struct ExportArgs {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub no_mip: bool,
    pub mip_count: Option<u32>,
    pub force_extended: bool,
    pub invert_normals: bool,
    pub cubemap: bool,
    pub cubemap_layout: Option<CubemapLayout>,
    pub metadata: Option<PathBuf>,
}

/// Run the export command.
pub fn run(runner: &CliRunner, args: ExportArgs) -> Result<(), CliError> {
    runner.log_startup("export");
    let config = runner.config();

    if args.output.is_some() && args.inputs.len() > 1 {
        return Err(CliError::Config(
            "--output takes a single input; omit it to write next to each image".to_string(),
        ));
    }

    let metadata = match &args.metadata {
        Some(path) => {
            let json = read_file(path)?;
            let text = String::from_utf8_lossy(&json);
            Some(TextureMetadata::from_json(&text).map_err(|e| CliError::dds(path, e))?)
        }
        None => None,
    };

    let target = resolve_format(
        args.format.as_deref(),
        metadata.as_ref().map(|m| m.format.as_str()),
        config,
    )?;
    let no_mip = args.no_mip || config.export.no_mip;
    let mip_count = args.mip_count.or(config.export.mip_count);
    let options = config
        .export
        .options()
        .with_no_mip(no_mip)
        .with_force_extended(args.force_extended || config.export.force_extended)
        .with_invert_normals(args.invert_normals);
    let cubemap = args.cubemap || metadata.as_ref().is_some_and(|m| m.is_cubemap);
    let layout = cubemap_layout(args.cubemap_layout, config);

    let bar = progress_bar(args.inputs.len(), "Exporting");
    let mut failed = 0;
    let mut textures = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        bar.set_message(path.display().to_string());
        match prepare(path, cubemap, layout, metadata.as_ref(), no_mip, mip_count) {
            Ok(texture) => textures.push((path, texture)),
            Err(e) => {
                bar.suspend(|| eprintln!("{}", e));
                failed += 1;
                bar.inc(1);
            }
        }
    }

    let pairs: Vec<_> = textures.iter().map(|(_, t)| (t, target)).collect();
    let items = runner.converter().export_batch(&pairs, &options);

    for item in items {
        let input = textures[item.index].0;
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| sibling_path(input, None, "", "dds"));
        let written = item
            .result
            .map_err(|e| CliError::dds(input, e))
            .and_then(|bytes| write_file(&output, &bytes));
        match written {
            Ok(()) => bar.suspend(|| println!("{} -> {} ({})", input.display(), output.display(), target.name)),
            Err(e) => {
                bar.suspend(|| eprintln!("{}", e));
                failed += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if failed > 0 {
        return Err(CliError::Batch {
            failed,
            total: args.inputs.len(),
        });
    }
    Ok(())
}

/// Layout of flattened cubemap inputs: the flag, else `[export] cubemap_layout`.
fn cubemap_layout(flag: Option<CubemapLayout>, config: &ConfigFile) -> CubemapLayout {
    flag.unwrap_or(config.export.cubemap_layout)
}

/// Load one image as a host texture with the requested mip chain.
fn prepare(
    path: &Path,
    cubemap: bool,
    layout: CubemapLayout,
    metadata: Option<&TextureMetadata>,
    no_mip: bool,
    mip_count: Option<u32>,
) -> Result<HostTexture, CliError> {
    let image = load_image(path)?;
    let mut texture = if cubemap {
        layout.to_host(&image).map_err(|e| CliError::dds(path, e))?
    } else {
        HostTexture::from_image(image)
    };
    if let Some(metadata) = metadata {
        texture.metadata.alpha_mode = metadata.alpha_mode;
        texture.metadata.format = metadata.format.clone();
        texture.metadata.srgb = metadata.srgb;
    }

    if no_mip {
        return Ok(texture);
    }
    let chain = max_mip_count(texture.metadata.width, texture.metadata.height, 1);
    let levels = match mip_count {
        Some(requested) if requested > chain => {
            warn!(requested, chain, path = %path.display(), "clamping mip count to full chain");
            chain
        }
        Some(requested) => requested.max(1),
        None => chain,
    };
    debug!(levels, path = %path.display(), "generating mips");
    texture
        .generate_mips(&BoxFilter, levels)
        .map_err(|e| CliError::dds(path, e))?;
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubemap_layout_reads_export_section() {
        let mut config = ConfigFile::default();
        config.export.cubemap_layout = CubemapLayout::VStrip;
        config.import.cubemap_layout = CubemapLayout::HCrossFnz;

        assert_eq!(cubemap_layout(None, &config), CubemapLayout::VStrip);
        assert_eq!(
            cubemap_layout(Some(CubemapLayout::VCross), &config),
            CubemapLayout::VCross
        );
    }
}
