//! Import command - decode a container into an editable image.

use std::path::PathBuf;

use ddsforge::cubemap::CubemapLayout;
use ddsforge::layout::SubresourceKey;

use super::common::{read_file, save_image, sibling_path, write_file};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the import command.
pub struct ImportArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub invert_normals: bool,
    pub unpremultiply: bool,
    pub cubemap_layout: Option<CubemapLayout>,
    pub mip: u32,
    pub array_index: u32,
    pub slice: u32,
    pub metadata: bool,
}

/// Run the import command.
pub fn run(runner: &CliRunner, args: ImportArgs) -> Result<(), CliError> {
    runner.log_startup("import");
    let config = &runner.config().import;

    let options = config
        .options()
        .with_invert_normals(args.invert_normals || config.invert_normals)
        .with_unpremultiply_alpha(args.unpremultiply || config.unpremultiply_alpha);
    let layout = args.cubemap_layout.unwrap_or(config.cubemap_layout);
    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.input, None, "", "png"));

    let bytes = read_file(&args.input)?;
    let texture = runner
        .converter()
        .import(&bytes, &options)
        .map_err(|e| CliError::dds(&args.input, e))?;

    let image = if texture.metadata.is_cubemap {
        layout
            .from_host(&texture, args.array_index, args.mip)
            .map_err(|e| CliError::dds(&args.input, e))?
    } else {
        let key = SubresourceKey {
            array_index: args.array_index,
            face_index: 0,
            mip_level: args.mip,
            depth_slice: args.slice,
        };
        texture.image(key).cloned().ok_or_else(|| {
            CliError::Config(format!(
                "{} has no subresource {} ({} mip(s), array {}, depth {})",
                args.input.display(),
                key,
                texture.metadata.mip_count,
                texture.metadata.array_size,
                texture.metadata.depth
            ))
        })?
    };

    save_image(&output, &image)?;

    if args.metadata {
        let sidecar = output.with_extension("json");
        let json = texture
            .metadata
            .to_json()
            .map_err(|e| CliError::dds(&args.input, e))?;
        write_file(&sidecar, json.as_bytes())?;
        println!("Metadata: {}", sidecar.display());
    }

    println!(
        "Imported {} ({}) -> {}",
        args.input.display(),
        texture.metadata.format,
        output.display()
    );
    if texture.metadata.is_cubemap {
        println!("Cubemap flattened as {}", layout);
    }
    Ok(())
}
