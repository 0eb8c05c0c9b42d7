//! Probe command - print container metadata without decoding pixels.

use std::path::PathBuf;

use ddsforge::layout::plan;
use ddsforge::TextureMetadata;

use super::common::read_file;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the probe command.
pub struct ProbeArgs {
    pub inputs: Vec<PathBuf>,
    pub json: bool,
}

/// Run the probe command.
pub fn run(runner: &CliRunner, args: ProbeArgs) -> Result<(), CliError> {
    runner.log_startup("probe");

    let mut failed = 0;
    let mut loaded = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        match read_file(path) {
            Ok(bytes) => loaded.push((path, bytes)),
            Err(e) => {
                eprintln!("{}", e);
                failed += 1;
            }
        }
    }

    let blobs: Vec<&[u8]> = loaded.iter().map(|(_, bytes)| bytes.as_slice()).collect();
    let items = runner.converter().probe_batch(&blobs);

    for item in items {
        let path = loaded[item.index].0;
        match item.result {
            Ok(descriptor) if args.json => {
                let json = TextureMetadata::from_descriptor(&descriptor)
                    .to_json()
                    .map_err(|e| CliError::dds(path, e))?;
                println!("{}", json);
            }
            Ok(descriptor) => {
                let layout = plan(&descriptor);
                println!("{}", path.display());
                println!("  Texture:      {}", descriptor);
                println!("  Format:       {}", descriptor.format.name);
                println!("  Subresources: {}", layout.len());
                println!("  Pixel data:   {} bytes", layout.total_size());
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Batch {
            failed,
            total: args.inputs.len(),
        });
    }
    Ok(())
}
