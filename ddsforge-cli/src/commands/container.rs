//! Split and assemble commands - restructure containers without re-encoding.

use std::path::PathBuf;

use ddsforge::container;

use super::common::{read_file, sibling_path, write_file, AssembleKind};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Split an array or volume into one container per element.
pub fn run_split(runner: &CliRunner, input: PathBuf, out_dir: Option<PathBuf>) -> Result<(), CliError> {
    runner.log_startup("split");

    let bytes = read_file(&input)?;
    let parts = container::split(&bytes).map_err(|e| CliError::dds(&input, e))?;

    for (index, part) in parts.iter().enumerate() {
        let path = sibling_path(&input, out_dir.as_deref(), &format!("_{}", index), "dds");
        write_file(&path, part)?;
        println!("{}", path.display());
    }
    println!("Split {} into {} containers", input.display(), parts.len());
    Ok(())
}

/// Combine containers into an array, volume or cubemap.
pub fn run_assemble(
    runner: &CliRunner,
    inputs: Vec<PathBuf>,
    output: PathBuf,
    kind: AssembleKind,
) -> Result<(), CliError> {
    runner.log_startup("assemble");

    let blobs = inputs
        .iter()
        .map(|path| read_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    let parts: Vec<&[u8]> = blobs.iter().map(Vec::as_slice).collect();

    let bytes = container::assemble(&parts, kind.into()).map_err(|e| CliError::dds(&output, e))?;
    write_file(&output, &bytes)?;

    println!(
        "Assembled {} parts as {:?} -> {}",
        inputs.len(),
        kind,
        output.display()
    );
    Ok(())
}
