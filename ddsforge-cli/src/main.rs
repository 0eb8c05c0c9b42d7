//! DDSForge CLI - Command-line interface
//!
//! Probes, imports, exports and restructures DDS containers using the
//! `ddsforge` library. Defaults come from `~/.ddsforge/config.ini`; flags
//! override them.

mod commands;
mod error;
mod mipmap;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ddsforge::cubemap::CubemapLayout;

use commands::common::AssembleKind;
use commands::config::ConfigCommands;
use commands::export::ExportArgs;
use commands::import::ImportArgs;
use commands::probe::ProbeArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "ddsforge")]
#[command(version, about = "DDS texture container codec", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print container metadata without decoding pixels
    Probe {
        /// DDS files to inspect
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Print metadata as JSON, one object per file
        #[arg(long)]
        json: bool,
    },

    /// Decode a DDS file into an image (PNG, EXR, ...)
    Import {
        /// DDS file to decode
        input: PathBuf,

        /// Output image (default: input with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Flip the green channel of normal maps
        #[arg(long)]
        invert_normals: bool,

        /// Divide colour by alpha for premultiplied textures
        #[arg(long)]
        unpremultiply: bool,

        /// Layout used to flatten cubemaps (h-cross, v-cross, h-cross-fnz, v-cross-fnz, h-strip, v-strip)
        #[arg(long)]
        cubemap_layout: Option<CubemapLayout>,

        /// Mip level to extract
        #[arg(long, default_value = "0")]
        mip: u32,

        /// Array element to extract
        #[arg(long, default_value = "0")]
        array_index: u32,

        /// Depth slice to extract from volume textures
        #[arg(long, default_value = "0")]
        slice: u32,

        /// Also write texture metadata as JSON next to the output
        #[arg(long)]
        metadata: bool,
    },

    /// Encode images as DDS files
    Export {
        /// Images to encode
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file for a single input (default: input with .dds extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target format name, e.g. BC7_UNORM (see 'ddsforge formats')
        #[arg(short, long)]
        format: Option<String>,

        /// Write only the base level
        #[arg(long)]
        no_mip: bool,

        /// Number of mip levels to generate (default: full chain)
        #[arg(long, conflicts_with = "no_mip")]
        mip_count: Option<u32>,

        /// Always write the extended (DX10) header
        #[arg(long)]
        force_extended: bool,

        /// Flip the green channel of normal maps
        #[arg(long)]
        invert_normals: bool,

        /// Treat each input as a flattened cubemap
        #[arg(long)]
        cubemap: bool,

        /// Layout of flattened cubemap inputs
        #[arg(long)]
        cubemap_layout: Option<CubemapLayout>,

        /// Metadata JSON written by 'import --metadata'
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Split an array or volume into separate DDS files
    Split {
        /// DDS file to split
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Combine DDS files into an array, volume or cubemap
    Assemble {
        /// Parts in order (faces as +X, -X, +Y, -Y, +Z, -Z for cubemaps)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output DDS file
        #[arg(short, long)]
        output: PathBuf,

        /// How the parts are combined
        #[arg(short, long, value_enum, default_value = "array")]
        mode: AssembleKind,
    },

    /// List supported formats
    Formats,

    /// Manage configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Formats => {
            commands::formats::run();
            Ok(())
        }
        Commands::Config { command } => commands::config::run(command),
        command => run_with_runner(command, cli.verbose),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn run_with_runner(command: Commands, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;

    match command {
        Commands::Probe { inputs, json } => commands::probe::run(&runner, ProbeArgs { inputs, json }),
        Commands::Import {
            input,
            output,
            invert_normals,
            unpremultiply,
            cubemap_layout,
            mip,
            array_index,
            slice,
            metadata,
        } => commands::import::run(
            &runner,
            ImportArgs {
                input,
                output,
                invert_normals,
                unpremultiply,
                cubemap_layout,
                mip,
                array_index,
                slice,
                metadata,
            },
        ),
        Commands::Export {
            inputs,
            output,
            format,
            no_mip,
            mip_count,
            force_extended,
            invert_normals,
            cubemap,
            cubemap_layout,
            metadata,
        } => commands::export::run(
            &runner,
            ExportArgs {
                inputs,
                output,
                format,
                no_mip,
                mip_count,
                force_extended,
                invert_normals,
                cubemap,
                cubemap_layout,
                metadata,
            },
        ),
        Commands::Split { input, out_dir } => commands::container::run_split(&runner, input, out_dir),
        Commands::Assemble { inputs, output, mode } => {
            commands::container::run_assemble(&runner, inputs, output, mode)
        }
        Commands::Formats | Commands::Config { .. } => Ok(()),
    }
}
