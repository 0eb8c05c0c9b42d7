//! Configuration management CLI commands.

use clap::Subcommand;
use ddsforge::config::{config_file_path, to_config_string, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default config file if none exists
    Init,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = ConfigFile::load()?;
            print!("{}", to_config_string(&config));
        }
        ConfigCommands::Init => {
            let path = ConfigFile::ensure_exists()?;
            println!("Configuration file: {}", path.display());
            println!();
            println!("Edit this file to change export and import defaults.");
            println!("CLI arguments override config file values when specified.");
        }
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
        }
    }
    Ok(())
}
