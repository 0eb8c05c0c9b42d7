//! User configuration in `~/.ddsforge/config.ini`.
//!
//! Settings structs live in `settings`, parsing in `parser` and
//! serialization in `writer`. A missing file yields defaults; command-line
//! flags override whatever is loaded here.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, ExportSettings, ImportSettings, LoggingSettings, DEFAULT_EXPORT_FORMAT,
    DEFAULT_LOG_FILE,
};
pub use writer::to_config_string;
