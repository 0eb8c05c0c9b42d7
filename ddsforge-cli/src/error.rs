//! CLI error type and exit handling.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process;

use ddsforge::config::{config_file_path, ConfigFileError};
use ddsforge::{DdsError, ErrorKind};

/// Errors surfaced to the user by the `ddsforge` binary.
#[derive(Debug)]
pub enum CliError {
    /// Invalid combination of arguments or settings.
    Config(String),
    /// The config file could not be read or written.
    ConfigFile(ConfigFileError),
    /// Logging could not be initialized.
    Logging(io::Error),
    /// Reading or writing a file failed.
    Io { path: PathBuf, source: io::Error },
    /// A host image could not be decoded or encoded.
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    /// The container codec rejected the input.
    Dds { path: PathBuf, source: DdsError },
    /// Some items of a batch failed; the others were written.
    Batch { failed: usize, total: usize },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn dds(path: impl Into<PathBuf>, source: DdsError) -> Self {
        CliError::Dds {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        CliError::Image {
            path: path.into(),
            source,
        }
    }

    /// Print the error and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Dds { source, .. } if source.kind() == ErrorKind::UnsupportedFormat => {
                eprintln!();
                eprintln!("Run 'ddsforge formats' to list supported formats.");
            }
            CliError::ConfigFile(_) => {
                eprintln!();
                eprintln!("Config file: {}", config_file_path().display());
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            CliError::Image { path, source } => write!(f, "{}: {}", path.display(), source),
            CliError::Dds { path, source } => write!(f, "{}: {}", path.display(), source),
            CliError::Batch { failed, total } => {
                write!(f, "{} of {} files failed", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Io { source, .. } => Some(source),
            CliError::Image { source, .. } => Some(source),
            CliError::Dds { source, .. } => Some(source),
            CliError::Config(_) | CliError::Batch { .. } => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_names_path() {
        let err = CliError::io("in/a.dds", io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.to_string(), "in/a.dds: missing");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_batch_has_no_source() {
        let err = CliError::Batch { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "2 of 5 files failed");
        assert!(err.source().is_none());
    }
}
