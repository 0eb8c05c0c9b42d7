//! CLI command implementations.

pub mod common;
pub mod config;
pub mod container;
pub mod export;
pub mod formats;
pub mod import;
pub mod probe;
