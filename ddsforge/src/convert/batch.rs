//! Parallel batches with per-item failure isolation.

use rayon::prelude::*;
use tracing::info;

use super::orchestrator::{ExportOptions, ImportOptions, TextureConverter};
use super::state::{Conversion, ConversionState};
use crate::descriptor::TextureDescriptor;
use crate::error::Result;
use crate::format::PixelFormatInfo;
use crate::host::HostTexture;

/// Outcome of one item in a batch.
#[derive(Debug)]
pub struct BatchItem<T> {
    /// Position of the item in the input slice.
    pub index: usize,
    /// Final state: `Done` (or `HeaderParsed` for probes) or `Failed`.
    pub state: ConversionState,
    pub result: Result<T>,
}

impl<T> BatchItem<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn summarize<T>(operation: &str, items: &[BatchItem<T>]) {
    let failed = items.iter().filter(|item| !item.is_ok()).count();
    info!(
        operation,
        total = items.len(),
        failed,
        "batch complete"
    );
}

impl TextureConverter {
    /// Imports every container in parallel. Results keep input order.
    pub fn import_batch(&self, inputs: &[&[u8]], options: &ImportOptions) -> Vec<BatchItem<HostTexture>> {
        let items: Vec<_> = inputs
            .par_iter()
            .enumerate()
            .map(|(index, bytes)| {
                let mut conversion = Conversion::new("import");
                let result = self.run_import(bytes, options, &mut conversion);
                BatchItem {
                    index,
                    state: conversion.state().clone(),
                    result,
                }
            })
            .collect();
        summarize("import", &items);
        items
    }

    /// Probes every container header in parallel.
    pub fn probe_batch(&self, inputs: &[&[u8]]) -> Vec<BatchItem<TextureDescriptor>> {
        let items: Vec<_> = inputs
            .par_iter()
            .enumerate()
            .map(|(index, bytes)| {
                let mut conversion = Conversion::new("probe");
                let result = self.run_probe(bytes, &mut conversion);
                BatchItem {
                    index,
                    state: conversion.state().clone(),
                    result,
                }
            })
            .collect();
        summarize("probe", &items);
        items
    }

    /// Exports every texture to its paired target format in parallel.
    pub fn export_batch(
        &self,
        inputs: &[(&HostTexture, &PixelFormatInfo)],
        options: &ExportOptions,
    ) -> Vec<BatchItem<Vec<u8>>> {
        let items: Vec<_> = inputs
            .par_iter()
            .enumerate()
            .map(|(index, (texture, target))| {
                let mut conversion = Conversion::new("export");
                let result = self.run_export(texture, target, options, &mut conversion);
                BatchItem {
                    index,
                    state: conversion.state().clone(),
                    result,
                }
            })
            .collect();
        summarize("export", &items);
        items
    }
}
