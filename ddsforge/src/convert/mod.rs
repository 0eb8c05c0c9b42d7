//! Conversion orchestration.
//!
//! [`TextureConverter`] sequences header decoding, layout planning and
//! per-subresource materialization (codec or channel remapper), and the
//! mirror image for export. Each operation walks the
//! [`ConversionState`] machine; any failure aborts the operation and no
//! partial output is returned.
//!
//! Batches run whole textures in parallel on the rayon pool. A failed item
//! is reported in its [`BatchItem`] and never affects its siblings.

mod batch;
mod orchestrator;
mod state;

pub use batch::BatchItem;
pub use orchestrator::{ExportOptions, ImportOptions, TextureConverter};
pub use state::ConversionState;
