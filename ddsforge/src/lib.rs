//! DDSForge - DDS texture container codec
//!
//! Reads and writes DDS containers (block-compressed and linear formats,
//! cubemaps, arrays and volumes) and converts them to and from linear RGBA
//! host images.
//!
//! ```text
//!  bytes ──► header::decode ──► TextureDescriptor ──► layout::plan ──► SurfacePlan
//!                                                                        │
//!               ┌────────────────────────────────────────────────────────┘
//!               ▼
//!    per subresource: codec (compressed) or remap (uncompressed)
//!               │
//!               ▼
//!          HostTexture { metadata, surfaces }
//! ```
//!
//! [`convert::TextureConverter`] drives the whole sequence; the other
//! modules are usable on their own. All I/O belongs to the caller: the
//! library only sees byte buffers.

pub mod codec;
pub mod config;
pub mod container;
pub mod convert;
pub mod cubemap;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod header;
pub mod host;
pub mod layout;
pub mod logging;
pub mod remap;

pub use codec::{BlockCodec, CodecHandle, NativeCodec};
pub use convert::{BatchItem, ConversionState, ExportOptions, ImportOptions, TextureConverter};
pub use descriptor::{AlphaMode, Dimension, TextureDescriptor, TextureKind};
pub use error::{DdsError, ErrorKind, Result};
pub use format::{FormatId, FormatRegistry, PixelFormatInfo};
pub use host::{HostSurface, HostTexture, MipGenerator, TextureMetadata};
