//! Block-compression codec seam.
//!
//! Compressed subresources are opaque to the container code: they are
//! decoded and encoded by a [`BlockCodec`] chosen by the format's
//! [`CodecBackend`](crate::format::CodecBackend) tag.
//!
//! ```text
//! ┌──────────────────────┐
//! │   TextureConverter   │
//! │                      │
//! │   CodecHandle        │──── session() ───► scoped lock (non-reentrant codecs)
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │  BlockCodec (trait)  │
//! └──────────┬───────────┘
//!       ┌────┴──────┐
//!       ▼           ▼
//! ┌───────────┐ ┌───────────┐
//! │NativeCodec│ │ test fakes│
//! └───────────┘ └───────────┘
//! ```
//!
//! Whether calls must be serialized is a property of the codec
//! ([`BlockCodec::is_reentrant`]), not of the caller.

mod handle;
mod native;

pub use handle::{CodecHandle, CodecSession};
pub use native::{Bc7Quality, NativeCodec};

use image::Rgba32FImage;
use thiserror::Error;

use crate::format::PixelFormatInfo;

/// Errors reported by a codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The codec cannot handle this format in this direction.
    #[error("{0} is not supported by this codec")]
    Unsupported(String),

    /// The input does not match the format or extent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying library failed.
    #[error("{0}")]
    Failed(String),
}

/// Decoder/encoder for block-compressed subresources.
///
/// Implementations receive exactly one subresource per call.
pub trait BlockCodec: Send + Sync {
    /// Human-readable codec name for logs.
    fn name(&self) -> &str;

    /// Decodes one compressed subresource to host RGBA.
    fn decode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        format: &PixelFormatInfo,
    ) -> Result<Rgba32FImage, CodecError>;

    /// Encodes host RGBA into one compressed subresource.
    fn encode(&self, image: &Rgba32FImage, format: &PixelFormatInfo) -> Result<Vec<u8>, CodecError>;

    /// Whether concurrent calls are safe. Non-reentrant codecs are
    /// serialized behind a shared lock by [`CodecHandle`].
    fn is_reentrant(&self) -> bool {
        false
    }
}
