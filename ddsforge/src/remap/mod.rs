//! Channel remapping between on-disk pixels and host RGBA.
//!
//! Uncompressed subresources are converted here; block-compressed ones go
//! through a [`crate::codec::BlockCodec`] instead. The host side is always
//! linear `Rgba32FImage` data in [0, 1] (or unbounded for float formats).
//!
//! - Signed-normalized channels map [-1, 1] on disk to [0, 1] on the host.
//! - Formats without alpha import fully opaque and drop host alpha on export.
//! - Padding channels are written as all ones.
//! - sRGB is metadata only; no gamma conversion happens here.

mod adjust;
mod pixels;

pub use adjust::{flip_green, unpremultiply};
pub use pixels::{from_host, to_host};
