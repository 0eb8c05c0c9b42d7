//! Format capability registry.
//!
//! Describes every pixel format the crate can lay out, remap or hand to a
//! codec, and resolves the legacy ways a container may name a format
//! (four-character codes and channel bit masks) to canonical ids.
//!
//! ```text
//!  four-character code ──┐
//!                        ├──► resolve_legacy ──► PixelFormatInfo
//!  bit masks ────────────┘          │
//!                                   └──► (fallback) LegacyMasked
//!  extended format code ──► lookup_dxgi ──► PixelFormatInfo
//! ```

mod legacy;
mod registry;
mod types;

pub use legacy::{
    LegacyPixelFormat, LegacyResolution, DDPF_ALPHA, DDPF_ALPHAPIXELS, DDPF_BUMPDUDV,
    DDPF_FOURCC, DDPF_LUMINANCE, DDPF_RGB,
};
pub use registry::FormatRegistry;
pub use types::{
    BlockInfo, ChannelLayout, ChannelRole, ChannelSet, ChannelSpec, CodecBackend, FormatId,
    Numeric, PixelFormatInfo, PixelMasks,
};
