//! Container header codec.
//!
//! A container starts with the 4-byte magic, followed by the 124-byte legacy
//! header (which embeds a 32-byte pixel-format block) and, when the pixel
//! format tag is `DX10`, a 20-byte extended header:
//!
//! ```text
//! ┌───────┬──────────────────────────────┬──────────────────┬──────────────┐
//! │ "DDS "│ legacy header (124)          │ extended (20)    │ pixel data   │
//! │       │  ... pixel format (32) ...   │ optional         │              │
//! └───────┴──────────────────────────────┴──────────────────┴──────────────┘
//! 0       4                              128                128 or 148
//! ```
//!
//! [`decode`] turns header bytes into a validated [`TextureDescriptor`];
//! [`encode`] is its inverse and prefers the legacy header whenever it can
//! express the texture.
//!
//! [`TextureDescriptor`]: crate::descriptor::TextureDescriptor

mod decode;
mod encode;
mod types;

pub use decode::{decode, kind_from_caps2, DecodedHeader};
pub use encode::{build_header, encode, requires_extended, EncodeOptions};
pub use types::*;
