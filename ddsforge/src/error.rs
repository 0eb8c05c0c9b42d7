//! Error types for DDS container operations.
//!
//! Every failure carries its kind, a human-readable cause and, where one
//! applies, the header field or byte offset implicated. Lower layers report
//! the first violated invariant and stop; only the batch helpers in
//! [`crate::convert`] continue past a failed item.

use std::fmt;

use thiserror::Error;

use crate::format::PixelMasks;
use crate::layout::SubresourceKey;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DdsError>;

/// Errors raised while decoding, planning, remapping or converting a texture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DdsError {
    /// Bad magic, bad declared sizes, truncated data or out-of-range fields.
    #[error("Malformed container: {field} at byte {offset}: {reason}")]
    MalformedContainer {
        field: &'static str,
        offset: usize,
        reason: String,
    },

    /// The pixel format is unknown or cannot be expressed in the container.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(UnsupportedFormat),

    /// A legacy cubemap that declares fewer than six faces.
    #[error("Unsupported partial cubemap: caps2 = {caps2:#010x} declares {faces} of 6 faces")]
    UnsupportedPartialCubemap { caps2: u32, faces: u32 },

    /// A combination of dimension, cubemap, array and format that cannot exist.
    #[error("Unsupported dimension combination: {0}")]
    UnsupportedDimensionCombination(String),

    /// A caller-built descriptor or host texture violates an invariant.
    #[error("Invalid descriptor: {field}: {reason}")]
    InvalidDescriptor { field: &'static str, reason: String },

    /// The external codec rejected a subresource.
    #[error("Codec failure on {format} subresource {subresource}: {reason}")]
    CodecFailure {
        subresource: SubresourceKey,
        format: &'static str,
        reason: String,
    },
}

/// Coarse classification of a [`DdsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedContainer,
    UnsupportedFormat,
    UnsupportedPartialCubemap,
    UnsupportedDimensionCombination,
    InvalidDescriptor,
    CodecFailure,
}

impl DdsError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DdsError::MalformedContainer { .. } => ErrorKind::MalformedContainer,
            DdsError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            DdsError::UnsupportedPartialCubemap { .. } => ErrorKind::UnsupportedPartialCubemap,
            DdsError::UnsupportedDimensionCombination(_) => {
                ErrorKind::UnsupportedDimensionCombination
            }
            DdsError::InvalidDescriptor { .. } => ErrorKind::InvalidDescriptor,
            DdsError::CodecFailure { .. } => ErrorKind::CodecFailure,
        }
    }

    pub(crate) fn malformed(field: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        DdsError::MalformedContainer {
            field,
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DdsError::InvalidDescriptor {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn dimensions(reason: impl Into<String>) -> Self {
        DdsError::UnsupportedDimensionCombination(reason.into())
    }
}

impl From<UnsupportedFormat> for DdsError {
    fn from(detail: UnsupportedFormat) -> Self {
        DdsError::UnsupportedFormat(detail)
    }
}

/// The offending value behind an [`DdsError::UnsupportedFormat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedFormat {
    /// Legacy four-character tag with no registry mapping.
    FourCc([u8; 4]),
    /// Legacy bit masks that neither the priority list nor fallback accept.
    Masks(PixelMasks),
    /// Extended-header format code absent from the registry.
    Dxgi(u32),
    /// Format name that does not parse.
    Name(String),
    /// Format that only exists as legacy masks but needs the extended header.
    NoExtendedEncoding(&'static str),
    /// Block-compressed format handed to the channel remapper.
    RequiresCodec(&'static str),
}

impl fmt::Display for UnsupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedFormat::FourCc(tag) => {
                write!(f, "four-character code '{}'", escape_fourcc(tag))
            }
            UnsupportedFormat::Masks(masks) => write!(f, "bit masks {}", masks),
            UnsupportedFormat::Dxgi(code) => write!(f, "extended format code {}", code),
            UnsupportedFormat::Name(name) => write!(f, "format name '{}'", name),
            UnsupportedFormat::NoExtendedEncoding(name) => write!(
                f,
                "{} has no extended-header format code and cannot carry extended metadata",
                name
            ),
            UnsupportedFormat::RequiresCodec(name) => {
                write!(f, "{} is block-compressed and can only be read through a codec", name)
            }
        }
    }
}

/// Renders a four-character code, hex-escaping non-printable bytes.
pub fn escape_fourcc(tag: &[u8; 4]) -> String {
    let mut out = String::with_capacity(4);
    for &b in tag {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{:02x}", b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_field_and_offset() {
        let err = DdsError::malformed("magic", 0, "expected 'DDS '");
        assert_eq!(
            err.to_string(),
            "Malformed container: magic at byte 0: expected 'DDS '"
        );
        assert_eq!(err.kind(), ErrorKind::MalformedContainer);
    }

    #[test]
    fn test_unsupported_fourcc_display() {
        let err: DdsError = UnsupportedFormat::FourCc(*b"ETC1").into();
        assert_eq!(
            err.to_string(),
            "Unsupported format: four-character code 'ETC1'"
        );
    }

    #[test]
    fn test_escape_fourcc_non_printable() {
        assert_eq!(escape_fourcc(&[b'B', b'C', b'7', 0]), "BC7\\x00");
        assert_eq!(escape_fourcc(&[0x24, 0, 0, 0]), "$\\x00\\x00\\x00");
    }

    #[test]
    fn test_partial_cubemap_display() {
        let err = DdsError::UnsupportedPartialCubemap {
            caps2: 0x0000_0e00,
            faces: 3,
        };
        assert!(err.to_string().contains("3 of 6 faces"));
        assert!(err.to_string().contains("0x00000e00"));
    }

    #[test]
    fn test_codec_failure_names_subresource() {
        let err = DdsError::CodecFailure {
            subresource: SubresourceKey {
                array_index: 0,
                face_index: 2,
                mip_level: 1,
                depth_slice: 0,
            },
            format: "BC7_UNORM",
            reason: "encoder unavailable".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::CodecFailure);
        assert_eq!(
            err.to_string(),
            "Codec failure on BC7_UNORM subresource array 0 face 2 mip 1 slice 0: encoder unavailable"
        );
    }
}
