//! Protocol versions and their fixed layout constants.
//!
//! A running session commits to exactly one version; the marker byte,
//! header size and message id width all follow from it.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::WireError;

/// Start-of-frame marker for v1 frames.
pub const V1_MARKER: u8 = 0xFE;

/// Start-of-frame marker for v2 frames.
pub const V2_MARKER: u8 = 0xFD;

/// v1 header: marker, len, seq, sysid, compid, msgid.
pub const V1_HEADER_LEN: usize = 6;

/// v2 header: marker, len, incompat, compat, seq, sysid, compid, msgid (3B).
pub const V2_HEADER_LEN: usize = 10;

/// Trailing checksum size.
pub const CHECKSUM_LEN: usize = 2;

/// The length field is a single byte.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Wire protocol version of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V1,
    #[default]
    V2,
}

impl ProtocolVersion {
    /// The fixed start-of-frame marker byte.
    pub const fn marker(self) -> u8 {
        match self {
            Self::V1 => V1_MARKER,
            Self::V2 => V2_MARKER,
        }
    }

    /// Size of the fixed header in bytes.
    pub const fn header_len(self) -> usize {
        match self {
            Self::V1 => V1_HEADER_LEN,
            Self::V2 => V2_HEADER_LEN,
        }
    }

    /// Smallest possible frame: header, empty payload, checksum.
    pub const fn min_frame_len(self) -> usize {
        self.header_len() + CHECKSUM_LEN
    }

    /// Largest possible frame: header, 255-byte payload, checksum.
    pub const fn max_frame_len(self) -> usize {
        self.header_len() + MAX_PAYLOAD_LEN + CHECKSUM_LEN
    }

    /// Largest message id the header can carry.
    pub const fn max_message_id(self) -> u32 {
        match self {
            Self::V1 => 0xFF,
            Self::V2 => 0x00FF_FFFF,
        }
    }

    /// Whether trailing zero payload bytes are stripped on encode.
    pub const fn truncates_payload(self) -> bool {
        matches!(self, Self::V2)
    }

    /// Dotted wire protocol version string.
    pub const fn wire_version(self) -> &'static str {
        match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
        }
    }

    /// Resolve a version from its marker byte.
    pub const fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            V1_MARKER => Some(Self::V1),
            V2_MARKER => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" | "1.0" => Ok(Self::V1),
            "2" | "v2" | "2.0" => Ok(Self::V2),
            other => Err(WireError::UnknownVersion(other.to_string())),
        }
    }
}
