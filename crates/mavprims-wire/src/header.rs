use bytes::{BufMut, BytesMut};
use serde::Serialize;

use crate::error::{Result, WireError};
use crate::version::ProtocolVersion;

/// Fixed-size frame header.
///
/// Wire layout, v1 (6 bytes):
/// ```text
/// ┌────────┬─────┬─────┬────────┬───────────┬────────┐
/// │ marker │ len │ seq │ sys id │ comp id   │ msg id │
/// │ 0xFE   │     │     │        │           │ (1B)   │
/// └────────┴─────┴─────┴────────┴───────────┴────────┘
/// ```
///
/// Wire layout, v2 (10 bytes):
/// ```text
/// ┌────────┬─────┬──────────┬────────┬─────┬────────┬─────────┬────────────┐
/// │ marker │ len │ incompat │ compat │ seq │ sys id │ comp id │ msg id     │
/// │ 0xFD   │     │ flags    │ flags  │     │        │         │ (3B LE)    │
/// └────────┴─────┴──────────┴────────┴─────┴────────┴─────────┴────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Header {
    /// Start-of-frame byte as found on the wire.
    pub marker: u8,
    pub payload_len: u8,
    /// Always zero for v1.
    pub incompat_flags: u8,
    /// Always zero for v1.
    pub compat_flags: u8,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u32,
}

impl Header {
    /// Build an outbound header with zeroed flags.
    pub fn new(
        version: ProtocolVersion,
        message_id: u32,
        payload_len: u8,
        sequence: u8,
        system_id: u8,
        component_id: u8,
    ) -> Self {
        Self {
            marker: version.marker(),
            payload_len,
            incompat_flags: 0,
            compat_flags: 0,
            sequence,
            system_id,
            component_id,
            message_id,
        }
    }

    /// Append the header in the layout of `version`.
    pub fn encode(&self, version: ProtocolVersion, dst: &mut BytesMut) -> Result<()> {
        if self.message_id > version.max_message_id() {
            return Err(WireError::MessageIdOutOfRange {
                id: self.message_id,
                version,
            });
        }

        dst.reserve(version.header_len());
        dst.put_u8(self.marker);
        dst.put_u8(self.payload_len);
        match version {
            ProtocolVersion::V1 => {
                dst.put_u8(self.sequence);
                dst.put_u8(self.system_id);
                dst.put_u8(self.component_id);
                dst.put_u8(self.message_id as u8);
            }
            ProtocolVersion::V2 => {
                dst.put_u8(self.incompat_flags);
                dst.put_u8(self.compat_flags);
                dst.put_u8(self.sequence);
                dst.put_u8(self.system_id);
                dst.put_u8(self.component_id);
                dst.put_u8((self.message_id & 0xFF) as u8);
                dst.put_u8(((self.message_id >> 8) & 0xFF) as u8);
                dst.put_u8(((self.message_id >> 16) & 0xFF) as u8);
            }
        }
        Ok(())
    }

    /// Parse a header in the layout of `version` from the front of `src`.
    ///
    /// The marker byte is taken as-is; checking it is the caller's job.
    pub fn decode(version: ProtocolVersion, src: &[u8]) -> Result<Self> {
        let needed = version.header_len();
        if src.len() < needed {
            return Err(WireError::HeaderUnderrun {
                needed,
                available: src.len(),
            });
        }

        let header = match version {
            ProtocolVersion::V1 => Self {
                marker: src[0],
                payload_len: src[1],
                incompat_flags: 0,
                compat_flags: 0,
                sequence: src[2],
                system_id: src[3],
                component_id: src[4],
                message_id: u32::from(src[5]),
            },
            ProtocolVersion::V2 => Self {
                marker: src[0],
                payload_len: src[1],
                incompat_flags: src[2],
                compat_flags: src[3],
                sequence: src[4],
                system_id: src[5],
                component_id: src[6],
                message_id: u32::from(src[7])
                    | (u32::from(src[8]) << 8)
                    | (u32::from(src[9]) << 16),
            },
        };
        Ok(header)
    }
}
