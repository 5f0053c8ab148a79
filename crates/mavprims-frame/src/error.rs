use mavprims_wire::WireError;

/// Why a stray byte or a candidate frame was rejected by the receive path.
///
/// None of these are fatal to a stream; each one is reported as a
/// malformed-data event and parsing continues with the next byte.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A byte other than the protocol marker where a frame should start.
    #[error("bad prefix ({0:#04x})")]
    BadPrefix(u8),

    /// The candidate is shorter than the fixed header.
    #[error("header underrun ({available} bytes, need {needed})")]
    HeaderUnderrun { needed: usize, available: usize },

    /// The candidate does not start with the protocol marker.
    #[error("invalid marker ({0:#04x})")]
    BadMarker(u8),

    /// The length byte disagrees with the candidate size.
    #[error("invalid message length: header declares {declared}, frame carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// No descriptor is registered for the id.
    #[error("unknown message id ({0})")]
    UnknownMessageId(u32),

    /// The trailing checksum does not match the computed one.
    #[error("checksum mismatch (expected {expected:#06x}, received {received:#06x})")]
    ChecksumMismatch { expected: u16, received: u16 },

    /// The payload is shorter than the message layout.
    #[error("truncated payload ({available} bytes, layout needs {needed})")]
    TruncatedPayload { needed: usize, available: usize },
}

impl DecodeError {
    /// Stable snake_case name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadPrefix(_) => "bad_prefix",
            Self::HeaderUnderrun { .. } => "header_underrun",
            Self::BadMarker(_) => "bad_marker",
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::UnknownMessageId(_) => "unknown_message_id",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::TruncatedPayload { .. } => "truncated_payload",
        }
    }
}

/// Errors on the send path and in the blocking stream adapters.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Values or header did not fit the wire layout.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// A field name the message does not declare.
    #[error("unknown field '{field}' in {message}")]
    UnknownField { message: String, field: String },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
