use crate::scalar::Slot;
use crate::version::ProtocolVersion;

/// Errors that can occur while packing or unpacking wire primitives.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    /// Fewer bytes than the fixed header size were available.
    #[error("header underrun ({available} bytes, need {needed})")]
    HeaderUnderrun { needed: usize, available: usize },

    /// Fewer payload bytes than the field layout requires.
    #[error("truncated payload ({available} bytes, layout needs {needed})")]
    TruncatedPayload { needed: usize, available: usize },

    /// The message id does not fit the header layout of the version.
    #[error("message id {id} does not fit a {version} header")]
    MessageIdOutOfRange { id: u32, version: ProtocolVersion },

    /// The number of values does not match the number of slots.
    #[error("expected {expected} values, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// A value does not have the kind or array length of its slot.
    #[error("value {index} does not match slot {expected}")]
    ValueMismatch { index: usize, expected: Slot },

    /// An unrecognized primitive type name.
    #[error("unknown field type '{0}'")]
    UnknownFieldKind(String),

    /// An unrecognized protocol version string.
    #[error("unknown protocol version '{0}'")]
    UnknownVersion(String),
}

pub type Result<T> = std::result::Result<T, WireError>;
