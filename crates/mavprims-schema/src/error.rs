/// Errors that can occur while constructing descriptors or the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The message id does not fit in 24 bits.
    #[error("message id {0} exceeds 24 bits")]
    MessageIdOutOfRange(u32),

    /// The message has no name.
    #[error("message {0} has an empty name")]
    EmptyMessageName(u32),

    /// The wire-order permutation is not a permutation of the fields.
    #[error("invalid order map for {message}: {reason}")]
    InvalidOrderMap { message: String, reason: String },

    /// Two fields share a name.
    #[error("duplicate field '{field}' in {message}")]
    DuplicateField { message: String, field: String },

    /// A field name that the message does not declare.
    #[error("unknown field '{field}' in {message}")]
    UnknownField { message: String, field: String },

    /// The instance field index is past the end of the field list.
    #[error("instance field {index} out of range for {message} ({count} fields)")]
    InstanceFieldOutOfRange {
        message: String,
        index: usize,
        count: usize,
    },

    /// The full payload layout does not fit the single-byte length field.
    #[error("payload of {message} is {len} bytes, max 255")]
    PayloadTooLong { message: String, len: usize },

    /// Another descriptor is already registered under this id.
    #[error("message id {0} already registered")]
    DuplicateMessageId(u32),

    /// Another descriptor is already registered under this name.
    #[error("message name '{0}' already registered")]
    DuplicateMessageName(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
