//! Checksum, scalar and header codecs for the MAVLink wire format.
//!
//! This is the lowest layer of mavprims. Every frame on the wire is built from:
//! - A fixed-size header whose layout depends on the [`ProtocolVersion`]
//! - A little-endian payload packed from typed [`Slot`]s
//! - A 2-byte X.25 [`Checksum`] salted with a per-message constant
//!
//! Everything in this crate is pure and stateless; sessions and stream
//! reassembly live in `mavprims-frame`.

pub mod checksum;
pub mod error;
pub mod header;
pub mod scalar;
pub mod version;

pub use checksum::{checksum, salted_checksum, Checksum, CHECKSUM_SEED};
pub use error::{Result, WireError};
pub use header::Header;
pub use scalar::{
    decode_flat, decode_values, encode_values, group_flat, layout_size, FieldKind, Scalar, Slot,
    Value,
};
pub use version::{ProtocolVersion, CHECKSUM_LEN, MAX_PAYLOAD_LEN, V1_MARKER, V2_MARKER};
