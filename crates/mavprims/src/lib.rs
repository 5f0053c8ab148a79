//! MAVLink v1/v2 framing with permissive licensing.
//!
//! mavprims encodes typed messages into checksummed frames and turns raw
//! link bytes back into messages, reporting garbage instead of failing.
//! Transports, schema loading and signing stay with the caller.
//!
//! # Crate Structure
//!
//! - [`wire`]: Checksum, little-endian scalar codec, v1/v2 header codec
//! - [`schema`]: Message descriptors and the id-keyed registry
//! - [`frame`]: Message codec, stream parser, blocking and async adapters

/// Re-export wire types.
pub mod wire {
    pub use mavprims_wire::*;
}

/// Re-export schema types.
pub mod schema {
    pub use mavprims_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mavprims_frame::*;
}
