//! Message codec and stream parser for MAVLink-style telemetry links.
//!
//! Every frame on the wire is:
//! - A fixed header (6 bytes for v1, 10 for v2) led by a marker byte
//! - A little-endian payload laid out in wire order
//! - A 2-byte checksum salted with a per-message byte
//!
//! [`StreamParser`] turns arbitrary byte chunks into decoded messages and
//! malformed-data reports, resynchronizing one byte at a time after garbage.

pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod parser;
pub mod reader;
pub mod session;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use codec::{decode_message, encode_message, encode_to_bytes};
pub use config::{LinkConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_READ_CHUNK};
pub use error::{DecodeError, FrameError, Result};
pub use event::{MalformedData, MessageObserver, ParseEvent};
pub use message::{Message, ReceivedMessage};
pub use parser::StreamParser;
pub use reader::MessageReader;
pub use session::{LinkStats, Session};
#[cfg(feature = "async")]
pub use tokio_codec::MavCodec;
pub use writer::MessageWriter;
