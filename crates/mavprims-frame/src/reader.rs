use std::io::{ErrorKind, Read};
use std::sync::Arc;

use mavprims_schema::MessageRegistry;
use mavprims_wire::ProtocolVersion;

use crate::config::LinkConfig;
use crate::error::{FrameError, Result};
use crate::event::ParseEvent;
use crate::message::ReceivedMessage;
use crate::parser::StreamParser;

/// Reads parse events from any `Read` stream.
///
/// Handles partial reads internally. Callers get whole frames or
/// malformed-data reports, never fragments.
pub struct MessageReader<T> {
    inner: T,
    parser: StreamParser,
    chunk: Vec<u8>,
}

impl<T: Read> MessageReader<T> {
    /// Create a reader for `version` with default buffer settings.
    pub fn new(inner: T, version: ProtocolVersion, registry: Arc<MessageRegistry>) -> Self {
        Self::with_config(inner, registry, &LinkConfig::for_version(version))
    }

    pub fn with_config(inner: T, registry: Arc<MessageRegistry>, config: &LinkConfig) -> Self {
        Self {
            inner,
            parser: StreamParser::with_config(registry, config),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
        }
    }

    /// Read the next event (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// Bytes of an unfinished frame at EOF are left in the parser.
    pub fn read_event(&mut self) -> Result<ParseEvent> {
        loop {
            if let Some(event) = self.parser.next_event() {
                return Ok(event);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.parser.push(&self.chunk[..read]);
        }
    }

    /// Read until the next decoded message, skipping malformed data.
    pub fn read_message(&mut self) -> Result<ReceivedMessage> {
        loop {
            if let ParseEvent::Message(received) = self.read_event()? {
                return Ok(received);
            }
        }
    }

    pub fn parser(&self) -> &StreamParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut StreamParser {
        &mut self.parser
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
