use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use mavprims_schema::MessageRegistry;
use mavprims_wire::{ProtocolVersion, CHECKSUM_LEN};
use tracing::{debug, trace, warn};

use crate::codec::{decode_message, encode_message};
use crate::config::LinkConfig;
use crate::error::{DecodeError, Result};
use crate::event::{MalformedData, MessageObserver, ParseEvent};
use crate::message::Message;
use crate::session::{LinkStats, Session};

/// Incremental, resynchronizing frame parser for one byte stream.
///
/// Bytes go in through [`push`](Self::push) or [`feed`](Self::feed) in
/// chunks of any size. Output comes out strictly in arrival order. A byte
/// that cannot start a frame is dropped on its own and reported, so the
/// parser realigns on the next marker byte.
///
/// The parser owns its session. It is not meant to be fed from more than
/// one producer at a time.
#[derive(Debug)]
pub struct StreamParser {
    version: ProtocolVersion,
    registry: Arc<MessageRegistry>,
    buf: BytesMut,
    expected_len: usize,
    session: Session,
}

impl StreamParser {
    /// Create a parser with default link settings.
    pub fn new(version: ProtocolVersion, registry: Arc<MessageRegistry>) -> Self {
        Self::with_config(registry, &LinkConfig::for_version(version))
    }

    pub fn with_config(registry: Arc<MessageRegistry>, config: &LinkConfig) -> Self {
        Self {
            version: config.version,
            registry,
            buf: BytesMut::with_capacity(config.initial_buffer_capacity),
            expected_len: config.version.header_len(),
            session: Session::from_config(config),
        }
    }

    /// Append received bytes without parsing them.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        self.session.record_bytes_received(chunk.len());
    }

    /// Extract the next event from buffered bytes, if one is complete.
    pub fn next_event(&mut self) -> Option<ParseEvent> {
        let header_len = self.version.header_len();
        let first = *self.buf.first()?;

        if first != self.version.marker() {
            let data = self.buf.split_to(1).freeze();
            self.expected_len = header_len;
            self.session.record_receive_error();
            trace!(byte = first, "skipping byte outside frame");
            return Some(ParseEvent::Malformed(MalformedData {
                data,
                reason: DecodeError::BadPrefix(first),
            }));
        }

        if self.buf.len() >= 2 {
            self.expected_len = usize::from(self.buf[1]) + header_len + CHECKSUM_LEN;
        }

        if self.expected_len < self.version.min_frame_len() || self.buf.len() < self.expected_len {
            return None;
        }

        let candidate = self.buf.split_to(self.expected_len).freeze();
        self.expected_len = header_len;
        Some(self.decode_candidate(candidate))
    }

    /// Append `chunk` and drain every event that is now complete.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ParseEvent> {
        self.push(chunk);
        std::iter::from_fn(|| self.next_event()).collect()
    }

    /// Append `chunk` and hand every complete event to `observer`.
    ///
    /// Returns the number of events dispatched.
    pub fn feed_with<O>(&mut self, chunk: &[u8], observer: &mut O) -> usize
    where
        O: MessageObserver + ?Sized,
    {
        self.push(chunk);
        let mut count = 0;
        while let Some(event) = self.next_event() {
            event.dispatch(observer);
            count += 1;
        }
        count
    }

    /// Bytes still missing before the next frame can be extracted. Never 0.
    pub fn bytes_needed(&self) -> usize {
        self.expected_len.saturating_sub(self.buf.len()).max(1)
    }

    /// Encode `message` with this link's identity and count it as sent.
    pub fn pack(&mut self, message: &Message) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.version.max_frame_len());
        let written = encode_message(self.version, message, &self.session, &mut dst)?;
        self.session.record_sent(written);
        Ok(dst.freeze())
    }

    /// Drop buffered bytes and start over at a frame boundary.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.expected_len = self.version.header_len();
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn registry(&self) -> &Arc<MessageRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn stats(&self) -> LinkStats {
        self.session.stats()
    }

    /// Bytes received but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Size of the unit the parser is currently waiting for.
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    fn decode_candidate(&mut self, candidate: Bytes) -> ParseEvent {
        match decode_message(self.version, &self.registry, &candidate) {
            Ok(received) => {
                self.session.record_packet_received();
                debug!(
                    id = received.message.id(),
                    name = received.message.name(),
                    sequence = received.header.sequence,
                    system_id = received.header.system_id,
                    component_id = received.header.component_id,
                    "decoded message"
                );
                ParseEvent::Message(received)
            }
            Err(reason) => {
                self.session.record_receive_error();
                warn!(%reason, len = candidate.len(), "discarding malformed frame");
                ParseEvent::Malformed(MalformedData {
                    data: candidate,
                    reason,
                })
            }
        }
    }
}
