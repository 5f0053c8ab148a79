use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use mavprims_wire::ProtocolVersion;

use crate::codec::encode_message;
use crate::config::LinkConfig;
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::session::Session;

/// Writes framed messages to any `Write` stream.
///
/// Owns the outgoing session: every successful send stamps the current
/// sequence number and then advances it.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    version: ProtocolVersion,
    session: Session,
}

impl<T: Write> MessageWriter<T> {
    /// Create a writer with source ids 0/0.
    pub fn new(inner: T, version: ProtocolVersion) -> Self {
        Self::with_config(inner, &LinkConfig::for_version(version))
    }

    pub fn with_config(inner: T, config: &LinkConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.version.max_frame_len()),
            version: config.version,
            session: Session::from_config(config),
        }
    }

    /// Encode and send one message (blocking). Returns the frame size.
    ///
    /// The session only advances once the whole frame is written.
    pub fn send(&mut self, message: &Message) -> Result<usize> {
        self.buf.clear();
        let len = encode_message(self.version, message, &self.session, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        self.session.record_sent(len);
        Ok(len)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
