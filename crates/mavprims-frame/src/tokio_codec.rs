use std::sync::Arc;

use bytes::BytesMut;
use mavprims_schema::MessageRegistry;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::encode_message;
use crate::config::LinkConfig;
use crate::error::FrameError;
use crate::event::ParseEvent;
use crate::message::Message;
use crate::parser::StreamParser;

/// [`tokio_util::codec`] adapter over [`StreamParser`].
///
/// Decoding yields every [`ParseEvent`], malformed data included. Encoding
/// stamps and advances the parser's session.
#[derive(Debug)]
pub struct MavCodec {
    parser: StreamParser,
}

impl MavCodec {
    pub fn new(registry: Arc<MessageRegistry>, config: &LinkConfig) -> Self {
        Self {
            parser: StreamParser::with_config(registry, config),
        }
    }

    pub fn parser(&self) -> &StreamParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut StreamParser {
        &mut self.parser
    }
}

impl Decoder for MavCodec {
    type Item = ParseEvent;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            let chunk = src.split();
            self.parser.push(&chunk);
        }
        Ok(self.parser.next_event())
    }
}

impl Encoder<&Message> for MavCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let version = self.parser.version();
        let written = encode_message(version, item, self.parser.session(), dst)?;
        self.parser.session_mut().record_sent(written);
        Ok(())
    }
}
