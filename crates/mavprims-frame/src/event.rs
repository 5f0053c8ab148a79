use bytes::Bytes;
use serde::ser::{Serialize, Serializer};

use crate::error::DecodeError;
use crate::message::{Message, ReceivedMessage};

/// Bytes the parser gave up on, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedData {
    pub data: Bytes,
    pub reason: DecodeError,
}

/// One unit of parser output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    Message(ReceivedMessage),
    Malformed(MalformedData),
}

impl ParseEvent {
    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    pub fn as_message(&self) -> Option<&ReceivedMessage> {
        match self {
            Self::Message(received) => Some(received),
            Self::Malformed(_) => None,
        }
    }

    pub fn into_message(self) -> Option<ReceivedMessage> {
        match self {
            Self::Message(received) => Some(received),
            Self::Malformed(_) => None,
        }
    }

    pub fn as_malformed(&self) -> Option<&MalformedData> {
        match self {
            Self::Malformed(data) => Some(data),
            Self::Message(_) => None,
        }
    }

    /// Hand the event to `observer`. Messages go to the per-type hook first.
    pub fn dispatch<O: MessageObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            Self::Message(received) => {
                observer.on_typed_message(received.message.name(), received);
                observer.on_message(received);
            }
            Self::Malformed(data) => observer.on_malformed(data),
        }
    }

    /// One-line JSON record for log sinks.
    pub fn to_json(&self) -> String {
        let encoded = match self {
            Self::Message(received) => serde_json::to_string(&MessageOutput::from(received)),
            Self::Malformed(data) => serde_json::to_string(&MalformedOutput::from(data)),
        };
        encoded.unwrap_or_else(|_| "{}".to_string())
    }
}

/// Receiver for parser output.
///
/// Every method defaults to doing nothing, so implementors only override
/// the hooks they care about.
pub trait MessageObserver {
    /// Called for every decoded message.
    fn on_message(&mut self, _message: &ReceivedMessage) {}

    /// Called for every decoded message, before [`on_message`](Self::on_message),
    /// with the message name.
    fn on_typed_message(&mut self, _name: &str, _message: &ReceivedMessage) {}

    fn on_malformed(&mut self, _data: &MalformedData) {}
}

#[derive(serde::Serialize)]
struct MessageOutput<'a> {
    kind: &'static str,
    name: &'a str,
    id: u32,
    sequence: u8,
    system_id: u8,
    component_id: u8,
    checksum: u16,
    fields: FieldsOutput<'a>,
}

impl<'a> From<&'a ReceivedMessage> for MessageOutput<'a> {
    fn from(received: &'a ReceivedMessage) -> Self {
        Self {
            kind: "message",
            name: received.message.name(),
            id: received.message.id(),
            sequence: received.header.sequence,
            system_id: received.header.system_id,
            component_id: received.header.component_id,
            checksum: received.checksum,
            fields: FieldsOutput(&received.message),
        }
    }
}

/// Fields as a JSON object in declared order.
struct FieldsOutput<'a>(&'a Message);

impl Serialize for FieldsOutput<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.fields())
    }
}

#[derive(serde::Serialize)]
struct MalformedOutput<'a> {
    kind: &'static str,
    reason: String,
    reason_kind: &'static str,
    data: &'a [u8],
}

impl<'a> From<&'a MalformedData> for MalformedOutput<'a> {
    fn from(data: &'a MalformedData) -> Self {
        Self {
            kind: "bad_data",
            reason: data.reason.to_string(),
            reason_kind: data.reason.kind(),
            data: data.data.as_ref(),
        }
    }
}
