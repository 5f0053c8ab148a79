use std::sync::Arc;

use mavprims_schema::MessageDescriptor;
use mavprims_wire::{Header, Value, WireError};

use crate::error::{FrameError, Result};

/// A typed message: a descriptor plus one value per declared field.
///
/// Values are stored in declared order and addressed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    descriptor: Arc<MessageDescriptor>,
    values: Vec<Value>,
}

impl Message {
    /// A message with every field zeroed.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        let values = descriptor
            .fields()
            .iter()
            .map(|field| field.slot().zero_value())
            .collect();
        Self { descriptor, values }
    }

    /// A message from values in declared order.
    pub fn from_values(descriptor: Arc<MessageDescriptor>, values: Vec<Value>) -> Result<Self> {
        let fields = descriptor.fields();
        if fields.len() != values.len() {
            return Err(WireError::FieldCount {
                expected: fields.len(),
                actual: values.len(),
            }
            .into());
        }
        for (index, (field, value)) in fields.iter().zip(&values).enumerate() {
            if !value.matches(&field.slot()) {
                return Err(WireError::ValueMismatch {
                    index,
                    expected: field.slot(),
                }
                .into());
            }
        }
        Ok(Self { descriptor, values })
    }

    /// Decoded values are already in layout order and shape.
    pub(crate) fn from_decoded(descriptor: Arc<MessageDescriptor>, values: Vec<Value>) -> Self {
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn id(&self) -> u32 {
        self.descriptor.id()
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Values in declared order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// `(name, value)` pairs in declared order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.descriptor
            .fields()
            .iter()
            .map(|field| field.name.as_str())
            .zip(&self.values)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.descriptor.field_index(name)?;
        self.values.get(index)
    }

    /// Replace a field value. The value must match the field's kind and length.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .descriptor
            .field_index(name)
            .ok_or_else(|| FrameError::UnknownField {
                message: self.descriptor.name().to_string(),
                field: name.to_string(),
            })?;
        let slot = self.descriptor.fields()[index].slot();
        let value = value.into();
        if !value.matches(&slot) {
            return Err(WireError::ValueMismatch {
                index,
                expected: slot,
            }
            .into());
        }
        self.values[index] = value;
        Ok(())
    }

    /// Chainable [`set`](Self::set).
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Value of the instance field, if the message has one.
    pub fn instance(&self) -> Option<&Value> {
        self.values.get(self.descriptor.instance_field()?)
    }
}

/// A message taken off the wire, with the frame context it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub header: Header,
    pub message: Message,
    /// Checksum as received.
    pub checksum: u16,
}

impl ReceivedMessage {
    pub fn sequence(&self) -> u8 {
        self.header.sequence
    }

    pub fn system_id(&self) -> u8 {
        self.header.system_id
    }

    pub fn component_id(&self) -> u8 {
        self.header.component_id
    }
}
