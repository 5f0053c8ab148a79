use std::collections::HashSet;

use mavprims_wire::{FieldKind, Slot, MAX_PAYLOAD_LEN};

use crate::error::{Result, SchemaError};

/// Largest id a v2 header can carry.
pub const MAX_MESSAGE_ID: u32 = 0x00FF_FFFF;

/// One declared field of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Zero for scalars.
    pub array_len: usize,
}

impl FieldDef {
    /// A scalar field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            array_len: 0,
        }
    }

    /// A fixed-length array field.
    pub fn array(name: impl Into<String>, kind: FieldKind, array_len: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            array_len,
        }
    }

    pub fn slot(&self) -> Slot {
        Slot::array(self.kind, self.array_len)
    }
}

/// Immutable description of one message type.
///
/// Fields are kept in declared order (the order callers read and write
/// them). `order_map[declared] == wire` gives each field's position in the
/// on-wire layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    id: u32,
    name: String,
    crc_extra: u8,
    fields: Vec<FieldDef>,
    order_map: Vec<usize>,
    wire_to_declared: Vec<usize>,
    wire_slots: Vec<Slot>,
    wire_offsets: Vec<usize>,
    payload_len: usize,
    instance_field: Option<usize>,
}

impl MessageDescriptor {
    /// Build a descriptor from resolved schema data.
    ///
    /// `order_map[i]` is the wire position of declared field `i`.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        crc_extra: u8,
        fields: Vec<FieldDef>,
        order_map: Vec<usize>,
        instance_field: Option<usize>,
    ) -> Result<Self> {
        let name = name.into();
        if id > MAX_MESSAGE_ID {
            return Err(SchemaError::MessageIdOutOfRange(id));
        }
        if name.is_empty() {
            return Err(SchemaError::EmptyMessageName(id));
        }

        {
            let mut seen = HashSet::with_capacity(fields.len());
            for field in &fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        message: name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        let wire_to_declared = invert(&name, &order_map, fields.len())?;

        if let Some(index) = instance_field {
            if index >= fields.len() {
                return Err(SchemaError::InstanceFieldOutOfRange {
                    message: name,
                    index,
                    count: fields.len(),
                });
            }
        }

        let wire_slots: Vec<Slot> = wire_to_declared.iter().map(|&d| fields[d].slot()).collect();
        let mut wire_offsets = Vec::with_capacity(wire_slots.len());
        let mut payload_len = 0usize;
        for slot in &wire_slots {
            wire_offsets.push(payload_len);
            payload_len += slot.wire_size();
        }
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(SchemaError::PayloadTooLong {
                message: name,
                len: payload_len,
            });
        }

        Ok(Self {
            id,
            name,
            crc_extra,
            fields,
            order_map,
            wire_to_declared,
            wire_slots,
            wire_offsets,
            payload_len,
            instance_field,
        })
    }

    /// Start a descriptor whose wire order is derived from the declared fields.
    pub fn builder(id: u32, name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(id, name)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-message checksum salt ("CRC extra").
    pub fn crc_extra(&self) -> u8 {
        self.crc_extra
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared index -> wire index.
    pub fn order_map(&self) -> &[usize] {
        &self.order_map
    }

    /// Wire index -> declared index.
    pub fn inverse_order_map(&self) -> &[usize] {
        &self.wire_to_declared
    }

    /// Slots in wire order.
    pub fn wire_slots(&self) -> &[Slot] {
        &self.wire_slots
    }

    /// Full (untruncated) payload size in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Declared index of the instance field, if any.
    pub fn instance_field(&self) -> Option<usize> {
        self.instance_field
    }

    /// Payload byte offset of the instance field, if any.
    pub fn instance_offset(&self) -> Option<usize> {
        self.instance_field.and_then(|index| self.field_offset(index))
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Payload byte offset of declared field `index`.
    pub fn field_offset(&self, index: usize) -> Option<usize> {
        let wire = *self.order_map.get(index)?;
        self.wire_offsets.get(wire).copied()
    }
}

fn invert(message: &str, order_map: &[usize], count: usize) -> Result<Vec<usize>> {
    let invalid = |reason: String| SchemaError::InvalidOrderMap {
        message: message.to_string(),
        reason,
    };

    if order_map.len() != count {
        return Err(invalid(format!(
            "{} entries for {count} fields",
            order_map.len()
        )));
    }

    let mut inverse = vec![usize::MAX; count];
    for (declared, &wire) in order_map.iter().enumerate() {
        if wire >= count {
            return Err(invalid(format!("wire index {wire} out of range")));
        }
        if inverse[wire] != usize::MAX {
            return Err(invalid(format!("wire index {wire} used twice")));
        }
        inverse[wire] = declared;
    }
    Ok(inverse)
}

/// Incremental descriptor construction.
///
/// Unless an explicit wire order is given, base fields are laid out by
/// element size, largest first, keeping declared order among equal sizes.
/// Extension fields follow the base fields in declared order.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    id: u32,
    name: String,
    crc_extra: u8,
    fields: Vec<FieldDef>,
    extensions_start: Option<usize>,
    wire_order: Option<Vec<usize>>,
    instance: Option<String>,
}

impl DescriptorBuilder {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            crc_extra: 0,
            fields: Vec::new(),
            extensions_start: None,
            wire_order: None,
            instance: None,
        }
    }

    pub fn crc_extra(mut self, crc_extra: u8) -> Self {
        self.crc_extra = crc_extra;
        self
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef::new(name, kind));
        self
    }

    pub fn array(mut self, name: impl Into<String>, kind: FieldKind, len: usize) -> Self {
        self.fields.push(FieldDef::array(name, kind, len));
        self
    }

    /// Fields added after this call are extensions and are never reordered.
    pub fn extensions(mut self) -> Self {
        self.extensions_start.get_or_insert(self.fields.len());
        self
    }

    /// Mark a declared field as the instance field.
    pub fn instance(mut self, name: impl Into<String>) -> Self {
        self.instance = Some(name.into());
        self
    }

    /// Use an explicit permutation: `order_map[declared] == wire`.
    pub fn order_map(mut self, order_map: Vec<usize>) -> Self {
        self.wire_order = Some(order_map);
        self
    }

    pub fn build(self) -> Result<MessageDescriptor> {
        let order_map = match self.wire_order {
            Some(order_map) => order_map,
            None => sorted_order_map(&self.fields, self.extensions_start),
        };

        let instance_field = match self.instance {
            Some(field) => Some(
                self.fields
                    .iter()
                    .position(|f| f.name == field)
                    .ok_or_else(|| SchemaError::UnknownField {
                        message: self.name.clone(),
                        field,
                    })?,
            ),
            None => None,
        };

        MessageDescriptor::new(
            self.id,
            self.name,
            self.crc_extra,
            self.fields,
            order_map,
            instance_field,
        )
    }
}

fn sorted_order_map(fields: &[FieldDef], extensions_start: Option<usize>) -> Vec<usize> {
    let base_len = extensions_start.unwrap_or(fields.len()).min(fields.len());

    let mut wire: Vec<usize> = (0..base_len).collect();
    // Stable, so equal sizes keep declared order.
    wire.sort_by(|&a, &b| fields[b].kind.size().cmp(&fields[a].kind.size()));
    wire.extend(base_len..fields.len());

    let mut order_map = vec![0; fields.len()];
    for (wire_index, &declared) in wire.iter().enumerate() {
        order_map[declared] = wire_index;
    }
    order_map
}
