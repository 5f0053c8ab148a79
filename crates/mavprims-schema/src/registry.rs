use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::MessageDescriptor;
use crate::error::{Result, SchemaError};

/// Id-keyed registry of message descriptors.
///
/// Built once per protocol table and then shared read-only between the
/// codec and any number of parsers.
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    by_id: HashMap<u32, Arc<MessageDescriptor>>,
    by_name: HashMap<String, u32>,
}

impl MessageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a set of descriptors.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = MessageDescriptor>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Add a descriptor. Ids and names must be unique.
    pub fn register(&mut self, descriptor: MessageDescriptor) -> Result<Arc<MessageDescriptor>> {
        let id = descriptor.id();
        if self.by_id.contains_key(&id) {
            return Err(SchemaError::DuplicateMessageId(id));
        }
        if self.by_name.contains_key(descriptor.name()) {
            return Err(SchemaError::DuplicateMessageName(
                descriptor.name().to_string(),
            ));
        }

        debug!(
            id,
            name = descriptor.name(),
            payload_len = descriptor.payload_len(),
            "registered message descriptor"
        );

        let descriptor = Arc::new(descriptor);
        self.by_name.insert(descriptor.name().to_string(), id);
        self.by_id.insert(id, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Look up a descriptor by message id.
    pub fn get(&self, id: u32) -> Option<&Arc<MessageDescriptor>> {
        self.by_id.get(&id)
    }

    /// Look up a descriptor by message name.
    pub fn find(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Check if a message id is registered.
    pub fn contains(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Registered message ids, ascending.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over descriptors in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.by_id.values()
    }
}
