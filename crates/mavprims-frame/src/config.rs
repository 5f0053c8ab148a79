use mavprims_wire::ProtocolVersion;

/// Default receive buffer capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Default size of a single blocking read.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Configuration for one logical link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Wire protocol version. Fixed for the lifetime of the link.
    pub version: ProtocolVersion,
    /// Source system id stamped on outgoing frames.
    pub system_id: u8,
    /// Source component id stamped on outgoing frames.
    pub component_id: u8,
    /// Initial receive buffer capacity.
    pub initial_buffer_capacity: usize,
    /// Bytes requested per read by [`MessageReader`](crate::MessageReader).
    pub read_chunk_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::V2,
            system_id: 0,
            component_id: 0,
            initial_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK,
        }
    }
}

impl LinkConfig {
    /// Default configuration for `version`.
    pub fn for_version(version: ProtocolVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Set the source identity stamped on outgoing frames.
    pub fn with_source(mut self, system_id: u8, component_id: u8) -> Self {
        self.system_id = system_id;
        self.component_id = component_id;
        self
    }
}
