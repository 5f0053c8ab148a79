//! X.25 running checksum (CRC-16/MCRF4XX).
//!
//! Every frame is checksummed twice: once over the header minus its marker
//! byte followed by the payload, then once more over the single salt byte
//! of the message. The final state is what goes on the wire.

/// Initial state of a fresh checksum.
pub const CHECKSUM_SEED: u16 = 0xFFFF;

/// Incremental 16-bit checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    state: u16,
}

impl Checksum {
    /// Start a new checksum at [`CHECKSUM_SEED`].
    pub const fn new() -> Self {
        Self {
            state: CHECKSUM_SEED,
        }
    }

    /// Resume from a previously computed state.
    pub const fn from_state(state: u16) -> Self {
        Self { state }
    }

    /// Fold one byte into the state.
    pub fn accumulate(&mut self, byte: u8) {
        let tmp = byte ^ (self.state & 0xFF) as u8;
        let tmp = u16::from(tmp ^ (tmp << 4));
        self.state = (self.state >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4);
    }

    /// Fold a byte sequence into the state.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.accumulate(byte);
        }
    }

    /// Current checksum value.
    pub const fn value(&self) -> u16 {
        self.state
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum of `bytes` starting from the seed.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut crc = Checksum::new();
    crc.update(bytes);
    crc.value()
}

/// Frame checksum: `bytes` followed by the message's salt byte.
///
/// `bytes` is the header without its marker, followed by the payload.
pub fn salted_checksum(bytes: &[u8], salt: u8) -> u16 {
    let mut crc = Checksum::new();
    crc.update(bytes);
    crc.accumulate(salt);
    crc.value()
}
