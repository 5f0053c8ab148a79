use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::LinkConfig;

/// Monotonic link counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub receive_errors: u64,
}

/// Per-link state: outgoing sequence, source identity and counters.
///
/// Owned by exactly one parser or writer. The codec only reads it; the
/// owner advances it after a frame is actually sent or received.
#[derive(Debug, Clone)]
pub struct Session {
    sequence: u8,
    system_id: u8,
    component_id: u8,
    stats: LinkStats,
    started: Instant,
}

impl Session {
    pub fn new(system_id: u8, component_id: u8) -> Self {
        Self {
            sequence: 0,
            system_id,
            component_id,
            stats: LinkStats::default(),
            started: Instant::now(),
        }
    }

    pub fn from_config(config: &LinkConfig) -> Self {
        Self::new(config.system_id, config.component_id)
    }

    /// Sequence number for the next outgoing frame.
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: u8) {
        self.sequence = sequence;
    }

    pub fn system_id(&self) -> u8 {
        self.system_id
    }

    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Time since the session was created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Account for one sent frame and advance the sequence (mod 256).
    pub fn record_sent(&mut self, frame_len: usize) {
        self.sequence = self.sequence.wrapping_add(1);
        self.stats.packets_sent = self.stats.packets_sent.saturating_add(1);
        self.stats.bytes_sent = self.stats.bytes_sent.saturating_add(frame_len as u64);
    }

    pub(crate) fn record_bytes_received(&mut self, len: usize) {
        self.stats.bytes_received = self.stats.bytes_received.saturating_add(len as u64);
    }

    pub(crate) fn record_packet_received(&mut self) {
        self.stats.packets_received = self.stats.packets_received.saturating_add(1);
    }

    pub(crate) fn record_receive_error(&mut self) {
        self.stats.receive_errors = self.stats.receive_errors.saturating_add(1);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
