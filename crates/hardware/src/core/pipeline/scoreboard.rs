//! Tag-based scoreboard for register dependency tracking.
//!
//! Maps each register identifier to the sequence number of its latest
//! in-flight producer, or `None` if the value is in the architectural
//! register file. The decode stage does a single lookup per operand instead
//! of scanning every unit queue.

use crate::common::constants::REG_ID_COUNT;
use crate::common::reg::RegId;

/// Tag-based scoreboard: register id to the sequence number of its latest
/// issued-but-uncommitted producer.
#[derive(Clone, Debug)]
pub struct Scoreboard {
    producers: [Option<u64>; REG_ID_COUNT],
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    /// Create a new scoreboard with all registers clear (no pending writers).
    pub const fn new() -> Self {
        Self {
            producers: [None; REG_ID_COUNT],
        }
    }

    /// Mark a register as having a pending writer with the given sequence number.
    pub fn set_producer(&mut self, reg: RegId, seq: u64) {
        self.producers[reg.raw() as usize] = Some(seq);
    }

    /// Sequence number of the latest pending writer for a register.
    pub const fn get_producer(&self, reg: RegId) -> Option<u64> {
        self.producers[reg.raw() as usize]
    }

    /// True if some issued instruction will still write `reg`.
    pub const fn is_pending(&self, reg: RegId) -> bool {
        self.get_producer(reg).is_some()
    }

    /// Clear a register's pending writer, but ONLY if the current tag matches.
    /// A stale instruction draining after a pipeline clear must not release a
    /// claim made by a newer one.
    pub fn clear_if_match(&mut self, reg: RegId, seq: u64) {
        let slot = &mut self.producers[reg.raw() as usize];
        if *slot == Some(seq) {
            *slot = None;
        }
    }

    /// Flush: clear all entries (every in-flight result is about to be discarded).
    pub fn flush(&mut self) {
        self.producers = [None; REG_ID_COUNT];
    }

    /// Number of registers with a pending writer.
    pub fn pending_count(&self) -> usize {
        self.producers.iter().filter(|p| p.is_some()).count()
    }
}
