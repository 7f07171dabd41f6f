//! Debug/Halt Port.
//!
//! This module defines what an external debugger exchanges with the core. It provides:
//! 1. **Commands:** Register peek, register poke and single step.
//! 2. **Snapshot:** The read-back value together with the stall flag and a condensed
//!    status byte.
//! 3. **Status Byte:** Break, bus error, GIE, sleep, halted and illegal bits packed into
//!    one byte.

use std::fmt;

use crate::common::reg::RegId;
use crate::core::arch::mode::Mode;
use crate::core::arch::state::ArchState;

/// Request presented on the debug port for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugCommand {
    /// Read a register.
    Read(RegId),
    /// Write a register. Only accepted while the core is fully halted.
    Write(RegId, u32),
    /// Run exactly one instruction, then halt again.
    Step,
}

/// Condensed status byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DebugStatus(u8);

impl DebugStatus {
    /// The core is broken (break instruction or fatal supervisor fault).
    pub const BREAK: u8 = 1 << 0;
    /// A bus-error latch is set in either mode.
    pub const BUS_ERROR: u8 = 1 << 1;
    /// The core runs in User mode.
    pub const GIE: u8 = 1 << 2;
    /// The current mode sleeps.
    pub const SLEEP: u8 = 1 << 3;
    /// The core is fully halted.
    pub const HALTED: u8 = 1 << 4;
    /// An illegal-instruction latch is set in either mode.
    pub const ILLEGAL: u8 = 1 << 5;

    /// Builds the status byte from the architectural state.
    pub fn capture(state: &ArchState, halted: bool, broken: bool) -> Self {
        let sup = state.status(Mode::Supervisor);
        let usr = state.status(Mode::User);
        let mut bits = 0;
        let mut put = |bit: u8, on: bool| {
            if on {
                bits |= bit;
            }
        };
        put(Self::BREAK, broken);
        put(
            Self::BUS_ERROR,
            sup.bus_error.is_set() || usr.bus_error.is_set(),
        );
        put(Self::GIE, state.mode().gie());
        put(Self::SLEEP, state.status(state.mode()).sleep);
        put(Self::HALTED, halted);
        put(Self::ILLEGAL, sup.illegal.is_set() || usr.illegal.is_set());
        Self(bits)
    }

    /// Raw byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `mask` is set.
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }
}

impl fmt::Display for DebugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 6] = [
            (DebugStatus::BREAK, "break"),
            (DebugStatus::BUS_ERROR, "buserr"),
            (DebugStatus::GIE, "gie"),
            (DebugStatus::SLEEP, "sleep"),
            (DebugStatus::HALTED, "halted"),
            (DebugStatus::ILLEGAL, "illegal"),
        ];
        let mut first = true;
        for (bit, name) in NAMES {
            if self.0 & bit != 0 {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("-")?;
        }
        Ok(())
    }
}

/// Debug-port response for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugSnapshot {
    /// Register that was read or written.
    pub reg: RegId,
    /// Its value after this cycle's commit.
    pub value: u32,
    /// The core is not advancing: the value is stable.
    pub stalled: bool,
    /// Condensed status.
    pub status: DebugStatus,
}
