//! Condition Codes and Per-Mode Status.
//!
//! This module holds the contents of the CC pseudo-register of one bank. It provides:
//! 1. **Sticky Flags:** Fault latches with write-one-to-clear acknowledgement.
//! 2. **Status Word:** Arithmetic flags plus sleep/step/break bits and the fault latches.
//! 3. **CC Encoding:** Synthesis of the 32-bit CC value and decoding of CC writes, with
//!    different rules for writes from the owning mode and writes from outside it.

use crate::common::constants::{
    CC_BREAK, CC_BUSERR, CC_DIVERR, CC_FLAGS_MASK, CC_FPUERR, CC_GIE, CC_ILL, CC_PHASE, CC_SLEEP,
    CC_STEP, CC_TRAP,
};
use crate::common::error::Fault;
use crate::core::arch::mode::Mode;

/// A fault latch that only an outside writer can clear.
///
/// The latch is set by hardware. A writer acknowledges it by writing back the bit exactly as
/// it read it: echoing a `1` clears the latch, while a `0` leaves it untouched, so a writer
/// that never observed the latch set cannot clear it by accident.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StickyFlag(bool);

impl StickyFlag {
    /// Latches the flag.
    pub fn set(&mut self) {
        self.0 = true;
    }

    /// Current value.
    pub const fn is_set(self) -> bool {
        self.0
    }

    /// Applies an acknowledgement write of `writer_value`.
    pub fn clear_if_written_same_value(&mut self, writer_value: bool) {
        if self.0 && writer_value {
            self.0 = false;
        }
    }

    /// Unconditional clear (reset, or implicit clear on return to user mode).
    pub fn reset(&mut self) {
        self.0 = false;
    }
}

/// Who is writing a CC register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CcWriter {
    /// An instruction running in the mode that owns the CC.
    OwnMode,
    /// An instruction running in the other mode.
    OtherMode,
    /// The debug port.
    Debug,
}

/// Contents of one bank's CC register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeStatus {
    /// Z, C, N and V (bits 0..3).
    pub flags: u8,
    /// Waiting for an interrupt.
    pub sleep: bool,
    /// User bank: return to supervisor after one instruction.
    pub step: bool,
    /// Supervisor bank: breaks halt the core instead of trapping.
    pub break_enable: bool,
    /// User bank: the last switch to supervisor was caused by a break.
    pub user_break: StickyFlag,
    /// User bank: the last switch to supervisor was a voluntary trap.
    pub trap: StickyFlag,
    /// Illegal-instruction latch.
    pub illegal: StickyFlag,
    /// Bus-error latch.
    pub bus_error: StickyFlag,
    /// Divide-error latch.
    pub div_error: StickyFlag,
    /// Floating-point-error latch.
    pub fpu_error: StickyFlag,
    /// Execution stopped between the halves of a compact bundle.
    pub phase: bool,
}

impl ModeStatus {
    /// Latch for a given fault class.
    pub fn fault_latch(&mut self, fault: Fault) -> &mut StickyFlag {
        match fault {
            Fault::IllegalInstruction => &mut self.illegal,
            Fault::BusError => &mut self.bus_error,
            Fault::DivideByZero => &mut self.div_error,
            Fault::FloatingPointError => &mut self.fpu_error,
        }
    }

    /// True if any fault latch is set.
    pub const fn any_fault(&self) -> bool {
        self.illegal.is_set()
            || self.bus_error.is_set()
            || self.div_error.is_set()
            || self.fpu_error.is_set()
    }

    /// Synthesizes the 32-bit CC value as seen by a reader.
    pub fn to_word(&self, mode: Mode) -> u32 {
        let mut word = u32::from(self.flags) & CC_FLAGS_MASK;
        let mut put = |bit: u32, on: bool| {
            if on {
                word |= bit;
            }
        };
        put(CC_SLEEP, self.sleep);
        put(CC_GIE, mode.gie());
        match mode {
            Mode::User => {
                put(CC_STEP, self.step);
                put(CC_BREAK, self.user_break.is_set());
                put(CC_TRAP, self.trap.is_set());
            }
            Mode::Supervisor => put(CC_BREAK, self.break_enable),
        }
        put(CC_ILL, self.illegal.is_set());
        put(CC_BUSERR, self.bus_error.is_set());
        put(CC_DIVERR, self.div_error.is_set());
        put(CC_FPUERR, self.fpu_error.is_set());
        put(CC_PHASE, self.phase);
        word
    }

    /// Applies a write of `value` to the CC register of `mode`.
    ///
    /// Flags and sleep are always taken from the written value. Start/stop bits (step,
    /// break-enable) are only writable from supervisor code or the debug port. Fault and
    /// trap latches ignore the owning mode and are acknowledged by outside writers.
    ///
    /// The GIE bit is not stored; the caller interprets it for mode switching.
    pub fn apply_write(&mut self, mode: Mode, value: u32, writer: CcWriter) {
        self.flags = (value & CC_FLAGS_MASK) as u8;
        self.sleep = value & CC_SLEEP != 0;

        let privileged = writer != CcWriter::OwnMode || mode == Mode::Supervisor;
        if privileged {
            match mode {
                Mode::User => self.step = value & CC_STEP != 0,
                Mode::Supervisor => self.break_enable = value & CC_BREAK != 0,
            }
        }

        if writer != CcWriter::OwnMode {
            let echo = |bit: u32| value & bit != 0;
            self.illegal.clear_if_written_same_value(echo(CC_ILL));
            self.bus_error.clear_if_written_same_value(echo(CC_BUSERR));
            self.div_error.clear_if_written_same_value(echo(CC_DIVERR));
            self.fpu_error.clear_if_written_same_value(echo(CC_FPUERR));
            if mode == Mode::User {
                self.trap.clear_if_written_same_value(echo(CC_TRAP));
                self.user_break.clear_if_written_same_value(echo(CC_BREAK));
            }
            self.phase = value & CC_PHASE != 0;
        }
    }
}
