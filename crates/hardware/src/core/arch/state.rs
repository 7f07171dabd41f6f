//! Architectural State.
//!
//! This module groups every piece of state that is visible to software. It provides:
//! 1. **Ownership:** One owned struct holding the register file, the per-mode PCs and CC
//!    contents, and the current mode.
//! 2. **Synthesized Reads:** PC and CC reads are built on the fly from dedicated state.
//! 3. **Single Writer:** Mutation is crate-private; only the writeback arbiter and the
//!    mode controller (acting on arbiter commits) change this state.

use crate::common::error::FaultRecord;
use crate::common::reg::{RegId, RegisterFile, RegisterRef};
use crate::core::arch::mode::Mode;
use crate::core::arch::status::ModeStatus;

/// Software-visible state of the core.
#[derive(Clone, Debug)]
pub struct ArchState {
    pub(crate) regs: RegisterFile,
    pub(crate) pc: [u32; 2],
    pub(crate) status: [ModeStatus; 2],
    pub(crate) mode: Mode,
    pub(crate) last_fault: Option<FaultRecord>,
}

impl ArchState {
    /// Creates the reset state: supervisor mode, supervisor PC at `reset_address`.
    pub fn new(reset_address: u32, banked: bool) -> Self {
        Self {
            regs: RegisterFile::new(banked),
            pc: [reset_address, 0],
            status: [ModeStatus::default(); 2],
            mode: Mode::Supervisor,
            last_fault: None,
        }
    }

    /// Current privilege mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Program counter of `mode`: address of the next instruction that mode will execute.
    pub const fn pc(&self, mode: Mode) -> u32 {
        self.pc[mode.index()]
    }

    /// CC contents of `mode`.
    pub const fn status(&self, mode: Mode) -> &ModeStatus {
        &self.status[mode.index()]
    }

    /// Most recent fault, if any.
    pub const fn last_fault(&self) -> Option<FaultRecord> {
        self.last_fault
    }

    /// Whether the user bank exists.
    pub const fn is_banked(&self) -> bool {
        self.regs.is_banked()
    }

    /// Maps an identifier onto the bank that actually backs it.
    pub const fn canonical(&self, id: RegId) -> RegId {
        if self.regs.is_banked() {
            id
        } else {
            id.in_mode(Mode::Supervisor)
        }
    }

    /// Reads any register, synthesizing PC and CC values.
    pub fn read(&self, id: RegId) -> u32 {
        match self.canonical(id).resolve() {
            RegisterRef::General(..) => self.regs.read(id),
            RegisterRef::ProgramCounter(mode) => self.pc(mode),
            RegisterRef::ConditionCode(mode) => self.status(mode).to_word(mode),
        }
    }

    /// Arithmetic flags of `mode`.
    pub const fn flags(&self, mode: Mode) -> u8 {
        self.status[mode.index()].flags
    }

    pub(crate) fn status_mut(&mut self, mode: Mode) -> &mut ModeStatus {
        &mut self.status[mode.index()]
    }

    pub(crate) fn set_pc(&mut self, mode: Mode, pc: u32) {
        self.pc[mode.index()] = pc;
    }
}
