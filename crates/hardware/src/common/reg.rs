//! Register Identifiers and the General Register File.
//!
//! This module provides the register addressing model of the core. It provides:
//! 1. **Identifiers:** `RegId`, the raw 5-bit id (4-bit number plus a bank bit).
//! 2. **Resolution:** `RegisterRef`, the tagged view that separates general registers from
//!    the PC and CC pseudo-registers of each bank.
//! 3. **Storage:** `RegisterFile`, backing storage for general registers only. PC and CC
//!    values are synthesized by the architectural state, never stored here.

use std::fmt;

use super::constants::{CC_REG_NUM, PC_REG_NUM, REG_ID_COUNT, REG_NUM_MASK, REG_USER_BIT};
use super::error::CoreError;
use crate::core::arch::mode::Mode;

/// Raw 5-bit register identifier: bit 4 selects the user bank, bits 0-3 the register number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RegId(u8);

impl RegId {
    /// Builds an identifier from a raw 5-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRegister`] if `raw` does not fit in five bits.
    pub fn new(raw: u8) -> Result<Self, CoreError> {
        if (raw as usize) < REG_ID_COUNT {
            Ok(Self(raw))
        } else {
            Err(CoreError::InvalidRegister(raw))
        }
    }

    /// Builds the identifier of register `num` in the bank of `mode`. Bits above the
    /// register number are discarded.
    pub const fn of(mode: Mode, num: u8) -> Self {
        let bank = match mode {
            Mode::Supervisor => 0,
            Mode::User => REG_USER_BIT,
        };
        Self(bank | (num & REG_NUM_MASK))
    }

    /// Identifier of the program counter of `mode`.
    pub const fn pc(mode: Mode) -> Self {
        Self::of(mode, PC_REG_NUM)
    }

    /// Identifier of the condition-code register of `mode`.
    pub const fn cc(mode: Mode) -> Self {
        Self::of(mode, CC_REG_NUM)
    }

    /// Raw 5-bit value.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Register number within the bank.
    pub const fn num(self) -> u8 {
        self.0 & REG_NUM_MASK
    }

    /// Bank this identifier addresses.
    pub const fn mode(self) -> Mode {
        if self.0 & REG_USER_BIT != 0 {
            Mode::User
        } else {
            Mode::Supervisor
        }
    }

    /// Re-targets this identifier at the bank of `mode`, keeping the register number.
    pub const fn in_mode(self, mode: Mode) -> Self {
        Self::of(mode, self.num())
    }

    /// True for the PC or CC pseudo-register of either bank.
    pub const fn is_special(self) -> bool {
        self.num() >= CC_REG_NUM
    }

    /// True for the CC pseudo-register of either bank.
    pub const fn is_cc(self) -> bool {
        self.num() == CC_REG_NUM
    }

    /// True for the PC pseudo-register of either bank.
    pub const fn is_pc(self) -> bool {
        self.num() == PC_REG_NUM
    }

    /// Resolves the raw identifier into a tagged reference.
    pub const fn resolve(self) -> RegisterRef {
        let mode = self.mode();
        match self.num() {
            CC_REG_NUM => RegisterRef::ConditionCode(mode),
            PC_REG_NUM => RegisterRef::ProgramCounter(mode),
            n => RegisterRef::General(n, mode),
        }
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.mode() {
            Mode::Supervisor => "s",
            Mode::User => "u",
        };
        match self.num() {
            CC_REG_NUM => write!(f, "{prefix}CC"),
            PC_REG_NUM => write!(f, "{prefix}PC"),
            n => write!(f, "{prefix}R{n}"),
        }
    }
}

/// Tagged view of a register identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterRef {
    /// General register `n` (0..=13) of the given bank.
    General(u8, Mode),
    /// Program counter of the given bank.
    ProgramCounter(Mode),
    /// Condition-code/status register of the given bank.
    ConditionCode(Mode),
}

/// General register storage for both banks.
///
/// Slots 14 and 15 of each bank exist but are never written; the PC and CC live in the
/// architectural state. In the reduced configuration every user id aliases the supervisor
/// bank, which leaves 16 usable slots.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    regs: [u32; REG_ID_COUNT],
    banked: bool,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RegisterFile {
    /// Creates a register file with all registers zero.
    ///
    /// # Arguments
    ///
    /// * `banked` - `false` for the reduced configuration without a user bank.
    pub const fn new(banked: bool) -> Self {
        Self {
            regs: [0; REG_ID_COUNT],
            banked,
        }
    }

    /// Whether user identifiers address their own bank.
    pub const fn is_banked(&self) -> bool {
        self.banked
    }

    /// Maps an identifier onto its storage slot.
    pub const fn slot(&self, id: RegId) -> usize {
        if self.banked {
            id.raw() as usize
        } else {
            id.num() as usize
        }
    }

    /// Reads a general register.
    pub const fn read(&self, id: RegId) -> u32 {
        self.regs[self.slot(id)]
    }

    /// Writes a general register. Writes addressing a PC or CC slot are ignored.
    pub fn write(&mut self, id: RegId, val: u32) {
        if !id.is_special() {
            let slot = self.slot(id);
            self.regs[slot] = val;
        }
    }

    /// Zeroes every register.
    pub fn reset(&mut self) {
        self.regs = [0; REG_ID_COUNT];
    }
}
