//! Decoded control signals and operation types.
//!
//! This module defines what the external decoder hands to the core for every
//! instruction: register operands, immediate, condition, the unit the
//! instruction is destined for, and the marker bits the control logic acts on.

use crate::common::constants::{CC_C, CC_N, CC_V, CC_Z};
use crate::common::reg::RegId;

/// Execution condition evaluated against the flags of the issuing mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Condition {
    /// Always execute.
    #[default]
    Always,
    /// Z set.
    Zero,
    /// Z clear.
    NotZero,
    /// N set.
    Negative,
    /// N clear.
    NotNegative,
    /// Signed greater than: Z clear and N clear.
    GreaterThan,
    /// C set.
    Carry,
    /// V set.
    Overflow,
}

impl Condition {
    /// Evaluates the condition against a 4-bit flags value.
    pub const fn holds(self, flags: u8) -> bool {
        let f = flags as u32;
        match self {
            Self::Always => true,
            Self::Zero => f & CC_Z != 0,
            Self::NotZero => f & CC_Z == 0,
            Self::Negative => f & CC_N != 0,
            Self::NotNegative => f & CC_N == 0,
            Self::GreaterThan => f & (CC_Z | CC_N) == 0,
            Self::Carry => f & CC_C != 0,
            Self::Overflow => f & CC_V != 0,
        }
    }

    /// True if issuing the instruction requires valid flags.
    pub const fn reads_flags(self) -> bool {
        !matches!(self, Self::Always)
    }
}

/// Memory access width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemWidth {
    /// 8-bit access.
    Byte,
    /// 16-bit access.
    Half,
    /// 32-bit access.
    #[default]
    Word,
}

/// Memory operation: direction plus width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOp {
    /// Load into the destination register.
    Load(MemWidth),
    /// Store operand A.
    Store(MemWidth),
}

impl MemOp {
    /// True for loads.
    pub const fn is_load(self) -> bool {
        matches!(self, Self::Load(_))
    }

    /// True if `other` moves data in the same direction.
    pub const fn same_direction(self, other: Self) -> bool {
        self.is_load() == other.is_load()
    }
}

/// Unit an instruction is dispatched to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpClass {
    /// Retires without using any unit.
    #[default]
    Nop,
    /// Arithmetic/logic unit.
    Alu,
    /// Memory unit.
    Memory(MemOp),
    /// Divide unit.
    Divide,
    /// Floating-point unit.
    Fpu,
}

impl OpClass {
    /// True for instructions that use the data bus.
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Memory(_))
    }
}

/// Everything the decoder produces for one instruction (or one half of a compact bundle).
///
/// Register identifiers are bank-qualified by the decoder; the core re-qualifies them to the
/// issuing mode when that mode is User.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Destination register, if the instruction writes one.
    pub dest: Option<RegId>,
    /// Operand A register, if read.
    pub src_a: Option<RegId>,
    /// Operand B register, if read. The effective B operand is `reg[B] + imm`.
    pub src_b: Option<RegId>,
    /// Immediate value; alone it is operand B when `src_b` is `None`.
    pub imm: i32,
    /// Condition under which the instruction executes.
    pub cond: Condition,
    /// Destination unit.
    pub class: OpClass,
    /// Unit-specific opcode, passed through untouched.
    pub opcode: u8,
    /// The instruction writes the flags of its mode.
    pub wr_flags: bool,
    /// Lock prefix: bind the next bus operations together.
    pub lock: bool,
    /// Break instruction.
    pub brk: bool,
    /// Unconditional jump whose target is known at decode.
    pub early_branch: Option<u32>,
    /// The encoding is illegal.
    pub illegal: bool,
    /// The word is a compact bundle of two half instructions.
    pub compact: bool,
    /// Memory op that may stream behind the previous memory op (same direction, same base,
    /// adjacent or identical address).
    pub pipe: bool,
}

impl DecodedInstruction {
    /// True if the immediate is zero.
    pub const fn imm_is_zero(&self) -> bool {
        self.imm == 0
    }

    /// True if the instruction writes a general register or a special register.
    pub const fn writes_reg(&self) -> bool {
        self.dest.is_some()
    }

    /// True if the instruction writes a PC or CC pseudo-register.
    pub fn writes_special(&self) -> bool {
        self.dest.is_some_and(RegId::is_special)
    }

    /// True if the instruction reads a PC or CC pseudo-register.
    pub fn reads_special(&self) -> bool {
        self.src_a.is_some_and(RegId::is_special) || self.src_b.is_some_and(RegId::is_special)
    }

    /// True if the instruction modifies flags, directly or through the CC register.
    pub fn modifies_flags(&self) -> bool {
        self.wr_flags || self.dest.is_some_and(RegId::is_cc)
    }

    /// An instruction that can never issue to a unit.
    pub const fn illegal() -> Self {
        Self {
            dest: None,
            src_a: None,
            src_b: None,
            imm: 0,
            cond: Condition::Always,
            class: OpClass::Nop,
            opcode: 0,
            wr_flags: false,
            lock: false,
            brk: false,
            early_branch: None,
            illegal: true,
            compact: false,
            pipe: false,
        }
    }
}
