//! Collaborator unit interfaces.
//!
//! The core drives external units it does not implement: the decoder, the
//! arithmetic, divide and floating-point units, the memory unit and the fetch
//! unit. This module fixes their contracts.
//!
//! Clocked units follow the same two-phase protocol:
//! 1. `status()` returns the unit's *registered* outputs, valid for the whole
//!    current cycle. The core reads them while computing its stall and enable
//!    decisions.
//! 2. `clock(&request)` is called exactly once per cycle, after the core has
//!    decided, and advances the unit to the next cycle.

use crate::common::reg::RegId;
use crate::core::arch::mode::Mode;
use crate::core::pipeline::signals::{DecodedInstruction, MemOp};

/// Turns an instruction word into control signals. Pure and unclocked.
pub trait Decoder {
    /// Decodes `word` fetched from `pc` for execution in `mode`.
    ///
    /// For compact bundles `phase` selects the half: `false` for the first half,
    /// `true` for the second.
    fn decode(&self, word: u32, pc: u32, mode: Mode, phase: bool) -> DecodedInstruction;
}

/// Inputs to an ALU, divide or floating-point unit for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecRequest {
    /// Start a new operation this cycle.
    pub start: bool,
    /// Unit-specific opcode.
    pub opcode: u8,
    /// Operand A.
    pub a: u32,
    /// Operand B (register plus immediate, already summed).
    pub b: u32,
    /// Flags of the issuing mode, for operations that consume carry.
    pub flags: u8,
    /// The pipeline was cleared. The unit still reports one completion per accepted
    /// start; the core discards those.
    pub clear: bool,
}

/// Registered outputs of an ALU, divide or floating-point unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecStatus {
    /// An operation is in progress and has not yet reported.
    pub busy: bool,
    /// An operation completes this cycle with `result` and `flags`.
    pub valid: bool,
    /// The completing operation faulted; `result` is meaningless.
    pub error: bool,
    /// Result value.
    pub result: u32,
    /// Flags produced by the operation.
    pub flags: u8,
}

impl ExecStatus {
    /// True if the unit can take a start pulse this cycle.
    pub const fn ready(&self) -> bool {
        !self.busy
    }

    /// True if the unit neither works on nor reports an operation.
    pub const fn idle(&self) -> bool {
        !self.busy && !self.valid
    }
}

/// A clocked execution unit: ALU, divide or floating-point.
///
/// Every accepted start yields exactly one cycle with `valid` set, possibly
/// with `error`.
pub trait ExecUnit {
    /// Registered outputs for this cycle.
    fn status(&self) -> ExecStatus;

    /// Advances one cycle.
    fn clock(&mut self, req: &ExecRequest);
}

/// Inputs to the memory unit for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemRequest {
    /// Start a new bus operation this cycle.
    pub start: bool,
    /// Direction and width; meaningful when `start` is set.
    pub op: Option<MemOp>,
    /// Effective address.
    pub addr: u32,
    /// Store data.
    pub data: u32,
    /// Destination register for loads.
    pub dest: Option<RegId>,
    /// Hold the bus after this operation for the next locked one.
    pub lock: bool,
    /// The pipeline was cleared. Operations already accepted still complete and are
    /// discarded by the core.
    pub clear: bool,
}

/// Registered outputs of the memory unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemStatus {
    /// A start pulse would be accepted this cycle.
    pub ready: bool,
    /// Operations are outstanding.
    pub busy: bool,
    /// An operation completes this cycle.
    pub valid: bool,
    /// The completing operation hit a bus error.
    pub error: bool,
    /// Destination of a completing load.
    pub dest: Option<RegId>,
    /// Loaded data.
    pub data: u32,
    /// Bus address of the completing operation.
    pub addr: u32,
}

impl MemStatus {
    /// True if nothing is outstanding or completing.
    pub const fn idle(&self) -> bool {
        !self.busy && !self.valid
    }
}

/// The data-memory unit (single-operation, pipelined or cached).
///
/// Every accepted start yields exactly one cycle with `valid` set. Stores
/// report completion with `dest == None`.
pub trait MemoryUnit {
    /// Registered outputs for this cycle.
    fn status(&self) -> MemStatus;

    /// Advances one cycle.
    fn clock(&mut self, req: &MemRequest);
}

/// Inputs to the fetch unit for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Discard everything and restart fetching at this address.
    pub redirect: Option<u32>,
    /// The word currently presented was consumed; present the next one.
    pub accept: bool,
    /// Invalidate any instruction cache.
    pub clear_cache: bool,
    /// The data side owns the bus: start no new bus transaction.
    pub bus_lock: bool,
}

/// Registered outputs of the fetch unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchStatus {
    /// `insn` holds a fetched word.
    pub valid: bool,
    /// Instruction word.
    pub insn: u32,
    /// Address of `insn`.
    pub pc: u32,
    /// The fetch failed; the word must be treated as illegal.
    pub illegal: bool,
}

/// The instruction-fetch unit (single, double-buffered or cached).
pub trait FetchUnit {
    /// Registered outputs for this cycle.
    fn status(&self) -> FetchStatus;

    /// Advances one cycle.
    fn clock(&mut self, req: &FetchRequest);
}

/// The set of collaborators a core is built from.
pub struct Units {
    /// Instruction decoder.
    pub decoder: Box<dyn Decoder>,
    /// Fetch unit.
    pub fetch: Box<dyn FetchUnit>,
    /// Arithmetic/logic unit.
    pub alu: Box<dyn ExecUnit>,
    /// Memory unit.
    pub memory: Box<dyn MemoryUnit>,
    /// Optional divide unit.
    pub divide: Option<Box<dyn ExecUnit>>,
    /// Optional floating-point unit.
    pub fpu: Option<Box<dyn ExecUnit>>,
}

impl std::fmt::Debug for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Units")
            .field("divide", &self.divide.is_some())
            .field("fpu", &self.fpu.is_some())
            .finish_non_exhaustive()
    }
}
