//! Pipeline latch structures for inter-stage communication.
//!
//! This module defines the stage records carried through the five-stage pipeline:
//! Fetch output → Decode → Operand read → Execute → Writeback.
//!
//! 1. **Stage Records:** A generic `{valid, phase, payload}` latch used by the decode and
//!    operand-read stages.
//! 2. **Execute Tracking:** Per-unit queues of issued instructions awaiting their result,
//!    tagged with the pipeline-clear epoch they were issued in.
//! 3. **Fault Propagation:** Illegal and break markers travel with the instruction until
//!    writeback converts them into architectural effects.

use std::collections::VecDeque;

use crate::common::constants::INSTRUCTION_SIZE;
use crate::common::reg::RegId;
use crate::core::arch::mode::Mode;
use crate::core::pipeline::sequencer::next_valid;
use crate::core::pipeline::signals::{DecodedInstruction, MemOp};
use crate::core::pipeline::traits::PipelineLatch;

/// One pipeline stage register.
#[derive(Clone, Debug, Default)]
pub struct StageLatch<T> {
    /// Holds a genuine, not-yet-retired instruction.
    pub valid: bool,
    /// The instruction is the second half of a compact bundle.
    pub phase: bool,
    /// Stage-specific fields.
    pub payload: T,
}

impl<T> StageLatch<T> {
    /// Latches the payload of an instruction the stage captures this cycle. `valid` follows
    /// in [`StageLatch::update`].
    pub fn capture(&mut self, payload: T, phase: bool) {
        self.payload = payload;
        self.phase = phase;
    }

    /// Applies the end-of-cycle `valid` rule of the stage sequencer.
    ///
    /// # Arguments
    ///
    /// * `clear` - The stage contents are discarded.
    /// * `enable` - The stage captured an instruction this cycle.
    /// * `downstream_enable` - The next stage took this stage's instruction.
    pub fn update(&mut self, clear: bool, enable: bool, downstream_enable: bool) {
        self.valid = next_valid(self.valid, clear, enable, downstream_enable);
    }

    /// Payload if the stage is valid.
    pub const fn get(&self) -> Option<&T> {
        if self.valid { Some(&self.payload) } else { None }
    }
}

impl<T> PipelineLatch for StageLatch<T> {
    fn flush(&mut self) {
        self.valid = false;
        self.phase = false;
    }

    fn is_empty(&self) -> bool {
        !self.valid
    }
}

/// Decode-stage payload: the fetched word and its decoded signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeEntry {
    /// Raw instruction word.
    pub word: u32,
    /// Address of the word.
    pub pc: u32,
    /// Mode the word was decoded for.
    pub mode: Mode,
    /// Decoder output for the half selected by the latch phase.
    pub decoded: DecodedInstruction,
}

impl DecodeEntry {
    /// True if this is the first half of a bundle whose second half still has to decode.
    pub const fn opens_bundle(&self, phase: bool) -> bool {
        self.decoded.compact && !phase
    }

    /// Address of the instruction that follows this one in program order.
    pub const fn next_pc(&self, phase: bool) -> u32 {
        if self.opens_bundle(phase) {
            self.pc
        } else {
            self.pc.wrapping_add(INSTRUCTION_SIZE)
        }
    }
}

/// Operand-read-stage payload: the instruction with its operands read.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperandEntry {
    /// Program-order sequence number.
    pub seq: u64,
    /// Address of the instruction.
    pub pc: u32,
    /// Address of the next instruction in program order.
    pub next_pc: u32,
    /// Mode the instruction executes in; frozen from here to retirement.
    pub mode: Mode,
    /// Decoded signals (register ids already qualified to `mode`).
    pub decoded: DecodedInstruction,
    /// Operand A value.
    pub a: u32,
    /// Operand B value: register (if any) plus immediate.
    pub b: u32,
    /// The instruction cannot issue and must fault at writeback.
    pub op_illegal: bool,
}

impl OperandEntry {
    /// True if the instruction never uses a unit.
    pub const fn is_non_issuable(&self) -> bool {
        self.op_illegal || self.decoded.brk
    }
}

/// Execution unit an instruction was dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecKind {
    /// Arithmetic/logic unit.
    Alu,
    /// Memory unit.
    Memory,
    /// Divide unit.
    Divide,
    /// Floating-point unit.
    Fpu,
}

impl ExecKind {
    /// All unit kinds in writeback priority order (after the debug port).
    pub const PRIORITY: [Self; 4] = [Self::Memory, Self::Alu, Self::Divide, Self::Fpu];

    /// Human-readable unit name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alu => "ALU",
            Self::Memory => "memory",
            Self::Divide => "divide",
            Self::Fpu => "FPU",
        }
    }
}

/// Metadata of an instruction that has been handed to a unit and not yet retired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InFlight {
    /// Program-order sequence number.
    pub seq: u64,
    /// Address of the instruction.
    pub pc: u32,
    /// Address of the next instruction in program order.
    pub next_pc: u32,
    /// Mode the instruction executes in.
    pub mode: Mode,
    /// Destination register.
    pub dest: Option<RegId>,
    /// Writes the flags of `mode`.
    pub wr_flags: bool,
    /// Direction and width, for memory operations.
    pub mem_op: Option<MemOp>,
    /// Second half of a compact bundle.
    pub phase: bool,
    /// Opens a compact bundle (first half).
    pub opens_bundle: bool,
    /// Pipeline-clear epoch at issue; results from an older epoch are discarded.
    pub epoch: u64,
}

/// Execute stage: the in-flight queue of every unit, in issue order.
#[derive(Clone, Debug, Default)]
pub struct ExecuteStage {
    alu: VecDeque<InFlight>,
    memory: VecDeque<InFlight>,
    divide: VecDeque<InFlight>,
    fpu: VecDeque<InFlight>,
}

impl ExecuteStage {
    const fn queue(&self, kind: ExecKind) -> &VecDeque<InFlight> {
        match kind {
            ExecKind::Alu => &self.alu,
            ExecKind::Memory => &self.memory,
            ExecKind::Divide => &self.divide,
            ExecKind::Fpu => &self.fpu,
        }
    }

    fn queue_mut(&mut self, kind: ExecKind) -> &mut VecDeque<InFlight> {
        match kind {
            ExecKind::Alu => &mut self.alu,
            ExecKind::Memory => &mut self.memory,
            ExecKind::Divide => &mut self.divide,
            ExecKind::Fpu => &mut self.fpu,
        }
    }

    /// Records an instruction dispatched to `kind`.
    pub fn issue(&mut self, kind: ExecKind, entry: InFlight) {
        self.queue_mut(kind).push_back(entry);
    }

    /// Removes the oldest instruction of `kind`, which is completing this cycle.
    pub fn complete(&mut self, kind: ExecKind) -> Option<InFlight> {
        self.queue_mut(kind).pop_front()
    }

    /// Oldest instruction of `kind`, which completes next.
    pub fn head(&self, kind: ExecKind) -> Option<&InFlight> {
        self.queue(kind).front()
    }

    /// Number of instructions outstanding in `kind`.
    pub fn outstanding(&self, kind: ExecKind) -> usize {
        self.queue(kind).len()
    }

    /// In-flight instructions of `kind`, oldest first.
    pub fn entries(&self, kind: ExecKind) -> impl Iterator<Item = &InFlight> {
        self.queue(kind).iter()
    }

    /// Every in-flight instruction.
    pub fn iter(&self) -> impl Iterator<Item = &InFlight> {
        self.alu
            .iter()
            .chain(self.memory.iter())
            .chain(self.divide.iter())
            .chain(self.fpu.iter())
    }

    /// In-flight instructions of the given epoch.
    pub fn live(&self, epoch: u64) -> impl Iterator<Item = &InFlight> {
        self.iter().filter(move |e| e.epoch == epoch)
    }
}

impl PipelineLatch for ExecuteStage {
    /// Entries are kept so the units' pending results can still be matched and
    /// discarded; the epoch tag already marks them dead.
    fn flush(&mut self) {}

    fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
