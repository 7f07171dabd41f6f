//! Data Hazard Detection and Forwarding.
//!
//! This module implements the logic for maintaining pipeline consistency when data
//! dependencies exist between instructions. It provides:
//! 1. **Decode Hazards:** Blocks an instruction from reading operands that an older,
//!    uncommitted instruction will still produce.
//! 2. **Issue Hazards:** Blocks an operand-read instruction from reaching its unit while the
//!    unit is busy or the instruction must be serialized.
//! 3. **Operand Forwarding:** Takes an operand from the writeback arbiter's commit of the
//!    current cycle instead of the register file.

use std::fmt;

use crate::common::reg::RegId;
use crate::core::arch::state::ArchState;
use crate::core::pipeline::latches::OperandEntry;
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::pipeline::signals::{DecodedInstruction, MemOp, OpClass};

/// Why a stage refused to advance this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StallCause {
    /// A PC/CC operand while flag or special-register writers are in flight.
    Special,
    /// An operand or the destination has an uncommitted producer.
    Operand,
    /// Operand B with an immediate cannot take the forwarded value.
    ImmediateB,
    /// The destination unit cannot accept a new operation.
    UnitBusy,
    /// Flags are not yet valid for a conditional instruction, or a flag writer would
    /// overtake an older one.
    Flags,
    /// The instruction must execute alone: special-register writer, illegal or break.
    Serialize,
    /// In-flight work drains before a pending mode switch or cache clear.
    Drain,
    /// Single-step budget exhausted.
    Step,
}

impl fmt::Display for StallCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Special => "special",
            Self::Operand => "operand",
            Self::ImmediateB => "immediate-b",
            Self::UnitBusy => "unit-busy",
            Self::Flags => "flags",
            Self::Serialize => "serialize",
            Self::Drain => "drain",
            Self::Step => "step",
        };
        f.write_str(name)
    }
}

/// The register value the writeback arbiter commits this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Forward {
    /// Register being written.
    pub reg: RegId,
    /// Value being written.
    pub value: u32,
    /// Memory operation of the producing instruction, if it came from the memory unit.
    pub mem_op: Option<MemOp>,
}

/// What the decode stage can see of the instructions ahead of it.
#[derive(Clone, Copy, Debug)]
pub struct DecodeView<'a> {
    /// Instruction waiting in the operand latch, not yet issued.
    pub operand: Option<&'a OperandEntry>,
    /// Producers issued to a unit and not yet committed.
    pub scoreboard: &'a Scoreboard,
    /// This cycle's register commit.
    pub forward: Option<Forward>,
    /// Some instruction ahead may still change flags or a special register.
    pub cc_invalid: bool,
}

/// Decode-stage hazard for `d`, or `None` if it may move to operand read this cycle.
///
/// # Arguments
///
/// * `d` - Decoded instruction with register ids qualified to its mode.
/// * `view` - State of the instructions ahead.
///
/// # Returns
///
/// The first blocking cause found, checked in the order special, operand, immediate-B.
pub fn decode_hazard(d: &DecodedInstruction, view: &DecodeView<'_>) -> Option<StallCause> {
    if d.reads_special() && view.cc_invalid {
        return Some(StallCause::Special);
    }

    let waiting_in_operand = |reg: RegId| {
        view.operand.is_some_and(|o| o.decoded.dest == Some(reg))
    };
    let blocked = |reg: RegId| waiting_in_operand(reg) || view.scoreboard.is_pending(reg);

    if [d.src_a, d.src_b, d.dest].into_iter().flatten().any(blocked) {
        return Some(StallCause::Operand);
    }

    if let (Some(b), Some(fwd)) = (d.src_b, view.forward) {
        if fwd.reg == b && !d.imm_is_zero() && !is_memory_pipe_pair(d, fwd.mem_op) {
            return Some(StallCause::ImmediateB);
        }
    }

    None
}

/// True if `d` may stream behind the memory operation that produced its base register.
fn is_memory_pipe_pair(d: &DecodedInstruction, producer: Option<MemOp>) -> bool {
    match (d.class, producer) {
        (OpClass::Memory(op), Some(prev)) => d.pipe && op.same_direction(prev),
        _ => false,
    }
}

/// What the issue stage can see of the units and the control state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IssueView {
    /// The unit the instruction is destined for can start this cycle. True for instructions
    /// that use no unit.
    pub unit_ready: bool,
    /// No instruction is executing or waiting in the writeback arbiter.
    pub units_idle: bool,
    /// A PC/CC writer is in flight.
    pub special_in_flight: bool,
    /// A flag writer of the instruction's mode is in flight.
    pub flags_in_flight: bool,
    /// A flag writer is in flight in a unit other than the instruction's destination.
    pub flags_in_other_unit: bool,
    /// The pipeline must drain: a user-mode interrupt is pending outside a compact bundle,
    /// or an instruction-cache clear waits for the units to go idle.
    pub drain: bool,
    /// A single-step budget is exhausted.
    pub step_blocked: bool,
}

/// Issue-stage hazard for `o`, or `None` if it may leave the operand latch this cycle.
pub fn issue_hazard(o: &OperandEntry, view: &IssueView) -> Option<StallCause> {
    if view.drain {
        return Some(StallCause::Drain);
    }
    if view.step_blocked {
        return Some(StallCause::Step);
    }
    if view.special_in_flight {
        return Some(StallCause::Serialize);
    }
    if (o.is_non_issuable() || o.decoded.writes_special()) && !view.units_idle {
        return Some(StallCause::Serialize);
    }
    if o.decoded.cond.reads_flags() && view.flags_in_flight {
        return Some(StallCause::Flags);
    }
    if o.decoded.wr_flags && view.flags_in_other_unit {
        return Some(StallCause::Flags);
    }
    if !view.unit_ready {
        return Some(StallCause::UnitBusy);
    }
    None
}

/// Reads an operand register, taking this cycle's commit in preference to the register file.
///
/// # Arguments
///
/// * `state` - Architectural state (register file plus synthesized PC/CC).
/// * `reg` - Operand register.
/// * `forward` - This cycle's commit, if any.
pub fn read_operand(state: &ArchState, reg: RegId, forward: Option<Forward>) -> u32 {
    match forward {
        Some(fwd) if state.canonical(fwd.reg) == state.canonical(reg) => fwd.value,
        _ => state.read(reg),
    }
}
