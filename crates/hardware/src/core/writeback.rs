//! Writeback Arbiter.
//!
//! This module implements the single writer of the architectural state. It performs
//! the following:
//! 1. **Arbitration:** Completed results wait in per-source queues; exactly one commit is
//!    selected per cycle, with priority debug > memory > ALU > divide > FPU > unit-less
//!    retirement.
//! 2. **Commit:** Writes the register file, the per-mode PC and CC, and the flags of the
//!    instruction's mode; advances the per-mode PC in program order.
//! 3. **Faults and Breaks:** Latches faults into the status of the faulting mode and records
//!    the faulting address.
//! 4. **Discard:** Drops results tagged with a pipeline-clear epoch older than the current one.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::common::constants::CC_FLAGS_MASK;
use crate::common::error::{Fault, FaultRecord};
use crate::common::reg::{RegId, RegisterRef};
use crate::core::arch::state::ArchState;
use crate::core::arch::status::CcWriter;
use crate::core::control::interrupt::CcWrite;
use crate::core::pipeline::hazards::Forward;
use crate::core::pipeline::latches::{ExecKind, InFlight};

/// Where a completion came from, in commit priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// Memory unit.
    Memory = 0,
    /// Arithmetic/logic unit.
    Alu = 1,
    /// Divide unit.
    Divide = 2,
    /// Floating-point unit.
    Fpu = 3,
    /// Instruction that used no unit: no-op, false condition, illegal or break.
    Retire = 4,
}

impl Source {
    const COUNT: usize = 5;
    const PRIORITY: [Self; Self::COUNT] = [
        Self::Memory,
        Self::Alu,
        Self::Divide,
        Self::Fpu,
        Self::Retire,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

impl From<ExecKind> for Source {
    fn from(kind: ExecKind) -> Self {
        match kind {
            ExecKind::Alu => Self::Alu,
            ExecKind::Memory => Self::Memory,
            ExecKind::Divide => Self::Divide,
            ExecKind::Fpu => Self::Fpu,
        }
    }
}

/// What an instruction produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A value for the destination and, for flag writers, new flags.
    Value {
        /// Result value.
        value: u32,
        /// Flags produced by the unit.
        flags: u8,
    },
    /// Retires without architectural effect besides advancing the PC.
    NoWrite,
    /// The instruction faulted.
    Fault {
        /// Fault class.
        fault: Fault,
        /// Bus address for bus errors.
        addr: Option<u32>,
    },
    /// Break instruction.
    Break,
}

/// A finished instruction waiting for its commit slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Producer.
    pub source: Source,
    /// Instruction metadata captured at issue.
    pub entry: InFlight,
    /// Result.
    pub outcome: Outcome,
}

/// Everything one commit changed, for the control logic to act on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WritebackEffects {
    /// The instruction that retired, if one did.
    pub retired: Option<InFlight>,
    /// A result from before the last pipeline clear was dropped.
    pub discarded: bool,
    /// Register write usable by this cycle's operand read.
    pub forward: Option<Forward>,
    /// The PC of the current mode was written: clear and refetch from here.
    pub redirect: Option<u32>,
    /// A CC register was written.
    pub cc_write: Option<CcWrite>,
    /// A fault was latched.
    pub fault: Option<FaultRecord>,
    /// A break instruction retired.
    pub brk: Option<InFlight>,
    /// The commit came from the debug port.
    pub debug: bool,
}

/// One-commit-per-cycle arbiter and sole writer of [`ArchState`].
#[derive(Clone, Debug, Default)]
pub struct WritebackArbiter {
    queues: [VecDeque<Completion>; Source::COUNT],
    last_seq: [Option<u64>; 2],
    conflicts: u64,
}

impl WritebackArbiter {
    /// Creates an empty arbiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a completion.
    pub fn push(&mut self, completion: Completion) {
        self.queues[completion.source.index()].push_back(completion);
    }

    /// No completion is waiting.
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Completions waiting from `source`.
    pub fn pending(&self, source: Source) -> usize {
        self.queues[source.index()].len()
    }

    /// Every waiting completion.
    pub fn iter(&self) -> impl Iterator<Item = &Completion> {
        self.queues.iter().flat_map(VecDeque::iter)
    }

    /// Drops every waiting completion (pipeline clear).
    ///
    /// # Returns
    ///
    /// Number of completions dropped.
    pub fn flush(&mut self) -> usize {
        let n = self.queues.iter().map(VecDeque::len).sum();
        self.queues.iter_mut().for_each(VecDeque::clear);
        n
    }

    /// Cycles in which more than one source wanted to commit.
    pub const fn conflicts(&self) -> u64 {
        self.conflicts
    }

    /// Selects and applies this cycle's commit.
    ///
    /// # Arguments
    ///
    /// * `state` - Architectural state to update.
    /// * `debug_write` - A debug-port write; the caller only passes one while the core is
    ///   fully halted.
    /// * `epoch` - Current pipeline-clear epoch.
    pub fn commit(
        &mut self,
        state: &mut ArchState,
        debug_write: Option<(RegId, u32)>,
        epoch: u64,
    ) -> WritebackEffects {
        let waiting = Source::PRIORITY
            .iter()
            .filter(|s| !self.queues[s.index()].is_empty())
            .count()
            + usize::from(debug_write.is_some());
        if waiting > 1 {
            self.conflicts += 1;
            warn!(waiting, "writeback conflict: lower-priority results held");
        }

        if let Some((reg, value)) = debug_write {
            return Self::apply_debug(state, reg, value);
        }

        let next = Source::PRIORITY
            .iter()
            .find_map(|s| self.queues[s.index()].pop_front());
        match next {
            Some(c) if c.entry.epoch != epoch => {
                trace!(seq = c.entry.seq, "discarding stale result");
                WritebackEffects {
                    discarded: true,
                    ..WritebackEffects::default()
                }
            }
            Some(c) => self.apply_instruction(state, c),
            None => WritebackEffects::default(),
        }
    }

    fn apply_debug(state: &mut ArchState, reg: RegId, value: u32) -> WritebackEffects {
        let mut fx = WritebackEffects {
            debug: true,
            ..WritebackEffects::default()
        };
        let reg = state.canonical(reg);
        match reg.resolve() {
            RegisterRef::General(..) => {
                state.regs.write(reg, value);
                fx.forward = Some(Forward {
                    reg,
                    value,
                    mem_op: None,
                });
            }
            RegisterRef::ProgramCounter(mode) => {
                state.set_pc(mode, value);
                if mode == state.mode() {
                    fx.redirect = Some(value);
                }
            }
            RegisterRef::ConditionCode(mode) => {
                state.status_mut(mode).apply_write(mode, value, CcWriter::Debug);
                fx.cc_write = Some(CcWrite {
                    target: mode,
                    writer: None,
                    value,
                });
            }
        }
        fx
    }

    fn apply_instruction(&mut self, state: &mut ArchState, c: Completion) -> WritebackEffects {
        let e = c.entry;
        let mut fx = WritebackEffects {
            retired: Some(e),
            ..WritebackEffects::default()
        };
        let mut advance = true;

        match c.outcome {
            Outcome::Fault { fault, addr } => {
                let record = FaultRecord {
                    fault,
                    mode: e.mode,
                    pc: e.pc,
                    addr,
                };
                let st = state.status_mut(e.mode);
                st.fault_latch(fault).set();
                st.phase = e.phase;
                state.set_pc(e.mode, e.pc);
                state.last_fault = Some(record);
                fx.fault = Some(record);
                advance = false;
            }
            Outcome::Break => {
                state.set_pc(e.mode, e.pc);
                fx.brk = Some(e);
                advance = false;
            }
            Outcome::NoWrite => {}
            Outcome::Value { value, flags } => {
                if e.wr_flags {
                    state.status_mut(e.mode).flags = flags & CC_FLAGS_MASK as u8;
                }
                if let Some(dest) = e.dest {
                    let dest = state.canonical(dest);
                    match dest.resolve() {
                        RegisterRef::General(..) => {
                            state.regs.write(dest, value);
                            fx.forward = Some(Forward {
                                reg: dest,
                                value,
                                mem_op: e.mem_op,
                            });
                        }
                        RegisterRef::ProgramCounter(mode) => {
                            state.set_pc(mode, value);
                            if mode == e.mode {
                                advance = false;
                                if mode == state.mode() {
                                    fx.redirect = Some(value);
                                }
                            }
                        }
                        RegisterRef::ConditionCode(mode) => {
                            let writer = if mode == e.mode {
                                CcWriter::OwnMode
                            } else {
                                CcWriter::OtherMode
                            };
                            state.status_mut(mode).apply_write(mode, value, writer);
                            fx.cc_write = Some(CcWrite {
                                target: mode,
                                writer: Some(e.mode),
                                value,
                            });
                        }
                    }
                }
            }
        }

        let last = &mut self.last_seq[e.mode.index()];
        if last.is_none_or(|l| e.seq > l) {
            *last = Some(e.seq);
            if advance {
                state.set_pc(e.mode, e.next_pc);
            }
        }
        trace!(seq = e.seq, pc = e.pc, mode = %e.mode, "retire");
        fx
    }
}
