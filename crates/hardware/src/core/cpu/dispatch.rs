//! Unit Collection and Instruction Dispatch.
//!
//! This module connects the core to its execution units. It performs the following:
//! 1. **Sampling:** Reads the registered outputs of every unit at the start of a cycle.
//! 2. **Collection:** Pairs each reported result with the oldest in-flight instruction of that
//!    unit and queues it for writeback, dropping results from before the last clear.
//! 3. **Dispatch:** Turns an operand-read instruction into a unit request, or retires it
//!    directly when it needs no unit.

use tracing::{trace, warn};

use crate::common::error::Fault;
use crate::core::arch::mode::Mode;
use crate::core::cpu::{Core, DebugStep};
use crate::core::pipeline::latches::{ExecKind, InFlight, OperandEntry};
use crate::core::pipeline::signals::OpClass;
use crate::core::units::{ExecRequest, ExecStatus, FetchStatus, MemRequest, MemStatus};
use crate::core::writeback::{Completion, Outcome, Source};

/// Registered unit outputs for the current cycle.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct UnitSnapshot {
    pub fetch: FetchStatus,
    pub alu: ExecStatus,
    pub memory: MemStatus,
    pub divide: ExecStatus,
    pub fpu: ExecStatus,
}

/// Unit requests built during the cycle, clocked at its end.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct UnitRequests {
    pub alu: ExecRequest,
    pub memory: MemRequest,
    pub divide: ExecRequest,
    pub fpu: ExecRequest,
}

impl UnitRequests {
    /// Marks every request with the pipeline-clear signal.
    pub fn set_clear(&mut self) {
        self.alu.clear = true;
        self.memory.clear = true;
        self.divide.clear = true;
        self.fpu.clear = true;
    }
}

/// Unit an operand-read instruction needs, if any.
pub(crate) const fn exec_kind(class: OpClass) -> Option<ExecKind> {
    match class {
        OpClass::Nop => None,
        OpClass::Alu => Some(ExecKind::Alu),
        OpClass::Memory(_) => Some(ExecKind::Memory),
        OpClass::Divide => Some(ExecKind::Divide),
        OpClass::Fpu => Some(ExecKind::Fpu),
    }
}

impl Core {
    /// Reads every unit's registered outputs. Absent units report idle.
    pub(crate) fn sample_units(&self) -> UnitSnapshot {
        UnitSnapshot {
            fetch: self.units.fetch.status(),
            alu: self.units.alu.status(),
            memory: self.units.memory.status(),
            divide: self
                .units
                .divide
                .as_ref()
                .map(|u| u.status())
                .unwrap_or_default(),
            fpu: self
                .units
                .fpu
                .as_ref()
                .map(|u| u.status())
                .unwrap_or_default(),
        }
    }

    /// Moves every result reported this cycle into the writeback arbiter.
    pub(crate) fn collect_completions(&mut self, snap: &UnitSnapshot) {
        let exec = [
            (ExecKind::Alu, snap.alu, Fault::IllegalInstruction),
            (ExecKind::Divide, snap.divide, Fault::DivideByZero),
            (ExecKind::Fpu, snap.fpu, Fault::FloatingPointError),
        ];
        for (kind, status, fault) in exec {
            if !status.valid {
                continue;
            }
            let outcome = if status.error {
                Outcome::Fault { fault, addr: None }
            } else {
                Outcome::Value {
                    value: status.result,
                    flags: status.flags,
                }
            };
            self.complete(kind, outcome);
        }

        let mem = snap.memory;
        if mem.valid {
            let outcome = if mem.error {
                Outcome::Fault {
                    fault: Fault::BusError,
                    addr: Some(mem.addr),
                }
            } else {
                Outcome::Value {
                    value: mem.data,
                    flags: 0,
                }
            };
            self.complete(ExecKind::Memory, outcome);
        }
    }

    fn complete(&mut self, kind: ExecKind, outcome: Outcome) {
        let Some(entry) = self.execute.complete(kind) else {
            warn!(unit = kind.name(), "unit reported a result with nothing outstanding");
            return;
        };
        if entry.epoch != self.epoch {
            trace!(seq = entry.seq, unit = kind.name(), "dropping result issued before clear");
            self.stats.results_discarded += 1;
            return;
        }
        self.writeback.push(Completion {
            source: kind.into(),
            entry,
            outcome,
        });
    }

    /// True if the unit `o` is destined for can start an operation this cycle.
    pub(crate) fn unit_ready(&self, o: &OperandEntry, snap: &UnitSnapshot) -> bool {
        if o.is_non_issuable() {
            return true;
        }
        match exec_kind(o.decoded.class) {
            None => true,
            Some(ExecKind::Alu) => snap.alu.ready(),
            Some(ExecKind::Divide) => snap.divide.ready(),
            Some(ExecKind::Fpu) => snap.fpu.ready(),
            Some(ExecKind::Memory) => {
                snap.memory.ready
                    && (self.config.features.pipelined_memory
                        || (!snap.memory.busy && self.execute.outstanding(ExecKind::Memory) == 0))
            }
        }
    }

    /// Hands the operand-read instruction to its unit, or retires it directly.
    ///
    /// # Arguments
    ///
    /// * `o` - The issuing instruction.
    /// * `phase` - It is the second half of a compact bundle.
    /// * `reqs` - Unit requests for this cycle.
    pub(crate) fn issue(&mut self, o: &OperandEntry, phase: bool, reqs: &mut UnitRequests) {
        let d = &o.decoded;
        let entry = InFlight {
            seq: o.seq,
            pc: o.pc,
            next_pc: o.next_pc,
            mode: o.mode,
            dest: d.dest,
            wr_flags: d.wr_flags,
            mem_op: match d.class {
                OpClass::Memory(op) => Some(op),
                _ => None,
            },
            phase,
            opens_bundle: self.config.features.compact && d.compact && !phase,
            epoch: self.epoch,
        };

        self.modes.note_issue(o.mode);
        if self.debug_step == Some(DebugStep::Armed) {
            self.debug_step = Some(DebugStep::Issued(o.seq));
        }
        if entry.opens_bundle {
            self.bundle_open = true;
        } else if phase {
            self.bundle_open = false;
        }

        let retire = |outcome| Completion {
            source: Source::Retire,
            entry: InFlight {
                dest: None,
                wr_flags: false,
                ..entry
            },
            outcome,
        };

        if o.op_illegal {
            self.writeback.push(retire(Outcome::Fault {
                fault: Fault::IllegalInstruction,
                addr: None,
            }));
            return;
        }
        if d.brk {
            self.writeback.push(retire(Outcome::Break));
            return;
        }
        if !d.cond.holds(self.state.flags(o.mode)) {
            trace!(seq = o.seq, "condition false");
            self.writeback.push(retire(Outcome::NoWrite));
            return;
        }

        let Some(kind) = exec_kind(d.class) else {
            if d.lock {
                self.lock.on_lock_issue();
            }
            self.writeback.push(retire(Outcome::NoWrite));
            return;
        };

        let exec = ExecRequest {
            start: true,
            opcode: d.opcode,
            a: o.a,
            b: o.b,
            flags: self.state.flags(o.mode),
            clear: false,
        };
        match kind {
            ExecKind::Alu => reqs.alu = exec,
            ExecKind::Divide => reqs.divide = exec,
            ExecKind::Fpu => reqs.fpu = exec,
            ExecKind::Memory => {
                reqs.memory = MemRequest {
                    start: true,
                    op: entry.mem_op,
                    addr: o.b,
                    data: o.a,
                    dest: entry.dest,
                    lock: self.lock.on_memory_issue(),
                    clear: false,
                };
            }
        }
        if let Some(dest) = entry.dest {
            self.scoreboard.set_producer(dest, entry.seq);
        }
        trace!(seq = o.seq, pc = o.pc, unit = kind.name(), "issue");
        self.execute.issue(kind, entry);
    }

    /// Live in-flight work: unit queues and arbiter queues of the current epoch.
    pub(crate) fn live_entries(&self) -> impl Iterator<Item = (Source, &InFlight)> {
        let epoch = self.epoch;
        ExecKind::PRIORITY
            .into_iter()
            .flat_map(move |k| self.execute.entries(k).map(move |e| (Source::from(k), e)))
            .chain(self.writeback.iter().map(|c| (c.source, &c.entry)))
            .filter(move |(_, e)| e.epoch == epoch)
    }

    /// True if no instruction of the current epoch is executing or waiting to commit.
    pub(crate) fn units_idle(&self) -> bool {
        self.live_entries().next().is_none()
    }

    /// True if some live instruction writes the flags of `mode`.
    pub(crate) fn flags_in_flight(&self, mode: Mode) -> bool {
        self.live_entries().any(|(_, e)| e.wr_flags && e.mode == mode)
    }
}
