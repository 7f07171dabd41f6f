//! Main Execution Cycle.
//!
//! This module implements the per-cycle behaviour of the core. It performs the following:
//! 1. **Commit:** Collects unit results, lets the writeback arbiter commit one of them and acts
//!    on what it changed.
//! 2. **Control:** Samples interrupts, fires mode switches and cache clears, and applies at
//!    most one pipeline clear.
//! 3. **Advance:** Gates every stage with the master clock enable, evaluates hazards, runs the
//!    stage sequencer and moves instructions from fetch through issue.
//! 4. **Clocking:** Presents this cycle's requests to every unit, then reports the outputs.

use tracing::trace;

use crate::common::constants::INSTRUCTION_SIZE;
use crate::common::error::CoreError;
use crate::common::reg::RegId;
use crate::core::arch::mode::Mode;
use crate::core::control::debug::{DebugCommand, DebugSnapshot, DebugStatus};
use crate::core::cpu::dispatch::{UnitRequests, UnitSnapshot, exec_kind};
use crate::core::cpu::trap::CycleEvents;
use crate::core::cpu::{Core, CoreInputs, CoreOutputs, DebugStep};
use crate::core::pipeline::hazards::{
    DecodeView, Forward, IssueView, decode_hazard, issue_hazard, read_operand,
};
use crate::core::pipeline::latches::{DecodeEntry, ExecKind, OperandEntry};
use crate::core::pipeline::sequencer::{self, Stage, StageInput};
use crate::core::pipeline::signals::{DecodedInstruction, OpClass};
use crate::core::units::FetchRequest;
use crate::core::writeback::Source;

impl Core {
    /// Advances the core by one clock cycle.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Interrupt line, debug halt and command, and cache-clear request.
    ///
    /// # Returns
    ///
    /// The outputs of the cycle: halt and stall state, bus lock, debug response, the
    /// retired instruction and whether the pipeline was cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DebugWriteWhileRunning`] if a debug write arrives while the core
    /// is not fully halted. The cycle does not advance.
    pub fn tick(&mut self, inputs: &CoreInputs) -> Result<CoreOutputs, CoreError> {
        let debug_write = match inputs.debug {
            Some(DebugCommand::Write(reg, value)) => {
                if !self.fully_halted(inputs.halt) {
                    return Err(CoreError::DebugWriteWhileRunning { reg });
                }
                Some((reg, value))
            }
            Some(DebugCommand::Step) => {
                if self.debug_step.is_none() {
                    self.debug_step = Some(DebugStep::Armed);
                }
                None
            }
            Some(DebugCommand::Read(_)) | None => None,
        };

        let start_mode = self.state.mode();
        let snap = self.sample_units();
        let mut ev = CycleEvents::default();
        let mut reqs = UnitRequests::default();

        self.collect_completions(&snap);
        let hold = std::mem::take(&mut self.cc_hold);
        if hold && debug_write.is_none() {
            trace!("cc hold, commit skipped");
        } else {
            let fx = self
                .writeback
                .commit(&mut self.state, debug_write, self.epoch);
            self.absorb(fx, &mut ev);
        }

        self.modes.sample_interrupt(inputs.interrupt, self.state.mode());
        self.modes.wake(&mut self.state);
        let debug_holds = inputs.halt && self.debug_step.is_none();
        self.try_switch(&mut ev, debug_holds);

        self.cache_clear_pending |= inputs.clear_cache;
        let mut clear_cache = false;
        if self.cache_clear_pending
            && (ev.clear.is_some()
                || (!self.bundle_open && !self.lock.bus_lock() && self.units_idle()))
        {
            if ev.clear.is_none() {
                let mode = self.state.mode();
                ev.clear = Some((self.state.pc(mode), self.state.status(mode).phase));
            }
            clear_cache = true;
            self.cache_clear_pending = false;
        }

        if let Some((target, phase)) = ev.clear {
            self.clear_pipeline(target, phase);
            reqs.set_clear();
        }

        let mode = self.state.mode();
        let master_ce = !(debug_holds && !self.bundle_open)
            && !ev.cc_write
            && !hold
            && !self.state.status(mode).sleep
            && !self.is_broken();
        if !master_ce {
            self.stats.stalls_master += 1;
        }

        // A redirect not yet handed to fetch (clear, reset) makes the fetch output stale.
        let accept = if self.redirect.is_some() {
            false
        } else {
            self.advance(&snap, master_ce, ev.forward, &mut reqs)
        };

        let memory_idle =
            snap.memory.idle() && self.execute.outstanding(ExecKind::Memory) == 0;
        let pipeline_empty = !snap.fetch.valid && !self.decode.valid && !self.operand.valid;
        self.lock.evaluate(memory_idle, pipeline_empty);
        self.stats.lock_sequences = self.lock.sequences();

        self.units.alu.clock(&reqs.alu);
        self.units.memory.clock(&reqs.memory);
        if let Some(div) = self.units.divide.as_mut() {
            div.clock(&reqs.divide);
        }
        if let Some(fpu) = self.units.fpu.as_mut() {
            fpu.clock(&reqs.fpu);
        }
        let fetch_req = FetchRequest {
            redirect: self.redirect.take(),
            accept,
            clear_cache,
            bus_lock: self.lock.bus_lock(),
        };
        self.units.fetch.clock(&fetch_req);

        let halted = self.fully_halted(inputs.halt);
        let debug = match inputs.debug {
            Some(DebugCommand::Read(reg) | DebugCommand::Write(reg, _)) => Some(DebugSnapshot {
                reg,
                value: self.state.read(reg),
                stalled: halted,
                status: DebugStatus::capture(&self.state, halted, self.is_broken()),
            }),
            Some(DebugCommand::Step) | None => None,
        };

        self.stats.count_cycle(start_mode);
        self.stats.writeback_conflicts = self.writeback.conflicts();

        if self.config.trace_enabled() {
            trace!(
                cycle = self.stats.cycles,
                mode = %mode,
                master_ce,
                decode = self.decode.valid,
                operand = self.operand.valid,
                in_flight = self.in_flight(),
                epoch = self.epoch,
                "cycle"
            );
        }

        Ok(CoreOutputs {
            halted,
            stalled: !master_ce,
            bus_lock: self.lock.bus_lock(),
            debug,
            retired: ev.retired,
            cleared: ev.clear.is_some(),
        })
    }

    /// Nothing runs and nothing is in flight: the debug port may write registers.
    pub(crate) fn fully_halted(&self, halt: bool) -> bool {
        ((halt && self.debug_step.is_none()) || self.is_broken())
            && !self.bundle_open
            && self.units_idle()
    }

    /// Hazard evaluation, stage sequencing and the moves between stages.
    ///
    /// # Returns
    ///
    /// `true` if the decode stage consumed the word the fetch unit presents.
    fn advance(
        &mut self,
        snap: &UnitSnapshot,
        master_ce: bool,
        forward: Option<Forward>,
        reqs: &mut UnitRequests,
    ) -> bool {
        let mode = self.state.mode();
        let features = self.config.features;

        let special_dest = |d: Option<RegId>| d.is_some_and(RegId::is_special);
        let special_in_flight = self.live_entries().any(|(_, e)| special_dest(e.dest));
        let cc_invalid = special_in_flight
            || self.live_entries().any(|(_, e)| e.wr_flags)
            || self
                .operand
                .get()
                .is_some_and(|o| o.decoded.modifies_flags() || o.decoded.writes_special());
        let second_half = features.compact
            && self
                .decode
                .get()
                .is_some_and(|d| d.opens_bundle(self.decode.phase));

        let decode_stall = self.decode.get().and_then(|d| {
            let view = DecodeView {
                operand: self.operand.get(),
                scoreboard: &self.scoreboard,
                forward,
                cc_invalid,
            };
            decode_hazard(&d.decoded, &view)
        });

        // The locked pair must issue before anything can drain.
        let drain = !self.bundle_open
            && !self.lock.bus_lock()
            && ((features.user_mode && mode == Mode::User && self.modes.interrupt_pending())
                || self.cache_clear_pending);
        let step_blocked = self.modes.step_exhausted(&self.state)
            || matches!(self.debug_step, Some(DebugStep::Issued(_)));
        let issue_stall = self.operand.get().and_then(|o| {
            let target = exec_kind(o.decoded.class).map(Source::from);
            let view = IssueView {
                unit_ready: self.unit_ready(o, snap),
                units_idle: self.units_idle(),
                special_in_flight,
                flags_in_flight: self.flags_in_flight(o.mode),
                flags_in_other_unit: self
                    .live_entries()
                    .any(|(src, e)| e.wr_flags && Some(src) != target),
                drain,
                step_blocked,
            };
            issue_hazard(o, &view)
        });

        let ctl = sequencer::evaluate(
            &[
                StageInput {
                    upstream_valid: snap.fetch.valid,
                    valid: self.decode.valid,
                    local_hazard: second_half,
                },
                StageInput {
                    upstream_valid: self.decode.valid,
                    valid: self.operand.valid,
                    local_hazard: decode_stall.is_some(),
                },
                StageInput {
                    upstream_valid: self.operand.valid,
                    valid: false,
                    local_hazard: issue_stall.is_some(),
                },
            ],
            master_ce,
        );

        if master_ce {
            for cause in [issue_stall, decode_stall].into_iter().flatten() {
                trace!(%cause, "stall");
                self.stats.count_stall(cause);
            }
        }

        let issued = ctl[Stage::Issue.index()].enable;
        if issued {
            let o = self.operand.payload;
            let phase = self.operand.phase;
            self.issue(&o, phase, reqs);
        }

        let mut early_redirect = None;
        let captured = ctl[Stage::Operand.index()].enable;
        if captured {
            let d = self.decode.payload;
            let phase = self.decode.phase;
            let (entry, redirect) = self.capture_operands(&d, phase, forward);
            self.operand.capture(entry, phase);
            early_redirect = redirect;
        }
        self.operand.update(false, captured, issued);

        // An early branch discards whatever decode would take in behind it.
        let branched = early_redirect.is_some();
        if let Some(target) = early_redirect {
            trace!("early branch to {target:#010x}");
            self.redirect = Some(target);
        }
        let second = !branched && second_half && captured;
        let accept = !branched && !second && ctl[Stage::Decode.index()].enable;
        if second {
            let d = self.decode.payload;
            let decoded = self.decode_word(d.word, d.pc, d.mode, true, false);
            self.decode.capture(DecodeEntry { decoded, ..d }, true);
        } else if accept {
            let phase = std::mem::take(&mut self.resume_phase);
            let f = snap.fetch;
            let decoded = self.decode_word(f.insn, f.pc, mode, phase, f.illegal);
            self.decode.capture(
                DecodeEntry {
                    word: f.insn,
                    pc: f.pc,
                    mode,
                    decoded,
                },
                phase,
            );
        }
        self.decode.update(branched, second || accept, captured);
        accept
    }

    /// Operand read: assigns the sequence number, reads A and B and resolves early branches.
    ///
    /// # Returns
    ///
    /// The operand-latch entry and, for an early branch, the fetch redirect target.
    fn capture_operands(
        &mut self,
        d: &DecodeEntry,
        phase: bool,
        forward: Option<Forward>,
    ) -> (OperandEntry, Option<u32>) {
        let f = self.config.features;
        let seq = self.next_seq;
        self.next_seq += 1;

        let mut decoded = d.decoded;
        let op_illegal = decoded.illegal
            || (decoded.class == OpClass::Divide && (!f.divide || self.units.divide.is_none()))
            || (decoded.class == OpClass::Fpu && (!f.fpu || self.units.fpu.is_none()))
            || (decoded.compact && !f.compact);

        let mut next_pc = d.next_pc(phase);
        let mut redirect = None;
        if f.early_branching && !op_illegal && !decoded.brk && !d.opens_bundle(phase) {
            if let Some(target) = decoded.early_branch {
                next_pc = target;
                decoded.dest = None;
                decoded.class = OpClass::Nop;
                redirect = Some(target);
            }
        }

        let own_pc = self.state.canonical(RegId::pc(d.mode));
        let read = |reg: Option<RegId>| {
            reg.map_or(0, |r| {
                if self.state.canonical(r) == own_pc {
                    d.pc.wrapping_add(INSTRUCTION_SIZE)
                } else {
                    read_operand(&self.state, r, forward)
                }
            })
        };
        let a = read(decoded.src_a);
        let b = read(decoded.src_b).wrapping_add_signed(decoded.imm);

        let entry = OperandEntry {
            seq,
            pc: d.pc,
            next_pc,
            mode: d.mode,
            decoded,
            a,
            b,
            op_illegal,
        };
        (entry, redirect)
    }

    /// Runs the decoder and qualifies its register ids to `mode`.
    ///
    /// User code addresses only the user bank. Without a user bank every id maps onto the
    /// supervisor bank.
    fn decode_word(
        &self,
        word: u32,
        pc: u32,
        mode: Mode,
        phase: bool,
        fetch_illegal: bool,
    ) -> DecodedInstruction {
        if fetch_illegal {
            return DecodedInstruction::illegal();
        }
        let mut d = self.units.decoder.decode(word, pc, mode, phase);
        let qualify = |r: RegId| {
            let r = if mode == Mode::User {
                r.in_mode(Mode::User)
            } else {
                r
            };
            self.state.canonical(r)
        };
        d.dest = d.dest.map(qualify);
        d.src_a = d.src_a.map(qualify);
        d.src_b = d.src_b.map(qualify);
        d
    }
}
