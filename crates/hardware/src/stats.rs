//! Core statistics collection and reporting.
//!
//! This module tracks performance counters of the pipeline core. It provides:
//! 1. **Cycle and Retirement:** Total cycles, retired instructions, and cycles per mode.
//! 2. **Stalls:** Stall cycles by cause, including cycles lost to the master clock gate.
//! 3. **Control Events:** Pipeline clears, interrupts taken, faults, lock sequences, and
//!    writeback conflicts.

use std::fmt;

use crate::core::arch::mode::Mode;
use crate::core::pipeline::hazards::StallCause;

/// Performance counters of one core.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreStats {
    /// Cycles ticked.
    pub cycles: u64,
    /// Instructions retired (including faulting and false-condition ones).
    pub instructions_retired: u64,

    /// Cycles spent in Supervisor mode.
    pub cycles_supervisor: u64,
    /// Cycles spent in User mode.
    pub cycles_user: u64,

    /// Decode stalls on a PC/CC operand.
    pub stalls_special: u64,
    /// Decode stalls on an uncommitted operand or destination producer.
    pub stalls_operand: u64,
    /// Decode stalls on an immediate-B operand that cannot be forwarded.
    pub stalls_immediate: u64,
    /// Issue stalls on a busy unit.
    pub stalls_unit_busy: u64,
    /// Issue stalls waiting for flags.
    pub stalls_flags: u64,
    /// Issue stalls serializing special writers, illegal and break instructions.
    pub stalls_serialize: u64,
    /// Issue stalls draining for a mode switch or cache clear, or on an exhausted step.
    pub stalls_drain: u64,
    /// Cycles with the master clock enable off.
    pub stalls_master: u64,

    /// Pipeline-clearing events.
    pub pipeline_clears: u64,
    /// Results dropped because of a clear.
    pub results_discarded: u64,
    /// User-to-Supervisor switches caused by interrupts.
    pub interrupts_taken: u64,
    /// All User-to-Supervisor switches.
    pub supervisor_entries: u64,
    /// Faults latched.
    pub faults: u64,
    /// Lock sequences armed.
    pub lock_sequences: u64,
    /// Cycles with more than one writeback source.
    pub writeback_conflicts: u64,
}

impl CoreStats {
    /// Counts one cycle in `mode`.
    pub fn count_cycle(&mut self, mode: Mode) {
        self.cycles += 1;
        match mode {
            Mode::Supervisor => self.cycles_supervisor += 1,
            Mode::User => self.cycles_user += 1,
        }
    }

    /// Counts one stall cycle of the given cause.
    pub fn count_stall(&mut self, cause: StallCause) {
        let slot = match cause {
            StallCause::Special => &mut self.stalls_special,
            StallCause::Operand => &mut self.stalls_operand,
            StallCause::ImmediateB => &mut self.stalls_immediate,
            StallCause::UnitBusy => &mut self.stalls_unit_busy,
            StallCause::Flags => &mut self.stalls_flags,
            StallCause::Serialize => &mut self.stalls_serialize,
            StallCause::Drain | StallCause::Step => &mut self.stalls_drain,
        };
        *slot += 1;
    }

    /// Cycles per retired instruction, or zero before anything retired.
    pub fn cpi(&self) -> f64 {
        if self.instructions_retired == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_retired as f64
        }
    }

    /// Total stall cycles across all causes except the master gate.
    pub const fn hazard_stalls(&self) -> u64 {
        self.stalls_special
            + self.stalls_operand
            + self.stalls_immediate
            + self.stalls_unit_busy
            + self.stalls_flags
            + self.stalls_serialize
            + self.stalls_drain
    }
}

impl fmt::Display for CoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |n: u64| {
            if self.cycles == 0 {
                0.0
            } else {
                (n as f64 / self.cycles as f64) * 100.0
            }
        };
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "CORE SUMMARY")?;
        writeln!(f, "  sim.cycles             {}", self.cycles)?;
        writeln!(f, "  sim.retired            {}", self.instructions_retired)?;
        writeln!(f, "  sim.cpi                {:.3}", self.cpi())?;
        writeln!(
            f,
            "  cycles.supervisor      {} ({:.2}%)",
            self.cycles_supervisor,
            pct(self.cycles_supervisor)
        )?;
        writeln!(
            f,
            "  cycles.user            {} ({:.2}%)",
            self.cycles_user,
            pct(self.cycles_user)
        )?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "STALLS")?;
        for (name, n) in [
            ("stalls.special", self.stalls_special),
            ("stalls.operand", self.stalls_operand),
            ("stalls.immediate", self.stalls_immediate),
            ("stalls.unit_busy", self.stalls_unit_busy),
            ("stalls.flags", self.stalls_flags),
            ("stalls.serialize", self.stalls_serialize),
            ("stalls.drain", self.stalls_drain),
            ("stalls.master", self.stalls_master),
        ] {
            writeln!(f, "  {name:<22} {n} ({:.2}%)", pct(n))?;
        }
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "CONTROL")?;
        writeln!(f, "  ctl.clears             {}", self.pipeline_clears)?;
        writeln!(f, "  ctl.discarded          {}", self.results_discarded)?;
        writeln!(f, "  ctl.interrupts         {}", self.interrupts_taken)?;
        writeln!(f, "  ctl.supervisor_entries {}", self.supervisor_entries)?;
        writeln!(f, "  ctl.faults             {}", self.faults)?;
        writeln!(f, "  ctl.lock_sequences     {}", self.lock_sequences)?;
        writeln!(f, "  ctl.wb_conflicts       {}", self.writeback_conflicts)?;
        write!(f, "----------------------------------------------------------")
    }
}
