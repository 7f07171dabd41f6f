//! Memory Scenario Tests.
//!
//! Covers loads and stores with pipelined and serial memory units, bus errors, and the
//! writeback arbitration between the memory unit and the ALU.

use pipecore::common::constants::CC_BUSERR;
use pipecore::common::error::{Fault, FaultRecord};
use pipecore::common::reg::RegId;
use pipecore::config::Config;
use pipecore::core::arch::mode::Mode;
use pipecore::core::control::debug::DebugStatus;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::instruction::InstructionBuilder as Insn;
use crate::common::harness::{DATA_BASE, RESET, TestContext};

const BASE_REG: u8 = 6;

fn memory_context(pipelined: bool, latency: u32, program: &[u32]) -> TestContext {
    let mut config = Config::default();
    config.features.pipelined_memory = pipelined;
    let mut ctx = TestContext::builder()
        .config(config)
        .memory_latency(latency)
        .program(program)
        .build();
    ctx.poke(RegId::of(Mode::Supervisor, BASE_REG), DATA_BASE);
    ctx
}

#[rstest]
fn store_then_load_round_trips(
    #[values(true, false)] pipelined: bool,
    #[values(1, 3)] latency: u32,
) {
    let mut ctx = memory_context(
        pipelined,
        latency,
        &[
            Insn::mov(1, 42).encode(),
            Insn::store(1, BASE_REG, 0).encode(),
            Insn::load(2, BASE_REG, 0).encode(),
            Insn::addi(3, 2, 1).encode(),
            Insn::brk().encode(),
        ],
    );
    let _ = ctx.run_to_halt(200);

    assert_eq!(ctx.mem(DATA_BASE), 42);
    assert_eq!(ctx.reg(Mode::Supervisor, 2), 42);
    assert_eq!(ctx.reg(Mode::Supervisor, 3), 43);
    assert_eq!(ctx.core.state().pc(Mode::Supervisor), RESET + 16);
}

#[rstest]
#[case::pipelined(true)]
#[case::serial(false)]
fn back_to_back_loads(#[case] pipelined: bool) {
    let mut ctx = memory_context(
        pipelined,
        3,
        &[
            Insn::load(1, BASE_REG, 0).encode(),
            Insn::load(2, BASE_REG, 4).encode(),
            Insn::brk().encode(),
        ],
    );
    let _ = ctx.bus.borrow_mut().write(DATA_BASE, 11);
    let _ = ctx.bus.borrow_mut().write(DATA_BASE + 4, 22);
    let _ = ctx.run_to_halt(200);

    assert_eq!(ctx.reg(Mode::Supervisor, 1), 11);
    assert_eq!(ctx.reg(Mode::Supervisor, 2), 22);
    assert_eq!(ctx.core.stats().stalls_unit_busy > 0, !pipelined);
}

#[test]
fn bus_error_records_address() {
    let mut ctx = TestContext::new(&[
        Insn::mov(1, 1).encode(),
        Insn::load(2, BASE_REG, 8).encode(),
        Insn::brk().encode(),
    ]);
    ctx.poke(RegId::of(Mode::Supervisor, BASE_REG), 0x1000_0000);
    let _ = ctx.run_to_halt(100);

    assert_eq!(
        ctx.core.state().last_fault(),
        Some(FaultRecord {
            fault: Fault::BusError,
            mode: Mode::Supervisor,
            pc: RESET + 4,
            addr: Some(0x1000_0008),
        })
    );
    assert_eq!(ctx.core.state().pc(Mode::Supervisor), RESET + 4);
    assert_eq!(ctx.reg(Mode::Supervisor, 1), 1);
    assert_eq!(ctx.reg(Mode::Supervisor, 2), 0);
    assert_eq!(ctx.core.stats().faults, 1);

    let cc = ctx.peek(RegId::cc(Mode::Supervisor));
    assert_ne!(cc & CC_BUSERR, 0);
    let out = ctx.outputs.last().copied().expect("cycle recorded");
    assert!(out.debug.expect("read response").status.contains(DebugStatus::BUS_ERROR));
}

#[test]
fn simultaneous_results_commit_one_per_cycle() {
    let mut ctx = memory_context(
        true,
        3,
        &[
            Insn::load(1, BASE_REG, 0).encode(),
            Insn::mov(2, 7).encode(),
            Insn::mov(3, 8).encode(),
            Insn::brk().encode(),
        ],
    );
    let _ = ctx.bus.borrow_mut().write(DATA_BASE, 0x55);
    let _ = ctx.run_to_halt(100);

    assert_eq!(ctx.reg(Mode::Supervisor, 1), 0x55);
    assert_eq!(ctx.reg(Mode::Supervisor, 2), 7);
    assert_eq!(ctx.reg(Mode::Supervisor, 3), 8);
    assert!(ctx.core.stats().writeback_conflicts >= 1);
    // The out-of-order finish must not move the PC backwards.
    assert_eq!(ctx.core.state().pc(Mode::Supervisor), RESET + 12);

    let retirements = ctx.outputs.iter().filter(|o| o.retired.is_some()).count();
    assert_eq!(retirements as u64, ctx.core.stats().instructions_retired);
}
