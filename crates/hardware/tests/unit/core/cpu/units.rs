//! Optional Unit Tests.
//!
//! Covers the divide and floating-point units: results, unit-reported errors, and
//! instructions that need a unit the configuration leaves out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pipecore::common::error::Fault;
use pipecore::common::reg::RegId;
use pipecore::config::Config;
use pipecore::core::arch::mode::Mode;
use pipecore::core::units::ExecStatus;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::instruction::InstructionBuilder as Insn;
use crate::common::harness::{RESET, TestContext};
use crate::common::mocks::exec::{LatencyUnit, MockExec};

fn sup(n: u8) -> RegId {
    RegId::of(Mode::Supervisor, n)
}

fn fpu_config() -> Config {
    let mut config = Config::default();
    config.features.fpu = true;
    config
}

/// Single-cycle unit that answers its one start with `result` (or an error) a cycle later.
/// With `operands` set, the start must carry exactly those A and B values.
fn one_shot_unit(result: Option<u32>, operands: Option<(u32, u32)>) -> MockExec {
    let started = Arc::new(AtomicBool::new(false));
    let mut unit = MockExec::new();
    let idle = Arc::clone(&started);
    unit.expect_clock()
        .withf(|req| !req.start)
        .returning(move |_| idle.store(false, Ordering::SeqCst));
    let busy = Arc::clone(&started);
    unit.expect_clock()
        .withf(move |req| req.start && operands.is_none_or(|(a, b)| req.a == a && req.b == b))
        .times(1)
        .returning(move |_| busy.store(true, Ordering::SeqCst));
    unit.expect_status().returning(move || {
        let valid = started.load(Ordering::SeqCst);
        ExecStatus {
            valid,
            error: valid && result.is_none(),
            result: result.unwrap_or_default(),
            ..ExecStatus::default()
        }
    });
    unit
}

#[test]
fn divide_result_feeds_dependent_instruction() {
    let mut ctx = TestContext::new(&[
        Insn::div(1, 2, 3).encode(),
        Insn::addi(4, 1, 1).encode(),
        Insn::brk().encode(),
    ]);
    ctx.poke(sup(2), 20);
    ctx.poke(sup(3), 4);
    let _ = ctx.run_to_halt(100);

    assert_eq!(ctx.reg(Mode::Supervisor, 1), 5);
    assert_eq!(ctx.reg(Mode::Supervisor, 4), 6);
}

#[test]
fn divide_unit_receives_operands() {
    let unit = one_shot_unit(Some(5), Some((20, 4)));
    let mut ctx = TestContext::builder()
        .divide_unit(Box::new(unit))
        .program(&[Insn::div(1, 2, 3).encode(), Insn::brk().encode()])
        .build();
    ctx.poke(sup(2), 20);
    ctx.poke(sup(3), 4);
    let _ = ctx.run_to_halt(100);
    assert_eq!(ctx.reg(Mode::Supervisor, 1), 5);
}

#[test]
fn divide_error_is_divide_by_zero() {
    let mut ctx = TestContext::builder()
        .divide_unit(Box::new(one_shot_unit(None, None)))
        .program(&[Insn::div(1, 2, 3).encode(), Insn::brk().encode()])
        .build();
    let _ = ctx.run_to_halt(100);

    let fault = ctx.core.state().last_fault().expect("fault recorded");
    assert_eq!(fault.fault, Fault::DivideByZero);
    assert_eq!(fault.pc, RESET);
    assert!(ctx.core.state().status(Mode::Supervisor).div_error.is_set());
}

#[test]
fn disabled_divide_unit_is_never_started() {
    let mut unit = MockExec::new();
    unit.expect_status().return_const(ExecStatus::default());
    unit.expect_clock().withf(|req| !req.start).return_const(());

    let mut config = Config::default();
    config.features.divide = false;
    let mut ctx = TestContext::builder()
        .config(config)
        .divide_unit(Box::new(unit))
        .program(&[Insn::div(1, 2, 3).encode(), Insn::brk().encode()])
        .build();
    let _ = ctx.run_to_halt(100);

    let fault = ctx.core.state().last_fault().expect("fault recorded");
    assert_eq!(fault.fault, Fault::IllegalInstruction);
}

#[test]
fn fpu_adds() {
    let mut ctx = TestContext::builder()
        .config(fpu_config())
        .program(&[Insn::fadd(1, 2, 3).encode(), Insn::brk().encode()])
        .build();
    ctx.poke(sup(2), 1.5f32.to_bits());
    ctx.poke(sup(3), 2.25f32.to_bits());
    let _ = ctx.run_to_halt(100);
    assert_eq!(ctx.reg(Mode::Supervisor, 1), 3.75f32.to_bits());
}

#[test]
fn fpu_exception_latches() {
    let mut ctx = TestContext::builder()
        .config(fpu_config())
        .program(&[Insn::fadd(1, 2, 3).encode(), Insn::brk().encode()])
        .build();
    ctx.poke(sup(2), f32::NAN.to_bits());
    let _ = ctx.run_to_halt(100);

    assert!(ctx.core.state().status(Mode::Supervisor).fpu_error.is_set());
    assert_eq!(
        ctx.core.state().last_fault().map(|f| f.fault),
        Some(Fault::FloatingPointError)
    );
}

#[rstest]
#[case::absent_fpu(Insn::fadd(1, 2, 3))]
#[case::illegal_word(Insn::illegal())]
fn unsupported_instruction_faults(#[case] insn: Insn) {
    let mut ctx = TestContext::new(&[insn.encode(), Insn::brk().encode()]);
    let _ = ctx.run_to_halt(100);
    assert_eq!(
        ctx.core.state().last_fault().map(|f| f.fault),
        Some(Fault::IllegalInstruction)
    );
    assert_eq!(ctx.core.stats().faults, 1);
}

#[test]
fn slow_divide_blocks_second_divide() {
    let divide = LatencyUnit::divide(6);
    let starts = divide.starts();
    let mut ctx = TestContext::builder()
        .divide_unit(Box::new(divide))
        .program(&[
            Insn::div(1, 2, 3).encode(),
            Insn::div(4, 2, 3).encode(),
            Insn::brk().encode(),
        ])
        .build();
    ctx.poke(sup(2), 9);
    ctx.poke(sup(3), 3);
    let _ = ctx.run_to_halt(200);

    assert_eq!(starts.get(), 2);
    assert_eq!(ctx.reg(Mode::Supervisor, 1), 3);
    assert_eq!(ctx.reg(Mode::Supervisor, 4), 3);
    assert!(ctx.core.stats().stalls_unit_busy >= 4);
}
