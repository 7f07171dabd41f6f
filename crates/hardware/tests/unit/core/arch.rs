//! Architectural State Tests.
//!
//! Covers CC synthesis, the write rules of the status bits, bank aliasing without User
//! mode, and acknowledging a latched fault from the debug port. Property tests check that
//! no CC write can set a fault latch.

use pipecore::common::constants::{
    CC_BREAK, CC_C, CC_GIE, CC_ILL, CC_PHASE, CC_SLEEP, CC_STEP, CC_TRAP, CC_Z,
};
use pipecore::common::reg::RegId;
use pipecore::core::arch::mode::Mode;
use pipecore::core::arch::state::ArchState;
use pipecore::core::arch::status::{CcWriter, ModeStatus};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::instruction::InstructionBuilder as Insn;
use crate::common::harness::{RESET, TestContext};

#[test]
fn user_cc_reports_gie_and_user_latches() {
    let mut st = ModeStatus::default();
    st.flags = (CC_Z | CC_C) as u8;
    st.step = true;
    st.trap.set();
    assert_eq!(
        st.to_word(Mode::User),
        CC_Z | CC_C | CC_GIE | CC_STEP | CC_TRAP
    );
    assert_eq!(st.to_word(Mode::Supervisor), CC_Z | CC_C);
}

#[test]
fn supervisor_break_bit_is_break_enable() {
    let mut st = ModeStatus::default();
    st.apply_write(Mode::Supervisor, CC_BREAK, CcWriter::OwnMode);
    assert!(st.break_enable);
    assert_eq!(st.to_word(Mode::Supervisor), CC_BREAK);
}

#[rstest]
#[case(CcWriter::OwnMode, false)]
#[case(CcWriter::OtherMode, true)]
#[case(CcWriter::Debug, true)]
fn user_step_needs_privileged_writer(#[case] writer: CcWriter, #[case] expected: bool) {
    let mut st = ModeStatus::default();
    st.apply_write(Mode::User, CC_STEP, writer);
    assert_eq!(st.step, expected);
}

#[test]
fn flags_and_sleep_follow_every_write() {
    let mut st = ModeStatus::default();
    st.apply_write(Mode::User, CC_Z | CC_SLEEP, CcWriter::OwnMode);
    assert_eq!(st.flags, CC_Z as u8);
    assert!(st.sleep);
    st.apply_write(Mode::User, 0, CcWriter::OwnMode);
    assert_eq!(st.flags, 0);
    assert!(!st.sleep);
}

#[test]
fn outside_writer_restores_phase() {
    let mut st = ModeStatus::default();
    st.apply_write(Mode::User, CC_PHASE, CcWriter::OwnMode);
    assert!(!st.phase);
    st.apply_write(Mode::User, CC_PHASE, CcWriter::Debug);
    assert!(st.phase);
}

#[test]
fn unbanked_state_aliases_user_ids() {
    let st = ArchState::new(0x100, false);
    assert!(!st.is_banked());
    assert_eq!(st.canonical(RegId::of(Mode::User, 3)), RegId::of(Mode::Supervisor, 3));
    assert_eq!(st.read(RegId::pc(Mode::User)), 0x100);
}

#[test]
fn banked_state_keeps_user_pc_separate() {
    let st = ArchState::new(0x100, true);
    assert_eq!(st.read(RegId::pc(Mode::Supervisor)), 0x100);
    assert_eq!(st.read(RegId::pc(Mode::User)), 0);
}

#[test]
fn debug_echo_acknowledges_supervisor_fault() {
    let mut ctx = TestContext::new(&[Insn::illegal().encode()]);
    let _ = ctx.run_to_halt(50);
    assert!(ctx.core.is_broken());
    let cc = ctx.peek(RegId::cc(Mode::Supervisor));
    assert_eq!(cc & CC_ILL, CC_ILL);

    // Writing a zero leaves the latch alone.
    ctx.poke(RegId::cc(Mode::Supervisor), cc & !CC_ILL);
    assert!(ctx.core.state().status(Mode::Supervisor).illegal.is_set());

    ctx.poke(RegId::cc(Mode::Supervisor), cc);
    assert!(!ctx.core.state().status(Mode::Supervisor).illegal.is_set());
    assert!(!ctx.core.is_broken());
    assert_eq!(ctx.core.state().pc(Mode::Supervisor), RESET);
}

fn writer() -> impl proptest::strategy::Strategy<Value = CcWriter> {
    use proptest::prelude::*;
    prop_oneof![
        Just(CcWriter::OwnMode),
        Just(CcWriter::OtherMode),
        Just(CcWriter::Debug)
    ]
}

proptest::proptest! {
    #[test]
    fn cc_writes_never_set_a_fault_latch(
        value in proptest::num::u32::ANY,
        w in writer(),
        user in proptest::bool::ANY,
    ) {
        let mode = if user { Mode::User } else { Mode::Supervisor };
        let mut st = ModeStatus::default();
        st.apply_write(mode, value, w);
        proptest::prop_assert!(!st.any_fault());
        proptest::prop_assert!(!st.trap.is_set());
        proptest::prop_assert!(!st.user_break.is_set());
    }

    #[test]
    fn latched_fault_clears_only_on_outside_echo(
        value in proptest::num::u32::ANY,
        w in writer(),
        user in proptest::bool::ANY,
    ) {
        let mode = if user { Mode::User } else { Mode::Supervisor };
        let mut st = ModeStatus::default();
        st.illegal.set();
        st.apply_write(mode, value, w);
        let cleared = w != CcWriter::OwnMode && value & CC_ILL != 0;
        proptest::prop_assert_eq!(st.illegal.is_set(), !cleared);
    }
}
