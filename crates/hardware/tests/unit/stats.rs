use pipecore::CoreStats;
use pipecore::core::arch::mode::Mode;
use pipecore::core::pipeline::hazards::StallCause;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn cycles_split_by_mode() {
    let mut stats = CoreStats::default();
    stats.count_cycle(Mode::Supervisor);
    stats.count_cycle(Mode::User);
    stats.count_cycle(Mode::User);
    stats.instructions_retired = 2;
    assert_eq!(stats.cycles, 3);
    assert_eq!(stats.cycles_supervisor, 1);
    assert_eq!(stats.cycles_user, 2);
    assert!((stats.cpi() - 1.5).abs() < f64::EPSILON);
}

#[rstest]
#[case(StallCause::Operand, 0, 1, 0)]
#[case(StallCause::ImmediateB, 0, 0, 1)]
#[case(StallCause::Drain, 1, 0, 0)]
#[case(StallCause::Step, 1, 0, 0)]
fn stall_causes_map_to_counters(
    #[case] cause: StallCause,
    #[case] drain: u64,
    #[case] operand: u64,
    #[case] immediate: u64,
) {
    let mut stats = CoreStats::default();
    stats.count_stall(cause);
    assert_eq!(
        (stats.stalls_drain, stats.stalls_operand, stats.stalls_immediate),
        (drain, operand, immediate)
    );
    assert_eq!(stats.hazard_stalls(), 1);
}

#[test]
fn master_gate_is_not_a_hazard_stall() {
    let stats = CoreStats {
        stalls_master: 7,
        stalls_flags: 2,
        ..CoreStats::default()
    };
    assert_eq!(stats.hazard_stalls(), 2);
}

#[test]
fn report_lists_counters() {
    let stats = CoreStats {
        cycles: 10,
        instructions_retired: 5,
        pipeline_clears: 3,
        ..CoreStats::default()
    };
    let text = stats.to_string();
    assert!(text.contains("sim.cycles             10"));
    assert!(text.contains("sim.cpi                2.000"));
    assert!(text.contains("stalls.operand"));
}
