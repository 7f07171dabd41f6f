/// Architectural state: CC synthesis and sticky latches.
pub mod arch;
