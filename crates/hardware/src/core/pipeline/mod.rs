//! Instruction pipeline implementation.
//!
//! This module contains the control structures of the five-stage instruction pipeline.
//! It includes the following components:
//! 1. **Hazards:** Detection of data and structural hazards, and operand forwarding.
//! 2. **Latches:** Inter-stage records and the per-unit in-flight queues.
//! 3. **Scoreboard:** Latest pending producer of every register.
//! 4. **Sequencer:** The valid/stall/clock-enable equations of the controlled stages.
//! 5. **Signals:** Control signals produced by the external decoder.
//! 6. **Traits:** Common interface of stage latches.

/// Pipeline hazard detection and forwarding logic.
pub mod hazards;

/// Inter-stage pipeline latches and execute-stage tracking.
pub mod latches;

/// Register producer tracking.
pub mod scoreboard;

/// Stage valid/stall/enable sequencing.
pub mod sequencer;

/// Control signals generated during instruction decode.
pub mod signals;

/// Traits for pipeline latches.
pub mod traits;
