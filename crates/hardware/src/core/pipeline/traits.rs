//! Pipeline Latch Interface.
//!
//! This module defines the common behaviour of stage registers. It provides:
//! 1. **Flushing:** Invalidating contents on a pipeline-clearing event.
//! 2. **Status Checking:** Whether a stage currently holds an instruction.

/// Represents a pipeline latch (inter-stage register).
///
/// Latches hold the state of instructions as they move between stages. They support
/// flushing and status checks.
pub trait PipelineLatch {
    /// Invalidates the latch contents.
    ///
    /// Called on every pipeline-clearing event: branch, interrupt entry or exit,
    /// reset, or a debug cache clear.
    fn flush(&mut self);

    /// Checks if the latch is empty.
    ///
    /// # Returns
    ///
    /// `true` if there are no valid instructions in the latch, `false` otherwise.
    fn is_empty(&self) -> bool;
}
