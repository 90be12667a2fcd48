// karat/src/flow/control.rs

//! Signals for controlling workflow flow and the outcome of a run.

/// Returned by every step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Proceed to the next handler / step.
  Continue,
  /// Stop the run here. Later steps do not execute.
  Halt,
}

/// Outcome of a full workflow run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Completed,
  Halted,
}
