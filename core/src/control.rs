// core/src/control.rs

//! Flow-control signals exchanged between step handlers and the executor.

/// Signal returned by a handler: keep going, or halt the run here.
///
/// Halting is not an error. A workflow that halts ran exactly as far as its
/// handlers decided it should; callers inspect the context to find out why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// Proceed with the remaining handlers and steps.
  Advance,
  /// Stop the run immediately; no further handlers or steps execute.
  Halt,
}

/// Outcome of a full workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// Every non-skipped step ran to the end.
  Completed,
  /// A handler returned [`Control::Halt`].
  Halted,
}
