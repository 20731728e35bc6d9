// core/src/step.rs

use crate::context::Shared;
use std::sync::Arc;

/// Predicate deciding whether a step is skipped for the current run.
/// Evaluated against the root context before any of the step's hooks.
pub type SkipWhen<T> = Arc<dyn Fn(Shared<T>) -> bool + Send + Sync + 'static>;

/// Definition of one named step in a workflow.
#[derive(Clone)]
pub struct StepSpec<T: 'static + Send + Sync> {
  pub name: String,
  /// An optional step with no registered handlers is silently skipped;
  /// a required one in that state fails the run.
  pub optional: bool,
  pub skip_when: Option<SkipWhen<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepSpec<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepSpec")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("has_skip_when", &self.skip_when.is_some())
      .finish()
  }
}
