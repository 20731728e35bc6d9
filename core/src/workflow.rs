// core/src/workflow.rs

//! `Workflow<T, E>` definition and hook registration.

use crate::branch::BranchBuilder;
use crate::context::Shared;
use crate::control::Control;
use crate::error::FlowError;
use crate::step::{SkipWhen, StepSpec};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A registered step handler. Handlers receive a clone of the shared context
/// handle and resolve to `Result<Control, E>`.
pub type Handler<T, E> =
  Box<dyn Fn(Shared<T>) -> Pin<Box<dyn Future<Output = Result<Control, E>> + Send>> + Send + Sync>;

/// An ordered, named-step workflow over a shared context of type `T`.
///
/// `E` is the error type returned by this workflow's handlers. It must be
/// `From<FlowError>` so framework failures (missing handlers, branch build
/// errors) surface through the same channel.
pub struct Workflow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepSpec<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, E>>>,
}

impl<T, E> Workflow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a workflow from `(name, optional, skip_when)` step tuples.
  pub fn new(step_specs: &[(&str, bool, Option<SkipWhen<T>>)]) -> Self {
    let steps = step_specs
      .iter()
      .map(|(name, optional, skip_when)| StepSpec {
        name: (*name).to_string(),
        optional: *optional,
        skip_when: skip_when.clone(),
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Panics if the named step was not declared. Registration against an
  /// undeclared step is a programming error (usually a typo), not a runtime
  /// condition, so it fails loudly at setup time.
  pub(crate) fn require_step(&self, step: &str) {
    if !self.steps.iter().any(|s| s.name == step) {
      panic!("flywheel setup error: step '{step}' not declared in workflow");
    }
  }

  pub fn has_step(&self, step: &str) -> bool {
    self.steps.iter().any(|s| s.name == step)
  }

  /// Registers a `before` hook for a step.
  ///
  /// The handler's own error type only needs `Into<E>`; the conversion is
  /// applied when the handler is boxed.
  pub fn before_step<F, UErr>(&mut self, step: &str, handler: impl Fn(Shared<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Control, UErr>> + Send + 'static,
    UErr: Into<E> + Send + Sync + 'static,
  {
    self.require_step(step);
    self.before.entry(step.to_string()).or_default().push(Self::box_handler(handler));
  }

  /// Registers an `on` hook for a step. This is the primary handler phase.
  pub fn on_step<F, UErr>(&mut self, step: &str, handler: impl Fn(Shared<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Control, UErr>> + Send + 'static,
    UErr: Into<E> + Send + Sync + 'static,
  {
    self.require_step(step);
    self.on.entry(step.to_string()).or_default().push(Self::box_handler(handler));
  }

  /// Registers an `after` hook for a step.
  pub fn after_step<F, UErr>(&mut self, step: &str, handler: impl Fn(Shared<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Control, UErr>> + Send + 'static,
    UErr: Into<E> + Send + Sync + 'static,
  {
    self.require_step(step);
    self.after.entry(step.to_string()).or_default().push(Self::box_handler(handler));
  }

  fn box_handler<F, UErr>(handler: impl Fn(Shared<T>) -> F + Send + Sync + 'static) -> Handler<T, E>
  where
    F: Future<Output = Result<Control, UErr>> + Send + 'static,
    UErr: Into<E> + Send + Sync + 'static,
  {
    Box::new(move |ctx| {
      let fut = handler(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    })
  }

  /// Turns a step into a branch point routing into scoped sub-workflows over
  /// a shared branch context `S`. See [`BranchBuilder`].
  ///
  /// All arms of one branch point share the same `S`; heterogeneous branch
  /// contexts belong in separate steps.
  pub fn branches_for_step<S>(&mut self, step: &str) -> BranchBuilder<'_, T, S, E>
  where
    S: 'static + Send + Sync,
  {
    self.require_step(step);
    BranchBuilder::new(self, step.to_string())
  }
}
