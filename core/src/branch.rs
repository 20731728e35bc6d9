// core/src/branch.rs

//! Conditional branch routing: a step that dispatches into one of several
//! scoped sub-workflows, selected by a condition over the root context.
//!
//! All arms of one branch point operate on the same scoped context type `S`,
//! which the caller extracts from the root context (typically a field holding
//! a `Shared<S>` installed by an earlier step). The first arm whose condition
//! matches wins; remaining arms are not evaluated.

use crate::context::Shared;
use crate::control::{Control, Outcome};
use crate::error::FlowError;
use crate::workflow::{Handler, Workflow};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{event, Level};

type CondFn<T> = Arc<dyn Fn(Shared<T>) -> bool + Send + Sync + 'static>;
type ExtractFn<T, S> = Arc<dyn Fn(Shared<T>) -> Result<Shared<S>, FlowError> + Send + Sync + 'static>;
type FactoryFn<T, S, E> = Arc<
  dyn Fn(Shared<T>) -> Pin<Box<dyn Future<Output = Result<Arc<Workflow<S, E>>, FlowError>> + Send>>
    + Send
    + Sync,
>;

enum ArmSource<T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// A pre-built sub-workflow shared across runs.
  Static(Arc<Workflow<S, E>>),
  /// A factory invoked per run; it may consult the root context.
  Factory(FactoryFn<T, S, E>),
}

struct Arm<T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  source: ArmSource<T, S, E>,
  extract: ExtractFn<T, S>,
  when: CondFn<T>,
}

/// Builder collecting the arms of a branch point. Obtained from
/// [`Workflow::branches_for_step`]; finished with [`BranchBuilder::seal`],
/// which installs the dispatching handler on the step.
pub struct BranchBuilder<'wf, T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  workflow: &'wf mut Workflow<T, E>,
  step: String,
  arms: Vec<Arm<T, S, E>>,
  no_match: Control,
}

impl<'wf, T, S, E> BranchBuilder<'wf, T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) fn new(workflow: &'wf mut Workflow<T, E>, step: String) -> Self {
    Self {
      workflow,
      step,
      arms: Vec::new(),
      no_match: Control::Advance,
    }
  }

  /// Adds an arm backed by a pre-built sub-workflow.
  pub fn arm_static(
    self,
    sub_workflow: Arc<Workflow<S, E>>,
    extract: impl Fn(Shared<T>) -> Result<Shared<S>, FlowError> + Send + Sync + 'static,
  ) -> BranchArm<'wf, T, S, E> {
    BranchArm {
      builder: self,
      source: ArmSource::Static(sub_workflow),
      extract: Arc::new(extract),
    }
  }

  /// Adds an arm whose sub-workflow is produced by an async factory at run
  /// time. Factory failures are [`FlowError::BranchBuildFailure`]s.
  pub fn arm_with<F, Fut>(
    self,
    factory: F,
    extract: impl Fn(Shared<T>) -> Result<Shared<S>, FlowError> + Send + Sync + 'static,
  ) -> BranchArm<'wf, T, S, E>
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<Workflow<S, E>>, FlowError>> + Send + 'static,
  {
    let boxed: FactoryFn<T, S, E> = Arc::new(move |ctx| Box::pin(factory(ctx)));
    BranchArm {
      builder: self,
      source: ArmSource::Factory(boxed),
      extract: Arc::new(extract),
    }
  }

  /// Control signal when no arm's condition matches (default: advance).
  pub fn if_no_arm_matches(mut self, behavior: Control) -> Self {
    self.no_match = behavior;
    self
  }

  /// Installs the dispatching handler as the step's `on` phase.
  ///
  /// When `optional` is true, arm failures (factory, extraction or
  /// sub-workflow errors) are logged and swallowed and the main workflow
  /// advances; otherwise they propagate and fail the run.
  pub fn seal(self, optional: bool) {
    let step = self.step.clone();
    let arms = Arc::new(self.arms);
    let no_match = self.no_match;

    let master: Handler<T, E> = Box::new(move |ctx: Shared<T>| {
      let arms = arms.clone();
      let step = step.clone();

      Box::pin(async move {
        for arm in arms.iter() {
          if !(arm.when)(ctx.clone()) {
            continue;
          }
          event!(Level::DEBUG, %step, "branch arm matched, dispatching");

          let dispatched = dispatch_arm(arm, ctx.clone(), &step).await;
          return match dispatched {
            Ok(control) => Ok(control),
            Err(e) => {
              event!(Level::ERROR, %step, error = %e, "branch arm execution failed");
              if optional {
                event!(Level::WARN, %step, "branch step is optional, swallowing arm failure");
                Ok(Control::Advance)
              } else {
                Err(e)
              }
            }
          };
        }
        event!(Level::DEBUG, %step, "no branch arm matched, defaulting to {:?}", no_match);
        Ok(no_match)
      })
    });

    if let Some(spec) = self.workflow.steps.iter_mut().find(|s| s.name == self.step) {
      spec.optional = optional;
    }
    self.workflow.on.insert(self.step.clone(), vec![master]);
    event!(Level::INFO, step = %self.step, "branch point sealed");
  }
}

async fn dispatch_arm<T, S, E>(arm: &Arm<T, S, E>, ctx: Shared<T>, step: &str) -> Result<Control, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  let sub_workflow = match &arm.source {
    ArmSource::Static(wf) => wf.clone(),
    ArmSource::Factory(factory) => factory(ctx.clone()).await.map_err(|fe| {
      E::from(FlowError::BranchBuildFailure {
        step: step.to_string(),
        source: anyhow::anyhow!(fe),
      })
    })?,
  };

  let sub_ctx = (arm.extract)(ctx).map_err(|fe| {
    E::from(match fe {
      FlowError::ExtractFailure { source, .. } => FlowError::ExtractFailure {
        step: step.to_string(),
        source,
      },
      other => other,
    })
  })?;

  match sub_workflow.run(sub_ctx).await? {
    Outcome::Completed => Ok(Control::Advance),
    Outcome::Halted => Ok(Control::Halt),
  }
}

/// A branch arm awaiting its condition. [`BranchArm::when`] completes the arm
/// and hands the builder back for chaining.
pub struct BranchArm<'wf, T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  builder: BranchBuilder<'wf, T, S, E>,
  source: ArmSource<T, S, E>,
  extract: ExtractFn<T, S>,
}

impl<'wf, T, S, E> BranchArm<'wf, T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Sets the arm's condition and returns the builder.
  pub fn when(mut self, condition: impl Fn(Shared<T>) -> bool + Send + Sync + 'static) -> BranchBuilder<'wf, T, S, E> {
    self.builder.arms.push(Arm {
      source: self.source,
      extract: self.extract,
      when: Arc::new(condition),
    });
    self.builder
  }
}
