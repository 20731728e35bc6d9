// core/src/registry.rs

//! The `Flywheel<E>` registry: workflows keyed by their context type.
//!
//! Call sites never hold workflow instances; they build a `Shared<T>` context
//! and ask the registry to run whatever workflow is registered for `T`. The
//! registry erases the per-workflow handler error type behind the
//! application-level error `E`.

use crate::context::Shared;
use crate::control::Outcome;
use crate::error::FlowError;
use crate::workflow::Workflow;

use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tracing::{event, Level};

/// Type-erased runner stored in the registry. The boxed context is expected
/// to contain a `Shared<T>` for the runner's `T`.
#[async_trait]
trait AnyRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, AppErr>;
}

struct RunnerEntry<T, HandlerErr, AppErr>
where
  T: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  workflow: Arc<Workflow<T, HandlerErr>>,
  _phantom: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<T, HandlerErr, AppErr> AnyRunner<AppErr> for RunnerEntry<T, HandlerErr, AppErr>
where
  T: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, AppErr> {
    let shared = match ctx.downcast::<Shared<T>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected = std::any::type_name::<Shared<T>>();
        event!(Level::ERROR, expected, "registry context downcast failed");
        return Err(AppErr::from(FlowError::ContextMismatch {
          step: "registry_dispatch".to_string(),
          expected: expected.to_string(),
        }));
      }
    };
    self.workflow.run(shared).await.map_err(AppErr::from)
  }
}

/// Registry of workflows, one per context type, returning the application
/// error type `AppErr` from [`Flywheel::run`].
pub struct Flywheel<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  runners: Mutex<HashMap<TypeId, Arc<dyn AnyRunner<AppErr>>>>,
}

impl<AppErr> Flywheel<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: Mutex::new(HashMap::new()),
    }
  }

  /// Registers a workflow for its context type `T`, replacing any previous
  /// registration for `T`.
  pub fn register<T, HandlerErr>(&self, workflow: Workflow<T, HandlerErr>)
  where
    T: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<T>(),
      "registering workflow"
    );
    let entry = RunnerEntry::<T, HandlerErr, AppErr> {
      workflow: Arc::new(workflow),
      _phantom: PhantomData,
    };
    self
      .runners
      .lock()
      .unwrap()
      .insert(TypeId::of::<T>(), Arc::new(entry));
  }

  /// Runs the workflow registered for `T` against `ctx`.
  pub async fn run<T>(&self, ctx: Shared<T>) -> Result<Outcome, AppErr>
  where
    T: 'static + Send + Sync,
  {
    let runner = {
      let runners = self.runners.lock().unwrap();
      runners.get(&TypeId::of::<T>()).cloned()
    };

    let Some(runner) = runner else {
      let context_type = std::any::type_name::<T>();
      event!(Level::ERROR, context_type, "no workflow registered for context type");
      return Err(AppErr::from(FlowError::Setup {
        step: "Flywheel::run".to_string(),
        message: format!("no workflow registered for context type {context_type}"),
      }));
    };

    runner.run_erased(Box::new(ctx)).await
  }
}

impl<AppErr> Default for Flywheel<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
