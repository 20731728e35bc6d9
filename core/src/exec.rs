// core/src/exec.rs

//! The `Workflow::run` step loop.

use crate::context::Shared;
use crate::control::{Control, Outcome};
use crate::error::FlowError;
use crate::workflow::{Handler, Workflow};
use tracing::{event, instrument, span, Instrument, Level};

impl<T, E> Workflow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the workflow against `ctx`.
  ///
  /// Steps run in declaration order. For each step: the skip condition is
  /// evaluated first, then `before`, `on` and `after` hooks in registration
  /// order. A handler returning [`Control::Halt`] ends the run with
  /// [`Outcome::Halted`]; a handler error ends it with `Err`. A required
  /// step with no handlers at all is a [`FlowError::HandlerMissing`].
  #[instrument(
    name = "Workflow::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<T>(),
      error_type = %std::any::type_name::<E>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx: Shared<T>) -> Result<Outcome, E> {
    event!(Level::DEBUG, "workflow run starting");

    for (step_idx, spec) in self.steps.iter().enumerate() {
      let step = spec.name.as_str();
      let step_span = span!(Level::INFO, "workflow_step", step, step_idx, optional = spec.optional);

      if let Some(skip_when) = &spec.skip_when {
        if step_span.in_scope(|| skip_when(ctx.clone())) {
          event!(parent: &step_span, Level::DEBUG, "step skipped by skip_when condition");
          continue;
        }
      }

      let phases: [(&str, Option<&Vec<Handler<T, E>>>); 3] = [
        ("before", self.before.get(step)),
        ("on", self.on.get(step)),
        ("after", self.after.get(step)),
      ];

      if phases.iter().all(|(_, hs)| hs.map_or(true, |h| h.is_empty())) {
        if spec.optional {
          event!(parent: &step_span, Level::DEBUG, "optional step has no handlers, skipping");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "required step has no handlers");
        return Err(E::from(FlowError::HandlerMissing { step: spec.name.clone() }));
      }

      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        for (handler_idx, handler) in handlers.iter().enumerate() {
          let handler_span = span!(parent: &step_span, Level::DEBUG, "step_handler", phase, handler_idx);
          match handler(ctx.clone()).instrument(handler_span).await {
            Ok(Control::Advance) => {}
            Ok(Control::Halt) => {
              event!(parent: &step_span, Level::INFO, phase, "workflow halted by handler");
              return Ok(Outcome::Halted);
            }
            Err(e) => {
              event!(parent: &step_span, Level::ERROR, phase, error = %e, "step handler failed");
              return Err(e);
            }
          }
        }
      }

      event!(parent: &step_span, Level::DEBUG, "step finished");
    }

    event!(Level::DEBUG, "workflow run completed");
    Ok(Outcome::Completed)
  }
}
