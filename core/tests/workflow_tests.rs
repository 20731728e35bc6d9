// tests/workflow_tests.rs
mod common;

use common::*;
use flywheel::{Control, FlowError, Outcome, Shared, Workflow};
use std::sync::Arc;

#[tokio::test]
async fn runs_steps_in_declaration_order() {
  setup_tracing();
  let mut wf =
    Workflow::<TestCtx, TestError>::new(&[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  wf.on_step("step1", appending_handler("step1", " S1"));
  wf.on_step("step2", appending_handler("step2", " S2"));
  wf.on_step("step3", appending_handler("step3", " S3"));

  let ctx = Shared::new(TestCtx::default());
  let outcome = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, Outcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.trail, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
async fn halt_skips_remaining_steps() {
  setup_tracing();
  let mut wf =
    Workflow::<TestCtx, TestError>::new(&[("stepA", false, None), ("stepB", false, None), ("stepC", false, None)]);

  wf.on_step("stepA", appending_handler("stepA", "A"));
  wf.on_step("stepB", appending_handler("stepB", "B"));
  wf.on_step("stepC", appending_handler("stepC", "C"));

  let ctx = Shared::new(TestCtx {
    halt_at: Some("stepB".to_string()),
    ..Default::default()
  });
  let outcome = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, Outcome::Halted);
  let guard = ctx.read();
  assert_eq!(guard.trail, "AB");
  assert_eq!(guard.steps_executed, vec!["stepA", "stepB"]);
}

#[tokio::test]
async fn handler_error_propagates_and_stops_the_run() {
  setup_tracing();
  let mut wf = Workflow::<TestCtx, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("unreached_step", false, None),
  ]);

  wf.on_step("good_step", appending_handler("good_step", "ok"));
  wf.on_step("bad_step", failing_handler("bad_step", "boom"));
  wf.on_step("unreached_step", appending_handler("unreached_step", "never"));

  let ctx = Shared::new(TestCtx::default());
  let err = wf.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("boom".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.trail, "ok");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
async fn skip_when_condition_skips_the_step() {
  setup_tracing();
  let mut wf = Workflow::<TestCtx, TestError>::new(&[
    ("step1", false, None),
    (
      "skipped_step",
      false,
      Some(Arc::new(|ctx: Shared<TestCtx>| ctx.read().counter > 0)),
    ),
    ("step3", false, None),
  ]);

  wf.on_step("step1", appending_handler("step1", " S1"));
  wf.on_step("skipped_step", appending_handler("skipped_step", " NOPE"));
  wf.on_step("step3", appending_handler("step3", " S3"));

  let ctx = Shared::new(TestCtx::default());
  let outcome = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, Outcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 2);
  assert_eq!(guard.trail, " S1 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
async fn before_and_after_hooks_wrap_the_on_phase() {
  setup_tracing();
  let mut wf = Workflow::<TestCtx, TestError>::new(&[("step", false, None)]);

  wf.before_step("step", appending_handler("step:before", "<"));
  wf.on_step("step", appending_handler("step:on", "="));
  wf.after_step("step", appending_handler("step:after", ">"));

  let ctx = Shared::new(TestCtx::default());
  wf.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.trail, "<=>");
  assert_eq!(guard.steps_executed, vec!["step:before", "step:on", "step:after"]);
}

#[tokio::test]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let wf = Workflow::<TestCtx, TestError>::new(&[("bare_step", false, None)]);

  let ctx = Shared::new(TestCtx::default());
  let err = wf.run(ctx).await.unwrap_err();

  match err {
    TestError::Flow(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("bare_step"));
    }
    other => panic!("expected FlowError::HandlerMissing, got {other:?}"),
  }
}

#[tokio::test]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let wf = Workflow::<TestCtx, TestError>::new(&[("optional_bare_step", true, None)]);

  let ctx = Shared::new(TestCtx::default());
  let outcome = wf.run(ctx).await.unwrap();
  assert_eq!(outcome, Outcome::Completed);
}

#[tokio::test]
async fn framework_errors_convert_into_the_handler_error_type() {
  setup_tracing();
  // A workflow whose handlers use FlowError directly still runs.
  let mut wf = Workflow::<TestCtx, FlowError>::new(&[("step", false, None)]);
  wf.on_step("step", |ctx: Shared<TestCtx>| async move {
    ctx.write().counter += 1;
    Ok::<_, FlowError>(Control::Advance)
  });

  let ctx = Shared::new(TestCtx::default());
  assert_eq!(wf.run(ctx.clone()).await.unwrap(), Outcome::Completed);
  assert_eq!(ctx.read().counter, 1);
}
