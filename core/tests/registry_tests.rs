// tests/registry_tests.rs
mod common;

use common::*;
use flywheel::{Control, Flywheel, Outcome, Shared, Workflow};
use serial_test::serial;

fn counting_workflow() -> Workflow<TestCtx, TestError> {
  let mut wf = Workflow::<TestCtx, TestError>::new(&[("bump", false, None)]);
  wf.on_step("bump", |ctx: Shared<TestCtx>| async move {
    ctx.write().counter += 1;
    Ok::<_, TestError>(Control::Advance)
  });
  wf
}

#[tokio::test]
#[serial]
async fn registry_dispatches_by_context_type() {
  setup_tracing();
  let flywheel = Flywheel::<TestError>::new();
  flywheel.register(counting_workflow());

  let ctx = Shared::new(TestCtx::default());
  let outcome = flywheel.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, Outcome::Completed);
  assert_eq!(ctx.read().counter, 1);
}

#[tokio::test]
#[serial]
async fn unregistered_context_type_is_a_setup_error() {
  setup_tracing();
  let flywheel = Flywheel::<TestError>::new();

  let ctx = Shared::new(BranchCtx::default());
  let err = flywheel.run(ctx).await.unwrap_err();
  match err {
    TestError::Flow(s) => assert!(s.contains("no workflow registered")),
    other => panic!("expected setup error, got {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn re_registering_replaces_the_previous_workflow() {
  setup_tracing();
  let flywheel = Flywheel::<TestError>::new();
  flywheel.register(counting_workflow());

  let mut doubler = Workflow::<TestCtx, TestError>::new(&[("bump", false, None)]);
  doubler.on_step("bump", |ctx: Shared<TestCtx>| async move {
    ctx.write().counter += 2;
    Ok::<_, TestError>(Control::Advance)
  });
  flywheel.register(doubler);

  let ctx = Shared::new(TestCtx::default());
  flywheel.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().counter, 2);
}

#[tokio::test]
#[serial]
async fn halted_workflow_reports_halted_through_the_registry() {
  setup_tracing();
  let flywheel = Flywheel::<TestError>::new();

  let mut wf = Workflow::<TestCtx, TestError>::new(&[("gate", false, None)]);
  wf.on_step("gate", |_ctx: Shared<TestCtx>| async move { Ok::<_, TestError>(Control::Halt) });
  flywheel.register(wf);

  let ctx = Shared::new(TestCtx::default());
  assert_eq!(flywheel.run(ctx).await.unwrap(), Outcome::Halted);
}
