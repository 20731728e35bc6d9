// tests/branch_tests.rs
mod common;

use common::*;
use flywheel::{Control, FlowError, Outcome, Shared, Workflow};
use std::sync::Arc;

fn branch_workflow(tag: &'static str) -> Arc<Workflow<BranchCtx, TestError>> {
  let mut wf = Workflow::<BranchCtx, TestError>::new(&[("handle", false, None)]);
  wf.on_step("handle", move |ctx: Shared<BranchCtx>| async move {
    ctx.write().handled_by = Some(tag.to_string());
    Ok::<_, TestError>(Control::Advance)
  });
  Arc::new(wf)
}

fn extract_branch_ctx(ctx: Shared<TestCtx>) -> Result<Shared<BranchCtx>, FlowError> {
  ctx.read().branch_ctx.clone().ok_or_else(|| FlowError::ExtractFailure {
    step: "route".to_string(),
    source: anyhow::anyhow!("branch context not installed"),
  })
}

fn routed_workflow(no_match: Control, optional: bool) -> Workflow<TestCtx, TestError> {
  let mut wf = Workflow::<TestCtx, TestError>::new(&[("prepare", false, None), ("route", false, None)]);

  wf.on_step("prepare", |ctx: Shared<TestCtx>| async move {
    ctx.write().branch_ctx = Some(Shared::new(BranchCtx::default()));
    Ok::<_, TestError>(Control::Advance)
  });

  wf.branches_for_step::<BranchCtx>("route")
    .arm_static(branch_workflow("alpha"), extract_branch_ctx)
    .when(|ctx: Shared<TestCtx>| ctx.read().route.as_deref() == Some("alpha"))
    .arm_static(branch_workflow("beta"), extract_branch_ctx)
    .when(|ctx: Shared<TestCtx>| ctx.read().route.as_deref() == Some("beta"))
    .if_no_arm_matches(no_match)
    .seal(optional);

  wf
}

#[tokio::test]
async fn first_matching_arm_wins() {
  setup_tracing();
  let wf = routed_workflow(Control::Advance, false);

  let ctx = Shared::new(TestCtx {
    route: Some("beta".to_string()),
    ..Default::default()
  });
  let outcome = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, Outcome::Completed);
  let branch_ctx = ctx.read().branch_ctx.clone().unwrap();
  assert_eq!(branch_ctx.read().handled_by.as_deref(), Some("beta"));
}

#[tokio::test]
async fn no_matching_arm_uses_fallback_halt() {
  setup_tracing();
  let wf = routed_workflow(Control::Halt, false);

  let ctx = Shared::new(TestCtx {
    route: Some("gamma".to_string()),
    ..Default::default()
  });
  let outcome = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, Outcome::Halted);
  let branch_ctx = ctx.read().branch_ctx.clone().unwrap();
  assert_eq!(branch_ctx.read().handled_by, None);
}

#[tokio::test]
async fn factory_arm_builds_per_run() {
  setup_tracing();
  let mut wf = Workflow::<TestCtx, TestError>::new(&[("prepare", false, None), ("route", false, None)]);

  wf.on_step("prepare", |ctx: Shared<TestCtx>| async move {
    ctx.write().branch_ctx = Some(Shared::new(BranchCtx {
      input: "payload".to_string(),
      handled_by: None,
    }));
    Ok::<_, TestError>(Control::Advance)
  });

  wf.branches_for_step::<BranchCtx>("route")
    .arm_with(
      |_root: Shared<TestCtx>| async move { Ok(branch_workflow("factory-built")) },
      extract_branch_ctx,
    )
    .when(|_ctx: Shared<TestCtx>| true)
    .seal(false);

  let ctx = Shared::new(TestCtx::default());
  assert_eq!(wf.run(ctx.clone()).await.unwrap(), Outcome::Completed);
  let branch_ctx = ctx.read().branch_ctx.clone().unwrap();
  assert_eq!(branch_ctx.read().handled_by.as_deref(), Some("factory-built"));
  assert_eq!(branch_ctx.read().input, "payload");
}

#[tokio::test]
async fn factory_failure_fails_a_required_branch_step() {
  setup_tracing();
  let mut wf = Workflow::<TestCtx, TestError>::new(&[("route", false, None)]);

  wf.branches_for_step::<BranchCtx>("route")
    .arm_with(
      |_root: Shared<TestCtx>| async move {
        Err::<Arc<Workflow<BranchCtx, TestError>>, _>(FlowError::Internal("factory exploded".to_string()))
      },
      extract_branch_ctx,
    )
    .when(|_ctx: Shared<TestCtx>| true)
    .seal(false);

  let ctx = Shared::new(TestCtx::default());
  let err = wf.run(ctx).await.unwrap_err();
  match err {
    TestError::Flow(s) => assert!(s.contains("BranchBuildFailure")),
    other => panic!("expected branch build failure, got {other:?}"),
  }
}

#[tokio::test]
async fn optional_branch_step_swallows_arm_failures() {
  setup_tracing();
  let mut wf = Workflow::<TestCtx, TestError>::new(&[("route", false, None), ("tail", false, None)]);

  // Extraction fails (no branch context installed), but the sealed step is
  // optional, so the run advances to the tail step.
  wf.branches_for_step::<BranchCtx>("route")
    .arm_static(branch_workflow("alpha"), extract_branch_ctx)
    .when(|_ctx: Shared<TestCtx>| true)
    .seal(true);

  wf.on_step("tail", appending_handler("tail", "T"));

  let ctx = Shared::new(TestCtx::default());
  assert_eq!(wf.run(ctx.clone()).await.unwrap(), Outcome::Completed);
  assert_eq!(ctx.read().trail, "T");
}

#[tokio::test]
async fn halted_sub_workflow_halts_the_root() {
  setup_tracing();
  let mut halting = Workflow::<BranchCtx, TestError>::new(&[("handle", false, None)]);
  halting.on_step("handle", |ctx: Shared<BranchCtx>| async move {
    ctx.write().handled_by = Some("halting".to_string());
    Ok::<_, TestError>(Control::Halt)
  });
  let halting = Arc::new(halting);

  let mut wf = Workflow::<TestCtx, TestError>::new(&[("prepare", false, None), ("route", false, None), ("tail", false, None)]);
  wf.on_step("prepare", |ctx: Shared<TestCtx>| async move {
    ctx.write().branch_ctx = Some(Shared::new(BranchCtx::default()));
    Ok::<_, TestError>(Control::Advance)
  });
  wf.branches_for_step::<BranchCtx>("route")
    .arm_static(halting, extract_branch_ctx)
    .when(|_ctx: Shared<TestCtx>| true)
    .seal(false);
  wf.on_step("tail", appending_handler("tail", "T"));

  let ctx = Shared::new(TestCtx::default());
  assert_eq!(wf.run(ctx.clone()).await.unwrap(), Outcome::Halted);
  assert_eq!(ctx.read().trail, ""); // tail never ran
}
