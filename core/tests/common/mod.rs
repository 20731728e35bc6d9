// tests/common/mod.rs
#![allow(dead_code)] // shared across test binaries; not every binary uses everything

use flywheel::{Control, FlowError, Shared};
use tracing::Level;

// --- Common context structs ---
#[derive(Clone, Debug, Default)]
pub struct TestCtx {
  pub counter: i32,
  pub trail: String,
  pub steps_executed: Vec<String>,
  pub halt_at: Option<String>,
  pub route: Option<String>,
  pub branch_ctx: Option<Shared<BranchCtx>>,
}

#[derive(Clone, Debug, Default)]
pub struct BranchCtx {
  pub input: String,
  pub handled_by: Option<String>,
}

// --- Common error type for tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flywheel framework error: {0}")]
  Flow(String), // stringified for Eq comparison in assertions

  #[error("test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{fe:?}"))
  }
}

// --- Common handler creators ---
pub fn appending_handler(
  step_name: &'static str,
  tag: &'static str,
) -> flywheel::Handler<TestCtx, TestError> {
  Box::new(move |ctx: Shared<TestCtx>| {
    let step = step_name.to_string();
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.trail.push_str(tag);
      guard.steps_executed.push(step.clone());
      if guard.halt_at.as_deref() == Some(step.as_str()) {
        return Ok(Control::Halt);
      }
      Ok(Control::Advance)
    })
  })
}

pub fn failing_handler(
  step_name: &'static str,
  message: &'static str,
) -> flywheel::Handler<TestCtx, TestError> {
  Box::new(move |ctx: Shared<TestCtx>| {
    let step = step_name.to_string();
    let message = message.to_string();
    Box::pin(async move {
      ctx.write().steps_executed.push(step);
      Err(TestError::Handler(message))
    })
  })
}

// --- Tracing setup (idempotent across tests) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
