// core/examples/basic_workflow.rs
//
// Minimal flywheel usage: a three-step workflow over a shared context.
// Run with: cargo run --example basic_workflow

use flywheel::{Control, FlowError, Shared, Workflow};

#[derive(Debug, Default)]
struct OnboardCtx {
  email: String,
  normalized_email: Option<String>,
  welcome_line: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let mut wf = Workflow::<OnboardCtx, FlowError>::new(&[
    ("normalize_email", false, None),
    ("compose_welcome", false, None),
    ("print_welcome", false, None),
  ]);

  wf.on_step("normalize_email", |ctx: Shared<OnboardCtx>| async move {
    let email = ctx.read().email.trim().to_lowercase();
    if email.is_empty() {
      return Ok(Control::Halt);
    }
    ctx.write().normalized_email = Some(email);
    Ok::<_, FlowError>(Control::Advance)
  });

  wf.on_step("compose_welcome", |ctx: Shared<OnboardCtx>| async move {
    let email = ctx.read().normalized_email.clone().unwrap_or_default();
    ctx.write().welcome_line = Some(format!("welcome aboard, {email}"));
    Ok::<_, FlowError>(Control::Advance)
  });

  wf.on_step("print_welcome", |ctx: Shared<OnboardCtx>| async move {
    println!("{}", ctx.read().welcome_line.clone().unwrap_or_default());
    Ok::<_, FlowError>(Control::Advance)
  });

  let ctx = Shared::new(OnboardCtx {
    email: "  Ada@Example.COM ".to_string(),
    ..Default::default()
  });
  let outcome = wf.run(ctx).await?;
  println!("outcome: {outcome:?}");
  Ok(())
}
