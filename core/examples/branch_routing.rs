// core/examples/branch_routing.rs
//
// Branch points: one step routes into a scoped sub-workflow chosen by a
// condition over the root context. Both arms share the scoped context type.
// Run with: cargo run --example branch_routing

use flywheel::{Control, FlowError, Shared, Workflow};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ShipmentCtx {
  destination_country: String,
  parcel: Option<Shared<ParcelCtx>>,
}

#[derive(Debug, Default)]
struct ParcelCtx {
  carrier: Option<String>,
  label: Option<String>,
}

fn carrier_workflow(carrier: &'static str) -> Arc<Workflow<ParcelCtx, FlowError>> {
  let mut wf = Workflow::<ParcelCtx, FlowError>::new(&[("book", false, None), ("label", false, None)]);
  wf.on_step("book", move |ctx: Shared<ParcelCtx>| async move {
    ctx.write().carrier = Some(carrier.to_string());
    Ok::<_, FlowError>(Control::Advance)
  });
  wf.on_step("label", move |ctx: Shared<ParcelCtx>| async move {
    let carrier = ctx.read().carrier.clone().unwrap_or_default();
    ctx.write().label = Some(format!("{carrier}-0001"));
    Ok::<_, FlowError>(Control::Advance)
  });
  Arc::new(wf)
}

fn extract_parcel(ctx: Shared<ShipmentCtx>) -> Result<Shared<ParcelCtx>, FlowError> {
  ctx.read().parcel.clone().ok_or_else(|| FlowError::ExtractFailure {
    step: "route_carrier".to_string(),
    source: anyhow::anyhow!("parcel context not installed"),
  })
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let mut wf = Workflow::<ShipmentCtx, FlowError>::new(&[("prepare", false, None), ("route_carrier", false, None)]);

  wf.on_step("prepare", |ctx: Shared<ShipmentCtx>| async move {
    ctx.write().parcel = Some(Shared::new(ParcelCtx::default()));
    Ok::<_, FlowError>(Control::Advance)
  });

  wf.branches_for_step::<ParcelCtx>("route_carrier")
    .arm_static(carrier_workflow("domestico"), extract_parcel)
    .when(|ctx: Shared<ShipmentCtx>| ctx.read().destination_country == "US")
    .arm_static(carrier_workflow("globex"), extract_parcel)
    .when(|ctx: Shared<ShipmentCtx>| ctx.read().destination_country != "US")
    .if_no_arm_matches(Control::Halt)
    .seal(false);

  for country in ["US", "DE"] {
    let ctx = Shared::new(ShipmentCtx {
      destination_country: country.to_string(),
      parcel: None,
    });
    wf.run(ctx.clone()).await?;
    let parcel = ctx.read().parcel.clone().expect("parcel installed by prepare step");
    let guard = parcel.read();
    println!(
      "{country}: carrier={:?} label={:?}",
      guard.carrier.as_deref(),
      guard.label.as_deref()
    );
  }
  Ok(())
}
