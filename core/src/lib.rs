// core/src/lib.rs

//! Flywheel: an asynchronous, pluggable workflow engine.
//!
//! A `Workflow<T, E>` is an ordered list of named steps executed against a
//! shared context `Shared<T>`. Each step can carry `before`/`on`/`after`
//! hooks, a skip condition, and an optional flag. A step can also be turned
//! into a branch point that routes execution into one of several scoped
//! sub-workflows (chosen by a condition over the root context), which is how
//! callers express provider-style polymorphism without branching in their
//! step handlers.
//!
//! Workflows are registered with a [`Flywheel`] registry keyed by their
//! context type, so call sites dispatch by constructing a context and calling
//! `flywheel.run(ctx)`.

pub mod branch;
pub mod context;
pub mod control;
pub mod error;
pub mod exec;
pub mod registry;
pub mod step;
pub mod workflow;

pub use crate::branch::{BranchArm, BranchBuilder};
pub use crate::context::Shared;
pub use crate::control::{Control, Outcome};
pub use crate::error::{FlowError, FlowResult};
pub use crate::registry::Flywheel;
pub use crate::step::{SkipWhen, StepSpec};
pub use crate::workflow::{Handler, Workflow};
