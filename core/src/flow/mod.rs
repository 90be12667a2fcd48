// karat/src/flow/mod.rs

//! A small step-workflow engine. Multi-step storefront operations (saving a
//! product, submitting a lead, uploading an image) are expressed as named
//! steps over a shared context so every step is traced and can halt the run.

pub mod control;
pub mod registry;
pub mod shared;
pub mod step;
pub mod workflow;

pub use control::{Outcome, StepControl};
pub use registry::Workflows;
pub use shared::Shared;
pub use step::{Handler, SkipCondition, StepDef};
pub use workflow::Workflow;
