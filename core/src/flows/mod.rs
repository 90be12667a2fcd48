// karat/src/flows/mod.rs

//! The storefront's multi-step operations, each a [`Workflow`] over its own
//! context type. Every workflow ends in an optional `audit` step so callers
//! can attach their own reporting without touching the core steps.
//!
//! [`Workflow`]: crate::flow::Workflow

pub mod save_product;
pub mod submit_lead;
pub mod upload_image;

pub use save_product::SaveProduct;
pub use submit_lead::LeadSubmission;
pub use upload_image::{ImageUploadJob, UploadTarget};

use crate::error::KaratError;
use crate::flow::Workflows;

/// Step name shared by every workflow for caller-supplied reporting.
pub const AUDIT_STEP: &str = "audit";

/// Registers the three storefront workflows.
pub fn register_all<E>(workflows: &Workflows<E>) -> Result<(), KaratError>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  workflows.register(save_product::workflow::<E>()?);
  workflows.register(submit_lead::workflow::<E>()?);
  workflows.register(upload_image::workflow::<E>()?);
  Ok(())
}
