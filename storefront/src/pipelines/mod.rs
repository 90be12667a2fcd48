// storefront/src/pipelines/mod.rs

//! Registers the storefront workflows and attaches the server's audit
//! handlers to each.

use crate::errors::{AppError, Result as AppResult};
use karat::flows::{self, ImageUploadJob, LeadSubmission, SaveProduct, UploadTarget, AUDIT_STEP};
use karat::{KaratError, Outcome, Shared, StepControl, Workflows};
use tracing::info;

async fn audit_product_save(ctx: Shared<SaveProduct>) -> AppResult<StepControl> {
  let guard = ctx.read();
  if let Some(product) = &guard.saved {
    info!(
      audit = "product_saved",
      product_id = %product.id,
      barcode = %product.barcode,
      created = guard.target.is_none(),
      "Catalog changed."
    );
  }
  Ok(StepControl::Continue)
}

async fn audit_lead(ctx: Shared<LeadSubmission>) -> AppResult<StepControl> {
  let guard = ctx.read();
  match &guard.recorded {
    Some(lead) => info!(audit = "lead_recorded", lead_id = %lead.id, "Visitor submitted their details."),
    None => info!(audit = "gate_skipped", "Visitor skipped the lead form."),
  }
  Ok(StepControl::Continue)
}

async fn audit_upload(ctx: Shared<ImageUploadJob>) -> AppResult<StepControl> {
  let guard = ctx.read();
  if let Some(hosted) = &guard.hosted {
    let target = match guard.target {
      UploadTarget::Library(_) => "library",
      UploadTarget::Product => "product",
    };
    info!(audit = "image_uploaded", target, public_id = %hosted.public_id, "Image stored on media host.");
  }
  Ok(StepControl::Continue)
}

/// Builds the three storefront workflows with audit reporting and registers
/// them with `workflows`.
pub fn register_all_pipelines(workflows: &Workflows<AppError>) -> Result<(), KaratError> {
  info!("Registering storefront workflows...");

  let mut save = flows::save_product::workflow::<AppError>()?;
  save.on(AUDIT_STEP, audit_product_save)?;
  workflows.register(save);

  let mut lead = flows::submit_lead::workflow::<AppError>()?;
  lead.on(AUDIT_STEP, audit_lead)?;
  workflows.register(lead);

  let mut upload = flows::upload_image::workflow::<AppError>()?;
  upload.on(AUDIT_STEP, audit_upload)?;
  workflows.register(upload);

  info!("All storefront workflows registered.");
  Ok(())
}

/// Handlers need every step to have run; a halted run is a conflict.
pub fn ensure_completed(outcome: Outcome) -> AppResult<()> {
  match outcome {
    Outcome::Completed => Ok(()),
    Outcome::Halted => Err(AppError::PipelineHaltedByHandler),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registers_every_workflow() {
    let workflows = Workflows::<AppError>::new();
    register_all_pipelines(&workflows).unwrap();
    assert!(workflows.is_registered::<SaveProduct>());
    assert!(workflows.is_registered::<LeadSubmission>());
    assert!(workflows.is_registered::<ImageUploadJob>());
  }
}
