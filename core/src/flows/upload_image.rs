// karat/src/flows/upload_image.rs

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{KaratError, KaratResult};
use crate::flow::{Shared, StepControl, Workflow};
use crate::media::{library_record, product_public_id, HostUpload, HostedImage, ImageLibrary, ImageUpload, MediaHost, UploadLimits};
use crate::model::UploadedImage;

use super::AUDIT_STEP;

#[derive(Clone)]
pub enum UploadTarget {
  /// The image utility: duplicate-checked and remembered locally.
  Library(ImageLibrary),
  /// A product form image: only the hosted URL is returned.
  Product,
}

pub struct ImageUploadJob {
  pub host: Arc<dyn MediaHost>,
  pub target: UploadTarget,
  pub limits: UploadLimits,
  pub upload: ImageUpload,
  pub public_id: Option<String>,
  pub hosted: Option<HostedImage>,
  pub stored: Option<UploadedImage>,
}

impl ImageUploadJob {
  fn new(host: Arc<dyn MediaHost>, target: UploadTarget, limits: UploadLimits, upload: ImageUpload) -> Self {
    Self {
      host,
      target,
      limits,
      upload,
      public_id: None,
      hosted: None,
      stored: None,
    }
  }

  pub fn for_library(host: Arc<dyn MediaHost>, library: ImageLibrary, limits: UploadLimits, upload: ImageUpload) -> Self {
    Self::new(host, UploadTarget::Library(library), limits, upload)
  }

  pub fn for_product(host: Arc<dyn MediaHost>, limits: UploadLimits, upload: ImageUpload) -> Self {
    Self::new(host, UploadTarget::Product, limits, upload)
  }

  fn library(&self) -> Option<&ImageLibrary> {
    match &self.target {
      UploadTarget::Library(lib) => Some(lib),
      UploadTarget::Product => None,
    }
  }
}

async fn validate(ctx: Shared<ImageUploadJob>) -> KaratResult<StepControl> {
  let checked = {
    let job = ctx.read();
    match job.library() {
      Some(lib) => job
        .upload
        .validate(&job.limits, lib)
        .map(|_| job.upload.trimmed_name().to_string()),
      None => job
        .upload
        .check_file(&job.limits)
        .map(|_| product_public_id(&job.upload.name)),
    }
  };
  match checked {
    Ok(public_id) => {
      ctx.write().public_id = Some(public_id);
      Ok(StepControl::Continue)
    }
    Err(e) => {
      warn!(error = %e, "Upload rejected before reaching the media host.");
      Err(e)
    }
  }
}

async fn push_to_host(ctx: Shared<ImageUploadJob>) -> KaratResult<StepControl> {
  let (host, request) = {
    let job = ctx.read();
    let public_id = job
      .public_id
      .clone()
      .ok_or_else(|| KaratError::Internal("upload ran before validation".to_string()))?;
    let request = HostUpload {
      file_name: public_id.clone(),
      public_id,
      folder: job.limits.folder.clone(),
      content_type: job.upload.content_type.clone(),
      bytes: job.upload.bytes.clone(),
    };
    (job.host.clone(), request)
  };

  let hosted = host.upload(request).await?;
  info!(public_id = %hosted.public_id, url = %hosted.url, "Image uploaded.");
  ctx.write().hosted = Some(hosted);
  Ok(StepControl::Continue)
}

async fn remember(ctx: Shared<ImageUploadJob>) -> KaratResult<StepControl> {
  let record = {
    let job = ctx.read();
    let hosted = job
      .hosted
      .clone()
      .ok_or_else(|| KaratError::Internal("remember ran before upload".to_string()))?;
    let record = library_record(&job.upload.name, hosted);
    if let Some(lib) = job.library() {
      lib.prepend(record.clone())?;
    }
    record
  };
  ctx.write().stored = Some(record);
  Ok(StepControl::Continue)
}

pub fn workflow<E>() -> Result<Workflow<ImageUploadJob, E>, KaratError>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  let mut wf = Workflow::new(
    "upload_image",
    &[("validate", false), ("upload", false), ("remember", false), (AUDIT_STEP, true)],
  );
  wf.on("validate", validate)?;
  wf.on("upload", push_to_host)?;
  wf.on("remember", remember)?;
  wf.skip_if("remember", Arc::new(|job: &ImageUploadJob| job.library().is_none()))?;
  Ok(wf)
}
