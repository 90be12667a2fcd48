// karat/src/media.rs

//! The image-upload utility: validate a file locally, push it to the media
//! host, and remember the hosted URL in a locally persisted list. Nothing is
//! ever deleted from the host.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{KaratError, KaratResult};
use crate::flow::Shared;
use crate::flows::upload_image::{self, ImageUploadJob};
use crate::model::UploadedImage;
use crate::store::local::UPLOADED_IMAGES_KEY;
use crate::store::LocalStore;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_FOLDER: &str = "gold-catalog";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
  pub max_bytes: usize,
  /// Folder tag sent with every upload.
  pub folder: String,
}

impl Default for UploadLimits {
  fn default() -> Self {
    Self {
      max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      folder: DEFAULT_FOLDER.to_string(),
    }
  }
}

/// A file chosen for upload plus the name the operator gave it.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
  pub name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ImageUpload")
      .field("name", &self.name)
      .field("content_type", &self.content_type)
      .field("len", &self.bytes.len())
      .finish()
  }
}

impl ImageUpload {
  pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      content_type: content_type.into(),
      bytes,
    }
  }

  pub fn trimmed_name(&self) -> &str {
    self.name.trim()
  }

  /// Checks size and MIME type. Size is checked first.
  pub fn check_file(&self, limits: &UploadLimits) -> KaratResult<()> {
    if self.bytes.len() > limits.max_bytes {
      return Err(KaratError::validation(format!(
        "File size should be less than {} bytes",
        limits.max_bytes
      )));
    }
    let mime = self.content_type.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") {
      return Err(KaratError::validation("Only image files are allowed"));
    }
    Ok(())
  }

  /// Library uploads: non-empty name, no case-insensitive duplicate, then the
  /// file checks.
  pub fn validate(&self, limits: &UploadLimits, library: &ImageLibrary) -> KaratResult<()> {
    let name = self.trimmed_name();
    if name.is_empty() {
      return Err(KaratError::validation("Please enter a name for the image"));
    }
    if library.contains_name(name)? {
      return Err(KaratError::validation(format!(
        "An image named '{}' already exists",
        name
      )));
    }
    self.check_file(limits)
  }
}

/// What is sent to the media host.
#[derive(Clone)]
pub struct HostUpload {
  pub public_id: String,
  pub folder: String,
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

impl fmt::Debug for HostUpload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HostUpload")
      .field("public_id", &self.public_id)
      .field("folder", &self.folder)
      .field("content_type", &self.content_type)
      .field("len", &self.bytes.len())
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedImage {
  pub url: String,
  pub public_id: String,
}

/// A hosted image API. One operation: upload.
#[async_trait]
pub trait MediaHost: Send + Sync {
  async fn upload(&self, upload: HostUpload) -> KaratResult<HostedImage>;
}

/// The locally persisted list of uploaded images, newest first.
///
/// Clones share one write lock, so list edits made through any clone never
/// interleave. Share the library by cloning it rather than opening a second
/// one over the same store.
#[derive(Clone)]
pub struct ImageLibrary {
  local: Arc<dyn LocalStore>,
  writes: Arc<Mutex<()>>,
}

impl ImageLibrary {
  pub fn new(local: Arc<dyn LocalStore>) -> Self {
    Self {
      local,
      writes: Arc::new(Mutex::new(())),
    }
  }

  pub fn list(&self) -> KaratResult<Vec<UploadedImage>> {
    Ok(self.local.as_ref().get_json(UPLOADED_IMAGES_KEY)?.unwrap_or_default())
  }

  pub fn contains_name(&self, name: &str) -> KaratResult<bool> {
    let wanted = name.trim().to_lowercase();
    Ok(self.list()?.iter().any(|img| img.name.to_lowercase() == wanted))
  }

  pub fn prepend(&self, image: UploadedImage) -> KaratResult<()> {
    let _guard = self.writes.lock();
    let mut images = self.list()?;
    images.insert(0, image);
    self.local.as_ref().set_json(UPLOADED_IMAGES_KEY, &images)
  }

  /// Drops the local entry only; the hosted file stays. Matching is
  /// case-insensitive.
  #[instrument(name = "ImageLibrary::remove", skip(self))]
  pub fn remove(&self, name: &str, confirmed: bool) -> KaratResult<UploadedImage> {
    if !confirmed {
      return Err(KaratError::ConfirmationRequired(format!(
        "Deleting image '{}' must be confirmed.",
        name
      )));
    }
    let wanted = name.trim().to_lowercase();
    let _guard = self.writes.lock();
    let mut images = self.list()?;
    let idx = images
      .iter()
      .position(|img| img.name.to_lowercase() == wanted)
      .ok_or_else(|| KaratError::NotFound(format!("Image '{}' not found.", name.trim())))?;
    let removed = images.remove(idx);
    self.local.as_ref().set_json(UPLOADED_IMAGES_KEY, &images)?;
    info!(image = %removed.name, "Image removed from local library.");
    Ok(removed)
  }

  /// Empties the local list.
  pub fn clear(&self, confirmed: bool) -> KaratResult<usize> {
    if !confirmed {
      return Err(KaratError::ConfirmationRequired("Clearing all images must be confirmed.".to_string()));
    }
    let _guard = self.writes.lock();
    let count = self.list()?.len();
    self.local.remove(UPLOADED_IMAGES_KEY)?;
    warn!(count, "Local image library cleared.");
    Ok(count)
  }

  /// Validates, uploads under the chosen name and prepends the record.
  /// Validation failures never reach `host`.
  pub async fn upload(
    &self,
    host: Arc<dyn MediaHost>,
    limits: &UploadLimits,
    upload: ImageUpload,
  ) -> KaratResult<UploadedImage> {
    let ctx = Shared::new(ImageUploadJob::for_library(host, self.clone(), limits.clone(), upload));
    upload_image::workflow::<KaratError>()?.run(ctx.clone()).await?;
    let stored = ctx.read().stored.clone();
    stored.ok_or_else(|| KaratError::Internal("image upload finished without a record".to_string()))
  }
}

/// Builds the record kept in the library for a successful upload.
pub fn library_record(name: &str, hosted: HostedImage) -> UploadedImage {
  UploadedImage {
    name: name.trim().to_string(),
    url: hosted.url,
    public_id: hosted.public_id,
    uploaded_at: Utc::now(),
  }
}

/// Admin product-image upload: the item name, or `product_<millis>` when the
/// name is blank, becomes the public id. The library is not touched.
pub async fn upload_product_image(
  host: Arc<dyn MediaHost>,
  limits: &UploadLimits,
  upload: ImageUpload,
) -> KaratResult<HostedImage> {
  let ctx = Shared::new(ImageUploadJob::for_product(host, limits.clone(), upload));
  upload_image::workflow::<KaratError>()?.run(ctx.clone()).await?;
  let hosted = ctx.read().hosted.clone();
  hosted.ok_or_else(|| KaratError::Internal("product image upload finished without a URL".to_string()))
}

pub fn product_public_id(name: &str) -> String {
  let name = name.trim();
  if name.is_empty() {
    format!("product_{}", Utc::now().timestamp_millis())
  } else {
    name.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_product_name_gets_generated_public_id() {
    assert_eq!(product_public_id(" Lotus Ring "), "Lotus Ring");
    assert!(product_public_id("  ").starts_with("product_"));
  }

  #[test]
  fn file_checks_reject_large_and_non_images() {
    let limits = UploadLimits {
      max_bytes: 4,
      ..Default::default()
    };
    assert!(ImageUpload::new("a", "image/png", vec![0; 4]).check_file(&limits).is_ok());
    assert!(ImageUpload::new("a", "image/png", vec![0; 5]).check_file(&limits).is_err());
    assert!(ImageUpload::new("a", "application/pdf", vec![0; 1]).check_file(&limits).is_err());
  }
}
