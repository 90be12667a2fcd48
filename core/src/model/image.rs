// karat/src/model/image.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image uploaded through the media utility, remembered locally so the
/// operator can copy its URL into a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
  pub name: String,
  pub url: String,
  pub public_id: String,
  pub uploaded_at: DateTime<Utc>,
}
