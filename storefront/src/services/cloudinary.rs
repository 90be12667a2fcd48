// storefront/src/services/cloudinary.rs

//! Unsigned Cloudinary uploads (`upload_preset`) over reqwest multipart.

use async_trait::async_trait;
use karat::media::{HostUpload, HostedImage, MediaHost};
use karat::{KaratError, KaratResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct CloudinaryHost {
  config: CloudinaryConfig,
  http: Client,
  base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
  secure_url: Option<String>,
  public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
  error: Option<ErrorBody>,
  message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: String,
}

impl CloudinaryHost {
  pub fn new(config: CloudinaryConfig) -> Self {
    let base_url = config.api_base.clone().unwrap_or_else(|| API_BASE.to_string());
    Self {
      config,
      http: Client::new(),
      base_url,
    }
  }

  fn upload_url(&self) -> String {
    format!("{}/{}/image/upload", self.base_url.trim_end_matches('/'), self.config.cloud_name)
  }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
  #[instrument(name = "CloudinaryHost::upload", skip(self, upload), fields(public_id = %upload.public_id, bytes = upload.bytes.len()))]
  async fn upload(&self, upload: HostUpload) -> KaratResult<HostedImage> {
    let file = Part::bytes(upload.bytes)
      .file_name(upload.file_name)
      .mime_str(&upload.content_type)
      .map_err(|e| KaratError::validation(format!("Invalid content type: {}", e)))?;
    let form = Form::new()
      .part("file", file)
      .text("upload_preset", self.config.upload_preset.clone())
      .text("public_id", upload.public_id)
      .text("folder", upload.folder);

    let response = self
      .http
      .post(self.upload_url())
      .multipart(form)
      .send()
      .await
      .map_err(|e| {
        error!(error = %e, "Media host request failed.");
        KaratError::MediaHost(format!("upload request failed: {}", e))
      })?;

    if !response.status().is_success() {
      let status = response.status();
      let text = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .and_then(|body| body.error.map(|e| e.message).or(body.message))
        .unwrap_or_else(|| format!("upload failed with status {}", status));
      error!(%status, %message, "Media host rejected the upload.");
      return Err(KaratError::MediaHost(message));
    }

    let parsed: UploadResponse = response
      .json()
      .await
      .map_err(|e| KaratError::MediaHost(format!("unreadable upload response: {}", e)))?;
    match (parsed.secure_url, parsed.public_id) {
      (Some(url), Some(public_id)) => {
        info!(%url, "Media host accepted the upload.");
        Ok(HostedImage { url, public_id })
      }
      _ => Err(KaratError::MediaHost("upload response had no secure_url".to_string())),
    }
  }
}

/// Stands in when no media host is configured: every upload is refused.
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredHost;

#[async_trait]
impl MediaHost for UnconfiguredHost {
  async fn upload(&self, _upload: HostUpload) -> KaratResult<HostedImage> {
    Err(KaratError::MediaHost("no media host is configured".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn upload_url_includes_cloud_name() {
    let config = CloudinaryConfig {
      cloud_name: "bhamare".into(),
      upload_preset: "unsigned".into(),
      api_base: None,
    };
    let host = CloudinaryHost::new(config.clone());
    assert_eq!(host.upload_url(), "https://api.cloudinary.com/v1_1/bhamare/image/upload");

    let stub = CloudinaryHost::new(CloudinaryConfig {
      api_base: Some("http://localhost:9000/v1_1/".into()),
      ..config
    });
    assert_eq!(stub.upload_url(), "http://localhost:9000/v1_1/bhamare/image/upload");
  }
}
