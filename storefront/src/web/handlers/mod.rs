// storefront/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod catalog_handlers;
pub mod gate_handlers;
pub mod image_handlers;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::HttpRequest;
use serde::Deserialize;

/// `?confirm=true` on destructive routes.
#[derive(Deserialize, Debug, Default)]
pub struct ConfirmParams {
  #[serde(default)]
  pub confirm: bool,
}

/// `?name=` on raw-body image uploads.
#[derive(Deserialize, Debug, Default)]
pub struct UploadParams {
  #[serde(default)]
  pub name: String,
}

pub(crate) fn content_type(req: &HttpRequest) -> String {
  req
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string()
}
