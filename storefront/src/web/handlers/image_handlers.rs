// storefront/src/web/handlers/image_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use karat::flows::ImageUploadJob;
use karat::{ImageUpload, Shared};
use serde_json::json;
use tracing::{info, instrument};

use super::{content_type, ConfirmParams, UploadParams};
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::ensure_completed;
use crate::state::AppState;

#[instrument(name = "handler::list_images", skip(app_state))]
pub async fn list_images_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let images = app_state.images.list()?;
  Ok(HttpResponse::Ok().json(json!({ "count": images.len(), "images": images })))
}

/// Raw image body, `?name=` for the public id, `Content-Type` for the MIME.
#[instrument(name = "handler::upload_image", skip(req, app_state, params, body), fields(name = %params.name, bytes = body.len()))]
pub async fn upload_image_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  params: web::Query<UploadParams>,
  body: web::Bytes,
) -> AppResult<HttpResponse> {
  let upload = ImageUpload::new(params.into_inner().name, content_type(&req), body.to_vec());
  let ctx = Shared::new(ImageUploadJob::for_library(
    app_state.media.clone(),
    app_state.images.clone(),
    app_state.config.upload_limits.clone(),
    upload,
  ));
  ensure_completed(app_state.workflows.run(ctx.clone()).await?)?;

  let stored = ctx
    .read()
    .stored
    .clone()
    .ok_or_else(|| AppError::Internal("image upload finished without a record".to_string()))?;
  info!(image = %stored.name, "Image added to library.");
  Ok(HttpResponse::Created().json(stored))
}

#[instrument(name = "handler::delete_image", skip(app_state, path, params))]
pub async fn delete_image_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  params: web::Query<ConfirmParams>,
) -> AppResult<HttpResponse> {
  let removed = app_state.images.remove(&path.into_inner(), params.confirm)?;
  Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

#[instrument(name = "handler::clear_images", skip(app_state, params))]
pub async fn clear_images_handler(
  app_state: web::Data<AppState>,
  params: web::Query<ConfirmParams>,
) -> AppResult<HttpResponse> {
  let removed = app_state.images.clear(params.confirm)?;
  Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}
