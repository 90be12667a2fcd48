// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use karat::flows::{ImageUploadJob, SaveProduct};
use karat::model::GST_SLABS;
use karat::{admin, CatalogQuery, CatalogView, ImageUpload, LeadQuery, ProductForm, Shared};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{content_type, ConfirmParams, UploadParams};
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::ensure_completed;
use crate::state::AppState;

// --- Products ---

/// Every product, priced against the current rates.
#[instrument(name = "handler::admin_list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let view = CatalogView::load(app_state.store.as_ref(), &CatalogQuery::default(), &app_state.config.inquiry).await?;
  Ok(HttpResponse::Ok().json(view))
}

/// The edit form pre-filled from the stored product.
#[instrument(name = "handler::admin_product_form", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_form_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
  let id = path.into_inner();
  let product = app_state
    .store
    .get_product(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", id)))?;
  Ok(HttpResponse::Ok().json(ProductForm::from_product(&product)))
}

async fn run_save(app_state: &AppState, target: Option<Uuid>, form: ProductForm) -> AppResult<karat::Product> {
  let ctx = Shared::new(SaveProduct::new(app_state.store.clone(), target, form));
  ensure_completed(app_state.workflows.run(ctx.clone()).await?)?;
  let saved = ctx.read().saved.clone();
  saved.ok_or_else(|| AppError::Internal("product save finished without a record".to_string()))
}

#[instrument(name = "handler::admin_create_product", skip(app_state, form), fields(barcode = %form.barcode))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  form: web::Json<ProductForm>,
) -> AppResult<HttpResponse> {
  let product = run_save(&app_state, None, form.into_inner()).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::admin_update_product", skip(app_state, path, form), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  form: web::Json<ProductForm>,
) -> AppResult<HttpResponse> {
  let product = run_save(&app_state, Some(path.into_inner()), form.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::admin_delete_product", skip(app_state, path, params), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  params: web::Query<ConfirmParams>,
) -> AppResult<HttpResponse> {
  admin::delete_product(app_state.store.as_ref(), path.into_inner(), params.confirm).await?;
  Ok(HttpResponse::NoContent().finish())
}

/// Sends a product photo to the media host and returns its URL. The local
/// image library is left alone.
#[instrument(name = "handler::admin_product_image", skip(req, app_state, params, body), fields(bytes = body.len()))]
pub async fn upload_product_image_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  params: web::Query<UploadParams>,
  body: web::Bytes,
) -> AppResult<HttpResponse> {
  let upload = ImageUpload::new(params.into_inner().name, content_type(&req), body.to_vec());
  let ctx = Shared::new(ImageUploadJob::for_product(
    app_state.media.clone(),
    app_state.config.upload_limits.clone(),
    upload,
  ));
  ensure_completed(app_state.workflows.run(ctx.clone()).await?)?;
  let hosted = ctx
    .read()
    .hosted
    .clone()
    .ok_or_else(|| AppError::Internal("product image upload finished without a URL".to_string()))?;
  Ok(HttpResponse::Created().json(hosted))
}

// --- Rates ---

#[instrument(name = "handler::admin_get_rates", skip(app_state))]
pub async fn get_rates_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let rates = app_state.store.gold_rates().await?;
  Ok(HttpResponse::Ok().json(rates))
}

/// `{"22": "6000", "24": ""}`; blank grades become unavailable.
#[instrument(name = "handler::admin_put_rates", skip(app_state, form))]
pub async fn put_rates_handler(
  app_state: web::Data<AppState>,
  form: web::Json<BTreeMap<String, String>>,
) -> AppResult<HttpResponse> {
  let rates = admin::parse_gold_rates(&form)?;
  admin::save_gold_rates(app_state.store.as_ref(), rates.clone()).await?;
  Ok(HttpResponse::Ok().json(rates))
}

#[derive(Deserialize, Debug)]
pub struct GstPayload {
  pub gst_rate: String,
}

#[instrument(name = "handler::admin_get_gst", skip(app_state))]
pub async fn get_gst_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let stored = app_state.store.gst_rate().await?;
  let effective = app_state.store.rate_config().await?.gst_rate;
  Ok(HttpResponse::Ok().json(json!({ "gst_rate": effective, "stored": stored, "slabs": GST_SLABS })))
}

#[instrument(name = "handler::admin_put_gst", skip(app_state), fields(raw = %payload.gst_rate))]
pub async fn put_gst_handler(app_state: web::Data<AppState>, payload: web::Json<GstPayload>) -> AppResult<HttpResponse> {
  let gst_rate = admin::parse_percent("gst_rate", &payload.gst_rate)?;
  admin::save_gst_rate(app_state.store.as_ref(), gst_rate).await?;
  Ok(HttpResponse::Ok().json(json!({ "gst_rate": gst_rate })))
}

// --- Leads ---

#[instrument(name = "handler::admin_list_leads", skip(app_state, query))]
pub async fn list_leads_handler(
  app_state: web::Data<AppState>,
  query: web::Query<LeadQuery>,
) -> AppResult<HttpResponse> {
  let all = app_state.store.list_leads().await?;
  let total = all.len();
  let leads = query.filter(all);
  Ok(HttpResponse::Ok().json(json!({ "total": total, "shown": leads.len(), "leads": leads })))
}

#[instrument(name = "handler::admin_delete_lead", skip(app_state, path, params), fields(lead_id = %path.as_ref()))]
pub async fn delete_lead_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  params: web::Query<ConfirmParams>,
) -> AppResult<HttpResponse> {
  admin::delete_lead(app_state.store.as_ref(), path.into_inner(), params.confirm).await?;
  Ok(HttpResponse::NoContent().finish())
}
