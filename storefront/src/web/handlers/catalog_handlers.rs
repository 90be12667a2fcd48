// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::http::header::CACHE_CONTROL;
use actix_web::{web, HttpResponse};
use futures_util::stream::{self, Stream, StreamExt};
use karat::{CatalogQuery, CatalogView, CategoryFilter, LiveCatalog, ProductDetail};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct CatalogParams {
  pub search: Option<String>,
  pub category: Option<String>,
}

impl CatalogParams {
  fn into_query(self) -> AppResult<CatalogQuery> {
    let category = match self.category.as_deref() {
      Some(raw) => raw.parse::<CategoryFilter>()?,
      None => CategoryFilter::All,
    };
    Ok(CatalogQuery::new(self.search, category))
  }
}

#[instrument(name = "handler::list_catalog", skip(app_state, params))]
pub async fn list_catalog_handler(
  app_state: web::Data<AppState>,
  params: web::Query<CatalogParams>,
) -> AppResult<HttpResponse> {
  let query = params.into_inner().into_query()?;
  let view = CatalogView::load(app_state.store.as_ref(), &query, &app_state.config.inquiry).await?;
  info!(shown = view.len(), total = view.total_products, "Catalog served.");
  Ok(HttpResponse::Ok().json(json!({
    "search": query.search,
    "category": query.category.to_string(),
    "catalog": view,
  })))
}

fn catalog_event(view: &CatalogView) -> Result<web::Bytes, serde_json::Error> {
  let data = serde_json::to_string(view)?;
  Ok(web::Bytes::from(format!("event: catalog\ndata: {}\n\n", data)))
}

/// The opening view followed by one event per store change. Dropping the
/// stream releases the subscriptions.
pub fn catalog_events(
  live: LiveCatalog,
  opening: web::Bytes,
) -> impl Stream<Item = Result<web::Bytes, Infallible>> {
  let updates = stream::unfold(live, |mut live| async move {
    let view = match live.next_view().await {
      Ok(view) => view,
      Err(e) => {
        debug!(error = %e, "Live catalog closed.");
        return None;
      }
    };
    match catalog_event(&view) {
      Ok(bytes) => Some((Ok::<_, Infallible>(bytes), live)),
      Err(e) => {
        warn!(error = %e, "Could not encode catalog event; closing stream.");
        None
      }
    }
  });
  stream::once(async move { Ok::<_, Infallible>(opening) }).chain(updates)
}

#[instrument(name = "handler::live_catalog", skip(app_state, params))]
pub async fn live_catalog_handler(
  app_state: web::Data<AppState>,
  params: web::Query<CatalogParams>,
) -> AppResult<HttpResponse> {
  let query = params.into_inner().into_query()?;
  let live = LiveCatalog::open(app_state.store.clone(), query, app_state.config.inquiry.clone());
  let first = live.current().await?;
  let opening = catalog_event(&first).map_err(|e| AppError::Internal(format!("catalog encoding failed: {}", e)))?;
  info!(shown = first.len(), "Live catalog subscribed.");

  Ok(
    HttpResponse::Ok()
      .insert_header((CACHE_CONTROL, "no-cache"))
      .content_type("text/event-stream")
      .streaming(catalog_events(live, opening)),
  )
}

#[instrument(name = "handler::product_detail", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_detail_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
  let id = path.into_inner();
  let detail = ProductDetail::load(app_state.store.as_ref(), id, &app_state.config.inquiry).await?;
  Ok(HttpResponse::Ok().json(detail))
}

#[cfg(test)]
mod tests {
  use super::*;
  use karat::{DataStore, InquiryConfig, MemoryStore};
  use rust_decimal::Decimal;
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn live_events_follow_rate_changes() {
    let store = Arc::new(MemoryStore::new());
    let live = LiveCatalog::open(store.clone(), CatalogQuery::default(), InquiryConfig::default());
    let first = live.current().await.unwrap();
    let mut events = Box::pin(catalog_events(live, catalog_event(&first).unwrap()));

    let opening = events.next().await.unwrap().unwrap();
    assert!(opening.starts_with(b"event: catalog\n"));

    store.set_gst_rate(Decimal::new(5, 0)).await.unwrap();
    let next = tokio::time::timeout(Duration::from_secs(2), events.next())
      .await
      .expect("an event after the GST change")
      .unwrap()
      .unwrap();
    let text = String::from_utf8(next.to_vec()).unwrap();
    assert!(text.contains("\"gst_rate\":\"5\""), "{}", text);
  }

  #[test]
  fn unknown_category_is_rejected() {
    let params = CatalogParams {
      search: None,
      category: Some("tiara".into()),
    };
    assert!(matches!(params.into_query(), Err(AppError::Validation(_))));
  }
}
