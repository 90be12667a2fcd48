// storefront/src/web/routes.rs

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse};

use crate::errors::CATALOG_PATH;
use crate::web::handlers::{admin_handlers, catalog_handlers, gate_handlers, image_handlers};

/// Raw image bodies may exceed actix's 256 KiB default; the size check
/// itself happens in the upload workflow so oversize files get a 400.
const IMAGE_PAYLOAD_LIMIT: usize = 16 * 1024 * 1024;

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for every unknown path.
pub async fn redirect_to_catalog() -> HttpResponse {
  HttpResponse::Found().insert_header((LOCATION, CATALOG_PATH)).finish()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Public catalog
      .service(
        web::scope("/catalog")
          .route("", web::get().to(catalog_handlers::list_catalog_handler))
          .route("/live", web::get().to(catalog_handlers::live_catalog_handler)),
      )
      .route(
        "/products/{product_id}",
        web::get().to(catalog_handlers::product_detail_handler),
      )
      // Lead-capture gate
      .service(
        web::scope("/gate")
          .route("", web::get().to(gate_handlers::gate_state_handler))
          .route("/submit", web::post().to(gate_handlers::submit_lead_handler))
          .route("/skip", web::post().to(gate_handlers::skip_gate_handler)),
      )
      // Admin panel
      .service(
        web::scope("/admin")
          .service(
            web::resource("/products")
              .route(web::get().to(admin_handlers::list_products_handler))
              .route(web::post().to(admin_handlers::create_product_handler)),
          )
          .service(
            web::resource("/products/image")
              .app_data(web::PayloadConfig::new(IMAGE_PAYLOAD_LIMIT))
              .route(web::post().to(admin_handlers::upload_product_image_handler)),
          )
          .service(
            web::resource("/products/{product_id}")
              .route(web::get().to(admin_handlers::product_form_handler))
              .route(web::put().to(admin_handlers::update_product_handler))
              .route(web::delete().to(admin_handlers::delete_product_handler)),
          )
          .service(
            web::resource("/rates")
              .route(web::get().to(admin_handlers::get_rates_handler))
              .route(web::put().to(admin_handlers::put_rates_handler)),
          )
          .service(
            web::resource("/gst")
              .route(web::get().to(admin_handlers::get_gst_handler))
              .route(web::put().to(admin_handlers::put_gst_handler)),
          )
          .route("/leads", web::get().to(admin_handlers::list_leads_handler))
          .route("/leads/{lead_id}", web::delete().to(admin_handlers::delete_lead_handler)),
      )
      // Image upload utility
      .service(
        web::resource("/images")
          .app_data(web::PayloadConfig::new(IMAGE_PAYLOAD_LIMIT))
          .route(web::get().to(image_handlers::list_images_handler))
          .route(web::post().to(image_handlers::upload_image_handler))
          .route(web::delete().to(image_handlers::clear_images_handler)),
      )
      .route("/images/{name}", web::delete().to(image_handlers::delete_image_handler)),
  );
}
