// storefront/src/main.rs

mod config;
mod db;
mod errors;
mod pipelines;
mod services;
mod state;
mod web;

use crate::config::{log_filter, AppConfig, StoreBackend, DEFAULT_LOG_FILTER};
use crate::db::PgStore;
use crate::errors::AppError;
use crate::services::{CloudinaryHost, UnconfiguredHost};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use karat::store::JsonFileStore;
use karat::{DataStore, ImageLibrary, MediaHost, MemoryStore, Workflows};
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::other(format!("{}: {}", context, err))
}

async fn open_store(config: &AppConfig) -> io::Result<Arc<dyn DataStore>> {
  let store: Arc<dyn DataStore> = match (config.store_backend, config.database_url.as_deref()) {
    (StoreBackend::Postgres, Some(url)) => {
      let pool = PgPool::connect(url)
        .await
        .map_err(|e| startup_error("Failed to connect to the database", e))?;
      tracing::info!("Successfully connected to the database.");
      let pg = PgStore::new(pool);
      pg.migrate().await.map_err(|e| startup_error("Schema migration failed", e))?;
      pg.spawn_change_relay()
        .await
        .map_err(|e| startup_error("Failed to start the change relay", e))?;
      Arc::new(pg)
    }
    (StoreBackend::Postgres, None) => {
      return Err(startup_error("Invalid configuration", "postgres backend without DATABASE_URL"));
    }
    (StoreBackend::Memory, _) => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  if config.seed_db {
    db::seed(store.as_ref(), config.default_gst_rate)
      .await
      .map_err(|e| startup_error("Failed to seed the store", e))?;
    tracing::info!("Store seeded.");
  }
  Ok(store)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(log_filter(DEFAULT_LOG_FILTER))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = AppConfig::from_env()
    .map(Arc::new)
    .map_err(|e| startup_error("Failed to load application configuration", e))?;

  let store = open_store(&app_config).await?;

  let media: Arc<dyn MediaHost> = match &app_config.cloudinary {
    Some(cloudinary) => Arc::new(CloudinaryHost::new(cloudinary.clone())),
    None => Arc::new(UnconfiguredHost),
  };

  let library_file = JsonFileStore::open(&app_config.image_library_path)
    .map_err(|e| startup_error("Failed to open the image library", e))?;
  let images = ImageLibrary::new(Arc::new(library_file));

  let workflows = Arc::new(Workflows::<AppError>::new());
  pipelines::register_all_pipelines(&workflows).map_err(|e| startup_error("Workflow registration failed", e))?;

  let app_state = AppState {
    store,
    workflows,
    media,
    images,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
      .default_service(actix_data::to(web::redirect_to_catalog))
  })
  .bind(&server_address)?
  .run()
  .await
}
