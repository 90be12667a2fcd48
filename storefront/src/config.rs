// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use karat::inquiry::InquiryConfig;
use karat::media::UploadLimits;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// `RUST_LOG` when it parses, otherwise `fallback`.
pub fn log_filter(fallback: &str) -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StoreBackend::Postgres),
      "memory" | "mem" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
  pub cloud_name: String,
  pub upload_preset: String,
  /// Overrides the public API root, e.g. for a local stub.
  pub api_base: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub seed_db: bool,

  /// `None` when no media host is configured; uploads then fail with 502.
  pub cloudinary: Option<CloudinaryConfig>,
  pub upload_limits: UploadLimits,
  pub image_library_path: PathBuf,

  pub inquiry: InquiryConfig,
  pub default_gst_rate: Decimal,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let database_url = get_env("DATABASE_URL").ok();
    let store_backend = match get_env("STORE_BACKEND") {
      Ok(raw) => raw.parse::<StoreBackend>()?,
      Err(_) if database_url.is_some() => StoreBackend::Postgres,
      Err(_) => StoreBackend::Memory,
    };
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config("STORE_BACKEND=postgres requires DATABASE_URL".to_string()));
    }

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    let cloudinary = match (get_env("CLOUDINARY_CLOUD_NAME"), get_env("CLOUDINARY_UPLOAD_PRESET")) {
      (Ok(cloud_name), Ok(upload_preset)) => Some(CloudinaryConfig {
        cloud_name,
        upload_preset,
        api_base: get_env("CLOUDINARY_API_BASE").ok(),
      }),
      _ => {
        tracing::warn!("Cloudinary is not configured; image uploads will be rejected.");
        None
      }
    };

    let defaults = UploadLimits::default();
    let upload_limits = UploadLimits {
      max_bytes: match get_env("MAX_UPLOAD_BYTES") {
        Ok(raw) => raw
          .parse::<usize>()
          .map_err(|e| AppError::Config(format!("Invalid MAX_UPLOAD_BYTES: {}", e)))?,
        Err(_) => defaults.max_bytes,
      },
      folder: get_env("CLOUDINARY_FOLDER").unwrap_or(defaults.folder),
    };
    let image_library_path =
      PathBuf::from(get_env("IMAGE_LIBRARY_PATH").unwrap_or_else(|_| "./data/uploaded_images.json".to_string()));

    let inquiry_defaults = InquiryConfig::default();
    let inquiry = InquiryConfig {
      phone: get_env("INQUIRY_PHONE").unwrap_or(inquiry_defaults.phone),
      business_name: get_env("BUSINESS_NAME").unwrap_or(inquiry_defaults.business_name),
    };

    let default_gst_rate = match get_env("DEFAULT_GST_RATE") {
      Ok(raw) => karat::admin::parse_percent("DEFAULT_GST_RATE", &raw)
        .map_err(|e| AppError::Config(format!("Invalid DEFAULT_GST_RATE: {}", e)))?,
      Err(_) => karat::model::DEFAULT_GST_RATE,
    };

    tracing::info!(backend = ?store_backend, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      seed_db,
      cloudinary,
      upload_limits,
      image_library_path,
      inquiry,
      default_gst_rate,
    })
  }

  /// Configuration for in-process tests: memory store, default limits.
  #[cfg(test)]
  pub fn for_tests() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      store_backend: StoreBackend::Memory,
      database_url: None,
      seed_db: false,
      cloudinary: None,
      upload_limits: UploadLimits::default(),
      image_library_path: PathBuf::from("unused.json"),
      inquiry: InquiryConfig::default(),
      default_gst_rate: karat::model::DEFAULT_GST_RATE,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const VARS: [&str; 6] = [
    "STORE_BACKEND",
    "DATABASE_URL",
    "SERVER_PORT",
    "DEFAULT_GST_RATE",
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_UPLOAD_PRESET",
  ];

  fn clear_env() {
    for var in VARS {
      env::remove_var(var);
    }
  }

  #[test]
  #[serial]
  fn defaults_to_memory_without_database_url() {
    clear_env();
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert_eq!(config.server_port, 8080);
    assert!(config.cloudinary.is_none());
    assert_eq!(config.default_gst_rate, karat::model::DEFAULT_GST_RATE);
  }

  #[test]
  #[serial]
  fn database_url_selects_postgres() {
    clear_env();
    env::set_var("DATABASE_URL", "postgres://localhost/karat");
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.store_backend, StoreBackend::Postgres);
    clear_env();
  }

  #[test]
  #[serial]
  fn postgres_backend_requires_database_url() {
    clear_env();
    env::set_var("STORE_BACKEND", "postgres");
    assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
    clear_env();
  }

  #[test]
  #[serial]
  fn log_filter_defaults_to_info_and_honours_rust_log() {
    env::remove_var("RUST_LOG");
    assert_eq!(log_filter(DEFAULT_LOG_FILTER).to_string(), "info");

    env::set_var("RUST_LOG", "storefront=debug");
    assert_eq!(log_filter(DEFAULT_LOG_FILTER).to_string(), "storefront=debug");
    env::remove_var("RUST_LOG");
  }

  #[test]
  #[serial]
  fn rejects_out_of_range_gst_default() {
    clear_env();
    env::set_var("DEFAULT_GST_RATE", "250");
    assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
    clear_env();
  }
}
