// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use karat::{DataStore, ImageLibrary, MediaHost, Workflows};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn DataStore>,
  pub workflows: Arc<Workflows<AppError>>,
  pub media: Arc<dyn MediaHost>,
  /// The operator's uploaded-image list, kept on the server's disk.
  pub images: ImageLibrary,
  pub config: Arc<AppConfig>,
}
