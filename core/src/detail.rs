// karat/src/detail.rs

use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::{KaratError, KaratResult};
use crate::inquiry::InquiryConfig;
use crate::model::Product;
use crate::pricing::{price_product, DisplayBreakdown, PriceBreakdown};
use crate::store::DataStore;

/// A single product with its full price breakdown and inquiry link.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
  pub product: Product,
  pub price: DisplayBreakdown,
  #[serde(skip)]
  pub breakdown: PriceBreakdown,
  pub inquiry_message: String,
  pub inquiry_url: String,
}

impl ProductDetail {
  /// `NotFound` when no product has `id`.
  #[instrument(name = "ProductDetail::load", skip(store, inquiry))]
  pub async fn load(store: &dyn DataStore, id: Uuid, inquiry: &InquiryConfig) -> KaratResult<Self> {
    let product = store.get_product(id).await?.ok_or_else(|| {
      warn!(product_id = %id, "Product not found.");
      KaratError::NotFound(format!("Product with ID {} not found.", id))
    })?;
    let rates = store.rate_config().await?;
    let breakdown = price_product(&product, &rates);
    let inquiry_message = inquiry.detail_message(&product, &breakdown);
    let inquiry_url = inquiry.link(&inquiry_message)?.to_string();
    Ok(Self {
      price: breakdown.display(),
      breakdown,
      product,
      inquiry_message,
      inquiry_url,
    })
  }
}
