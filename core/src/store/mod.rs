// karat/src/store/mod.rs

//! The persistence boundary. Views and workflows only ever see these traits;
//! the concrete backend (in-memory, PostgreSQL, a cookie jar, a JSON file)
//! is injected by whoever builds them.

pub mod feed;
pub mod local;
pub mod memory;

pub use feed::{ChangeFeed, Subscription, Topic};
pub use local::{JsonFileStore, LocalStore, MemoryLocalStore};
pub use memory::MemoryStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::KaratResult;
use crate::model::{GoldRates, Lead, NewLead, Product, ProductDraft, RateConfig};

/// The shared, hosted data store: the product collection, the lead
/// collection and the two singleton rate values.
///
/// Writes are last-writer-wins; there is no optimistic-concurrency check.
#[async_trait]
pub trait DataStore: Send + Sync {
  async fn list_products(&self) -> KaratResult<Vec<Product>>;

  async fn get_product(&self, id: Uuid) -> KaratResult<Option<Product>>;

  /// Appends a product with a fresh id and creation timestamp.
  async fn add_product(&self, draft: ProductDraft) -> KaratResult<Product>;

  /// Overwrites every writable field of an existing product, keeping its id
  /// and creation timestamp. `NotFound` when `id` is unknown.
  async fn update_product(&self, id: Uuid, draft: ProductDraft) -> KaratResult<Product>;

  /// Returns whether a record was removed.
  async fn delete_product(&self, id: Uuid) -> KaratResult<bool>;

  async fn list_leads(&self) -> KaratResult<Vec<Lead>>;

  async fn add_lead(&self, lead: NewLead) -> KaratResult<Lead>;

  async fn delete_lead(&self, id: Uuid) -> KaratResult<bool>;

  async fn gold_rates(&self) -> KaratResult<GoldRates>;

  /// Replaces the whole rate table in one write.
  async fn set_gold_rates(&self, rates: GoldRates) -> KaratResult<()>;

  async fn gst_rate(&self) -> KaratResult<Option<Decimal>>;

  async fn set_gst_rate(&self, gst_rate: Decimal) -> KaratResult<()>;

  /// Subscribes to changes on `topic`.
  fn watch(&self, topic: Topic) -> Subscription;

  async fn rate_config(&self) -> KaratResult<RateConfig> {
    let gold_rates = self.gold_rates().await?;
    let gst_rate = self.gst_rate().await?;
    Ok(RateConfig::from_stored(gold_rates, gst_rate))
  }
}
