// karat/src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::feed::{ChangeFeed, Subscription, Topic};
use super::DataStore;
use crate::error::{KaratError, KaratResult};
use crate::model::{GoldRates, Lead, NewLead, Product, ProductDraft};

#[derive(Debug, Default)]
struct MemoryState {
  products: Vec<Product>,
  leads: Vec<Lead>,
  gold_rates: GoldRates,
  gst_rate: Option<Decimal>,
}

/// In-process `DataStore`. Used by tests and by the server's `memory`
/// backend. Clones share the same state and change feed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<RwLock<MemoryState>>,
  feed: ChangeFeed,
  offline: Arc<AtomicBool>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn feed(&self) -> &ChangeFeed {
    &self.feed
  }

  /// Simulates an outage: while set, every write fails with a store error.
  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  fn ensure_online(&self, operation: &str) -> KaratResult<()> {
    if self.offline.load(Ordering::SeqCst) {
      warn!(operation, "Memory store is offline, rejecting write.");
      return Err(KaratError::store(anyhow::anyhow!("store unavailable during {}", operation)));
    }
    Ok(())
  }
}

#[async_trait]
impl DataStore for MemoryStore {
  async fn list_products(&self) -> KaratResult<Vec<Product>> {
    Ok(self.state.read().products.clone())
  }

  async fn get_product(&self, id: Uuid) -> KaratResult<Option<Product>> {
    Ok(self.state.read().products.iter().find(|p| p.id == id).cloned())
  }

  async fn add_product(&self, draft: ProductDraft) -> KaratResult<Product> {
    self.ensure_online("add_product")?;
    let product = draft.into_product(Uuid::new_v4(), Utc::now());
    self.state.write().products.push(product.clone());
    info!(product_id = %product.id, "Product added.");
    self.feed.publish(Topic::Products);
    Ok(product)
  }

  async fn update_product(&self, id: Uuid, draft: ProductDraft) -> KaratResult<Product> {
    self.ensure_online("update_product")?;
    let updated = {
      let mut state = self.state.write();
      let slot = state
        .products
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| KaratError::NotFound(format!("Product with ID {} not found.", id)))?;
      *slot = draft.into_product(id, slot.created_at);
      slot.clone()
    };
    info!(product_id = %id, "Product updated.");
    self.feed.publish(Topic::Products);
    Ok(updated)
  }

  async fn delete_product(&self, id: Uuid) -> KaratResult<bool> {
    self.ensure_online("delete_product")?;
    let removed = {
      let mut state = self.state.write();
      let before = state.products.len();
      state.products.retain(|p| p.id != id);
      state.products.len() != before
    };
    if removed {
      self.feed.publish(Topic::Products);
    }
    Ok(removed)
  }

  async fn list_leads(&self) -> KaratResult<Vec<Lead>> {
    Ok(self.state.read().leads.clone())
  }

  async fn add_lead(&self, lead: NewLead) -> KaratResult<Lead> {
    self.ensure_online("add_lead")?;
    let lead = lead.into_lead(Uuid::new_v4(), Utc::now());
    self.state.write().leads.push(lead.clone());
    self.feed.publish(Topic::Leads);
    Ok(lead)
  }

  async fn delete_lead(&self, id: Uuid) -> KaratResult<bool> {
    self.ensure_online("delete_lead")?;
    let removed = {
      let mut state = self.state.write();
      let before = state.leads.len();
      state.leads.retain(|l| l.id != id);
      state.leads.len() != before
    };
    if removed {
      self.feed.publish(Topic::Leads);
    }
    Ok(removed)
  }

  async fn gold_rates(&self) -> KaratResult<GoldRates> {
    Ok(self.state.read().gold_rates.clone())
  }

  async fn set_gold_rates(&self, rates: GoldRates) -> KaratResult<()> {
    self.ensure_online("set_gold_rates")?;
    self.state.write().gold_rates = rates;
    self.feed.publish(Topic::GoldRates);
    Ok(())
  }

  async fn gst_rate(&self) -> KaratResult<Option<Decimal>> {
    Ok(self.state.read().gst_rate)
  }

  async fn set_gst_rate(&self, gst_rate: Decimal) -> KaratResult<()> {
    self.ensure_online("set_gst_rate")?;
    self.state.write().gst_rate = Some(gst_rate);
    self.feed.publish(Topic::GstRate);
    Ok(())
  }

  fn watch(&self, topic: Topic) -> Subscription {
    self.feed.subscribe(topic)
  }
}
