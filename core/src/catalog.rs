// karat/src/catalog.rs

//! The public listing: filter the live product collection by a search term
//! and a category, price every visible item against the current rates, and
//! rebuild whenever the products or either rate value change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{KaratError, KaratResult};
use crate::inquiry::InquiryConfig;
use crate::model::{Category, Lead, Product, RateConfig};
use crate::pricing::{price_product, DisplayBreakdown, PriceBreakdown};
use crate::store::{DataStore, Subscription, Topic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
  #[default]
  All,
  Only(Category),
}

impl CategoryFilter {
  pub fn admits(&self, category: Category) -> bool {
    match self {
      CategoryFilter::All => true,
      CategoryFilter::Only(wanted) => *wanted == category,
    }
  }
}

impl fmt::Display for CategoryFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CategoryFilter::All => f.write_str("all"),
      CategoryFilter::Only(c) => c.fmt(f),
    }
  }
}

impl FromStr for CategoryFilter {
  type Err = KaratError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("all") {
      return Ok(CategoryFilter::All);
    }
    s.parse().map(CategoryFilter::Only)
  }
}

/// Search term plus category filter. An empty or whitespace search term
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
  pub search: Option<String>,
  pub category: CategoryFilter,
}

impl CatalogQuery {
  pub fn new(search: Option<String>, category: CategoryFilter) -> Self {
    Self { search, category }
  }

  fn needle(&self) -> Option<String> {
    self
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_lowercase)
  }

  pub fn matches(&self, product: &Product) -> bool {
    if !self.category.admits(product.category) {
      return false;
    }
    match self.needle() {
      None => true,
      Some(needle) => {
        product.name.to_lowercase().contains(&needle) || product.barcode.to_lowercase().contains(&needle)
      }
    }
  }
}

/// One listed product with its freshly computed price and the WhatsApp
/// link behind its inquiry button.
#[derive(Debug, Clone, Serialize)]
pub struct PricedProduct {
  #[serde(flatten)]
  pub product: Product,
  pub price: DisplayBreakdown,
  #[serde(skip)]
  pub breakdown: PriceBreakdown,
  pub inquiry_url: Option<String>,
}

impl PricedProduct {
  pub fn new(product: Product, rates: &RateConfig, inquiry: &InquiryConfig) -> Self {
    let breakdown = price_product(&product, rates);
    let inquiry_url = match inquiry.link(&inquiry.card_message(&product, &breakdown)) {
      Ok(url) => Some(url.into()),
      Err(e) => {
        warn!(error = %e, product_id = %product.id, "No inquiry link for catalog card.");
        None
      }
    };
    Self {
      price: breakdown.display(),
      product,
      breakdown,
      inquiry_url,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
  pub items: Vec<PricedProduct>,
  pub rates: RateConfig,
  /// Size of the unfiltered collection.
  pub total_products: usize,
}

impl CatalogView {
  /// Filters `products` (kept in store order) and prices each survivor.
  pub fn build(products: Vec<Product>, rates: &RateConfig, query: &CatalogQuery, inquiry: &InquiryConfig) -> Self {
    let total_products = products.len();
    let items = products
      .into_iter()
      .filter(|p| query.matches(p))
      .map(|p| PricedProduct::new(p, rates, inquiry))
      .collect();
    Self {
      items,
      rates: rates.clone(),
      total_products,
    }
  }

  pub async fn load(store: &dyn DataStore, query: &CatalogQuery, inquiry: &InquiryConfig) -> KaratResult<Self> {
    let products = store.list_products().await?;
    let rates = store.rate_config().await?;
    Ok(Self::build(products, &rates, query, inquiry))
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

/// A catalog bound to live store subscriptions on the product collection,
/// the gold rates and the GST rate. Dropping it releases all three.
pub struct LiveCatalog {
  store: Arc<dyn DataStore>,
  query: CatalogQuery,
  inquiry: InquiryConfig,
  products: Subscription,
  gold_rates: Subscription,
  gst_rate: Subscription,
}

impl LiveCatalog {
  pub fn open(store: Arc<dyn DataStore>, query: CatalogQuery, inquiry: InquiryConfig) -> Self {
    let products = store.watch(Topic::Products);
    let gold_rates = store.watch(Topic::GoldRates);
    let gst_rate = store.watch(Topic::GstRate);
    Self {
      store,
      query,
      inquiry,
      products,
      gold_rates,
      gst_rate,
    }
  }

  pub fn query(&self) -> &CatalogQuery {
    &self.query
  }

  /// Replaces the filter. The next `current()` reflects it.
  pub fn set_query(&mut self, query: CatalogQuery) {
    self.query = query;
  }

  pub async fn current(&self) -> KaratResult<CatalogView> {
    CatalogView::load(self.store.as_ref(), &self.query, &self.inquiry).await
  }

  /// Waits for the next change on any watched topic and rebuilds the view.
  #[instrument(name = "LiveCatalog::next_view", skip(self), fields(query = ?self.query))]
  pub async fn next_view(&mut self) -> KaratResult<CatalogView> {
    let topic = tokio::select! {
      r = self.products.changed() => r.map(|_| Topic::Products)?,
      r = self.gold_rates.changed() => r.map(|_| Topic::GoldRates)?,
      r = self.gst_rate.changed() => r.map(|_| Topic::GstRate)?,
    };
    debug!(topic = topic.as_str(), "Catalog input changed, rebuilding.");
    self.current().await
  }

  pub fn release(self) {
    self.products.release();
    self.gold_rates.release();
    self.gst_rate.release();
  }
}

/// Admin user-list filter: name (case-insensitive) or phone substring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadQuery {
  pub search: Option<String>,
}

impl LeadQuery {
  pub fn matches(&self, lead: &Lead) -> bool {
    let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
      return true;
    };
    lead.name.to_lowercase().contains(&needle.to_lowercase()) || lead.phone.contains(needle)
  }

  pub fn filter(&self, leads: Vec<Lead>) -> Vec<Lead> {
    leads.into_iter().filter(|l| self.matches(l)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_filter_parses_all_and_names() {
    assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    assert_eq!(" ALL ".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    assert_eq!("".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    assert_eq!(
      "Bangle".parse::<CategoryFilter>().unwrap(),
      CategoryFilter::Only(Category::Bangle)
    );
    assert!("tiara".parse::<CategoryFilter>().is_err());
  }

  #[test]
  fn lead_query_matches_name_or_phone() {
    let lead = Lead {
      id: uuid::Uuid::new_v4(),
      name: "Asha Patil".into(),
      phone: "9876543210".into(),
      email: None,
      created_at: chrono::Utc::now(),
    };
    assert!(LeadQuery { search: Some("asha".into()) }.matches(&lead));
    assert!(LeadQuery { search: Some("5432".into()) }.matches(&lead));
    assert!(LeadQuery { search: Some("  ".into()) }.matches(&lead));
    assert!(!LeadQuery { search: Some("ravi".into()) }.matches(&lead));
  }
}
