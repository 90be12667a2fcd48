// examples/live_catalog.rs

//! Prices a small catalog, then reprices it live when the gold rate moves.
//!
//! cargo run -p karat --example live_catalog

use karat::{
  Category, CatalogQuery, CategoryFilter, DataStore, GoldRates, InquiryConfig, Karat, LiveCatalog, MemoryStore, ProductDraft,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn ring(name: &str, barcode: &str, net_grams: i64) -> ProductDraft {
  ProductDraft {
    name: name.to_string(),
    barcode: barcode.to_string(),
    gross_weight: Decimal::new(net_grams, 0),
    net_weight: Decimal::new(net_grams, 0),
    karat: Karat::K22,
    category: Category::Ring,
    hallmark_charge: Decimal::new(45, 0),
    stone_charge: Decimal::ZERO,
    making_charge_pct: Decimal::new(12, 0),
    image_url: None,
    customizable: false,
    gst_rate: None,
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let store = Arc::new(MemoryStore::new());
  store.add_product(ring("Lotus Ring", "BJ-R-001", 5)).await?;
  store.add_product(ring("Peacock Ring", "BJ-R-002", 7)).await?;
  store
    .set_gold_rates(GoldRates::new().with(Karat::K22, Decimal::new(6000, 0)))
    .await?;

  let query = CatalogQuery::new(None, CategoryFilter::Only(Category::Ring));
  let mut live = LiveCatalog::open(store.clone(), query, InquiryConfig::default());

  let view = live.current().await?;
  for item in &view.items {
    println!("{:<14} {:>12}", item.product.name, item.price.total);
  }

  store
    .set_gold_rates(GoldRates::new().with(Karat::K22, Decimal::new(6250, 0)))
    .await?;
  let view = live.next_view().await?;
  println!("-- 22K moved to 6250 --");
  for item in &view.items {
    println!("{:<14} {:>12}", item.product.name, item.price.total);
  }

  live.release();
  Ok(())
}
