// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use karat::media::{HostUpload, HostedImage, MediaHost};
use karat::{Category, DataStore, GoldRates, Karat, KaratError, KaratResult, MemoryStore, Product, ProductDraft};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

pub fn dec(s: &str) -> Decimal {
  s.parse().unwrap()
}

// --- Fixtures ---
pub fn draft(name: &str, barcode: &str, category: Category) -> ProductDraft {
  ProductDraft {
    name: name.to_string(),
    barcode: barcode.to_string(),
    gross_weight: dec("10.5"),
    net_weight: dec("10"),
    karat: Karat::K22,
    category,
    hallmark_charge: dec("500"),
    stone_charge: Decimal::ZERO,
    making_charge_pct: dec("10"),
    image_url: None,
    customizable: false,
    gst_rate: None,
  }
}

pub fn rates_22k(rate: &str) -> GoldRates {
  GoldRates::new().with(Karat::K22, dec(rate))
}

/// A memory store holding three products, a 22K rate of 6000 and GST 3.
pub async fn seeded_store() -> (MemoryStore, Vec<Product>) {
  let store = MemoryStore::new();
  let mut products = Vec::new();
  for d in [
    draft("Lotus Ring", "BJ-R-001", Category::Ring),
    draft("Temple Bangle", "BJ-B-014", Category::Bangle),
    draft("Rope Chain", "bj-c-099", Category::Chain),
  ] {
    products.push(store.add_product(d).await.unwrap());
  }
  store.set_gold_rates(rates_22k("6000")).await.unwrap();
  store.set_gst_rate(dec("3")).await.unwrap();
  (store, products)
}

// --- Fake media host ---
/// Records every upload it receives; optionally fails them all.
#[derive(Default)]
pub struct CountingHost {
  pub calls: AtomicUsize,
  pub received: Mutex<Vec<HostUpload>>,
  pub fail_with: Option<String>,
}

impl CountingHost {
  pub fn failing(message: &str) -> Self {
    Self {
      fail_with: Some(message.to_string()),
      ..Default::default()
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl MediaHost for CountingHost {
  async fn upload(&self, upload: HostUpload) -> KaratResult<HostedImage> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let public_id = format!("{}/{}", upload.folder, upload.public_id);
    self.received.lock().push(upload);
    if let Some(message) = &self.fail_with {
      return Err(KaratError::MediaHost(message.clone()));
    }
    Ok(HostedImage {
      url: format!("https://media.test/{}.jpg", public_id),
      public_id,
    })
  }
}

pub fn counting_host() -> Arc<CountingHost> {
  Arc::new(CountingHost::default())
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
