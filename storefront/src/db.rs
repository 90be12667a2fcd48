// storefront/src/db.rs

//! PostgreSQL-backed `DataStore`. Products and leads are tables; the two
//! rate singletons live in a key/value `settings` table as JSON. Every write
//! issues `pg_notify` on [`CHANGE_CHANNEL`] and a background listener relays
//! those notifications into the local change feed, so subscribers on every
//! server instance see every write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use karat::model::{Category, GoldRates, Karat, Lead, NewLead, Product, ProductDraft};
use karat::store::{ChangeFeed, DataStore, Subscription, Topic};
use karat::{KaratError, KaratResult};
use rust_decimal::Decimal;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub const CHANGE_CHANNEL: &str = "karat_changes";

pub const RELAY_RETRY_DELAY: Duration = Duration::from_secs(1);

const GOLD_RATES_KEY: &str = "gold_rates";
const GST_RATE_KEY: &str = "gst_rate";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
  id                UUID PRIMARY KEY,
  name              TEXT NOT NULL,
  barcode           TEXT NOT NULL,
  gross_weight      NUMERIC NOT NULL,
  net_weight        NUMERIC NOT NULL,
  karat             TEXT NOT NULL,
  category          TEXT NOT NULL,
  hallmark_charge   NUMERIC NOT NULL DEFAULT 0,
  stone_charge      NUMERIC NOT NULL DEFAULT 0,
  making_charge_pct NUMERIC NOT NULL DEFAULT 0,
  image_url         TEXT,
  customizable      BOOLEAN NOT NULL DEFAULT FALSE,
  gst_rate          NUMERIC,
  created_at        TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS leads (
  id         UUID PRIMARY KEY,
  name       TEXT NOT NULL,
  phone      TEXT NOT NULL,
  email      TEXT,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS settings (
  key        TEXT PRIMARY KEY,
  value      JSONB NOT NULL,
  updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

const PRODUCT_COLUMNS: &str = "id, name, barcode, gross_weight, net_weight, karat, category, hallmark_charge, \
   stone_charge, making_charge_pct, image_url, customizable, gst_rate, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
  id: Uuid,
  name: String,
  barcode: String,
  gross_weight: Decimal,
  net_weight: Decimal,
  karat: String,
  category: String,
  hallmark_charge: Decimal,
  stone_charge: Decimal,
  making_charge_pct: Decimal,
  image_url: Option<String>,
  customizable: bool,
  gst_rate: Option<Decimal>,
  created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
  type Error = KaratError;

  fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
    Ok(Product {
      id: row.id,
      name: row.name,
      barcode: row.barcode,
      gross_weight: row.gross_weight,
      net_weight: row.net_weight,
      karat: row.karat.parse::<Karat>()?,
      category: row.category.parse::<Category>()?,
      hallmark_charge: row.hallmark_charge,
      stone_charge: row.stone_charge,
      making_charge_pct: row.making_charge_pct,
      image_url: row.image_url,
      customizable: row.customizable,
      gst_rate: row.gst_rate,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
  id: Uuid,
  name: String,
  phone: String,
  email: Option<String>,
  created_at: DateTime<Utc>,
}

impl From<LeadRow> for Lead {
  fn from(row: LeadRow) -> Self {
    Lead {
      id: row.id,
      name: row.name,
      phone: row.phone,
      email: row.email,
      created_at: row.created_at,
    }
  }
}

fn store_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> KaratError {
  move |e| {
    error!(error = %e, context, "Database operation failed.");
    KaratError::store(anyhow::Error::new(e).context(context))
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
  feed: ChangeFeed,
}

/// Publishes the topic named by a notification payload.
fn relay_payload(feed: &ChangeFeed, payload: &str) -> Option<Topic> {
  let topic = Topic::parse(payload);
  match topic {
    Some(topic) => feed.publish(topic),
    None => warn!(payload, "Ignoring unknown change topic."),
  }
  topic
}

fn republish_all(feed: &ChangeFeed) {
  for topic in Topic::ALL {
    feed.publish(topic);
  }
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self {
      pool,
      feed: ChangeFeed::new(),
    }
  }

  pub async fn migrate(&self) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    info!("Database schema ensured.");
    Ok(())
  }

  /// Listens on [`CHANGE_CHANNEL`] and republishes each notification to
  /// local subscribers. A failed receive is retried after
  /// [`RELAY_RETRY_DELAY`]; the listener reconnects on its own and every
  /// topic is republished since notifications may have been missed.
  pub async fn spawn_change_relay(&self) -> Result<tokio::task::JoinHandle<()>, sqlx::Error> {
    let mut listener = PgListener::connect_with(&self.pool).await?;
    listener.listen(CHANGE_CHANNEL).await?;
    let feed = self.feed.clone();
    info!(channel = CHANGE_CHANNEL, "Change relay listening.");

    Ok(tokio::spawn(async move {
      loop {
        match listener.recv().await {
          Ok(notification) => {
            relay_payload(&feed, notification.payload());
          }
          Err(e) => {
            warn!(error = %e, "Change relay receive failed; retrying.");
            tokio::time::sleep(RELAY_RETRY_DELAY).await;
            republish_all(&feed);
          }
        }
      }
    }))
  }

  async fn notify(&self, topic: Topic) {
    let result = sqlx::query("SELECT pg_notify($1, $2)")
      .bind(CHANGE_CHANNEL)
      .bind(topic.as_str())
      .execute(&self.pool)
      .await;
    if let Err(e) = result {
      // The write itself succeeded; live views will catch up on their next change.
      warn!(error = %e, topic = topic.as_str(), "Failed to publish change notification.");
    }
  }

  async fn read_setting<T: serde::de::DeserializeOwned>(&self, key: &str) -> KaratResult<Option<T>> {
    let value: Option<serde_json::Value> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
      .bind(key)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err("read setting"))?;
    match value {
      Some(v) => Ok(Some(serde_json::from_value(v).map_err(KaratError::store)?)),
      None => Ok(None),
    }
  }

  async fn write_setting<T: serde::Serialize + Sync>(&self, key: &str, value: &T) -> KaratResult<()> {
    let json = serde_json::to_value(value).map_err(KaratError::store)?;
    sqlx::query(
      "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, now()) \
       ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
    )
    .bind(key)
    .bind(json)
    .execute(&self.pool)
    .await
    .map_err(store_err("write setting"))?;
    Ok(())
  }
}

#[async_trait]
impl DataStore for PgStore {
  #[instrument(name = "PgStore::list_products", skip(self))]
  async fn list_products(&self) -> KaratResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!(
      "SELECT {} FROM products ORDER BY created_at ASC, id ASC",
      PRODUCT_COLUMNS
    ))
    .fetch_all(&self.pool)
    .await
    .map_err(store_err("list products"))?;
    debug!(count = rows.len(), "Products fetched.");
    rows.into_iter().map(Product::try_from).collect()
  }

  async fn get_product(&self, id: Uuid) -> KaratResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err("get product"))?;
    row.map(Product::try_from).transpose()
  }

  #[instrument(name = "PgStore::add_product", skip(self, draft))]
  async fn add_product(&self, draft: ProductDraft) -> KaratResult<Product> {
    let product = draft.into_product(Uuid::new_v4(), Utc::now());
    sqlx::query(
      "INSERT INTO products (id, name, barcode, gross_weight, net_weight, karat, category, hallmark_charge, \
       stone_charge, making_charge_pct, image_url, customizable, gst_rate, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.barcode)
    .bind(product.gross_weight)
    .bind(product.net_weight)
    .bind(product.karat.as_str())
    .bind(product.category.as_str())
    .bind(product.hallmark_charge)
    .bind(product.stone_charge)
    .bind(product.making_charge_pct)
    .bind(&product.image_url)
    .bind(product.customizable)
    .bind(product.gst_rate)
    .bind(product.created_at)
    .execute(&self.pool)
    .await
    .map_err(store_err("insert product"))?;
    self.notify(Topic::Products).await;
    Ok(product)
  }

  #[instrument(name = "PgStore::update_product", skip(self, draft))]
  async fn update_product(&self, id: Uuid, draft: ProductDraft) -> KaratResult<Product> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
      "UPDATE products SET name = $2, barcode = $3, gross_weight = $4, net_weight = $5, karat = $6, category = $7, \
       hallmark_charge = $8, stone_charge = $9, making_charge_pct = $10, image_url = $11, customizable = $12, \
       gst_rate = $13 WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.barcode)
    .bind(draft.gross_weight)
    .bind(draft.net_weight)
    .bind(draft.karat.as_str())
    .bind(draft.category.as_str())
    .bind(draft.hallmark_charge)
    .bind(draft.stone_charge)
    .bind(draft.making_charge_pct)
    .bind(&draft.image_url)
    .bind(draft.customizable)
    .bind(draft.gst_rate)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("update product"))?;

    let product: Product = row
      .ok_or_else(|| KaratError::NotFound(format!("Product with ID {} not found.", id)))?
      .try_into()?;
    self.notify(Topic::Products).await;
    Ok(product)
  }

  async fn delete_product(&self, id: Uuid) -> KaratResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(store_err("delete product"))?;
    let removed = result.rows_affected() > 0;
    if removed {
      self.notify(Topic::Products).await;
    }
    Ok(removed)
  }

  async fn list_leads(&self) -> KaratResult<Vec<Lead>> {
    let rows: Vec<LeadRow> =
      sqlx::query_as("SELECT id, name, phone, email, created_at FROM leads ORDER BY created_at ASC, id ASC")
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list leads"))?;
    Ok(rows.into_iter().map(Lead::from).collect())
  }

  #[instrument(name = "PgStore::add_lead", skip(self, lead))]
  async fn add_lead(&self, lead: NewLead) -> KaratResult<Lead> {
    let lead = lead.into_lead(Uuid::new_v4(), Utc::now());
    sqlx::query("INSERT INTO leads (id, name, phone, email, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(lead.id)
      .bind(&lead.name)
      .bind(&lead.phone)
      .bind(&lead.email)
      .bind(lead.created_at)
      .execute(&self.pool)
      .await
      .map_err(store_err("insert lead"))?;
    self.notify(Topic::Leads).await;
    Ok(lead)
  }

  async fn delete_lead(&self, id: Uuid) -> KaratResult<bool> {
    let result = sqlx::query("DELETE FROM leads WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(store_err("delete lead"))?;
    let removed = result.rows_affected() > 0;
    if removed {
      self.notify(Topic::Leads).await;
    }
    Ok(removed)
  }

  async fn gold_rates(&self) -> KaratResult<GoldRates> {
    Ok(self.read_setting(GOLD_RATES_KEY).await?.unwrap_or_default())
  }

  async fn set_gold_rates(&self, rates: GoldRates) -> KaratResult<()> {
    self.write_setting(GOLD_RATES_KEY, &rates).await?;
    self.notify(Topic::GoldRates).await;
    Ok(())
  }

  async fn gst_rate(&self) -> KaratResult<Option<Decimal>> {
    self.read_setting(GST_RATE_KEY).await
  }

  async fn set_gst_rate(&self, gst_rate: Decimal) -> KaratResult<()> {
    self.write_setting(GST_RATE_KEY, &gst_rate).await?;
    self.notify(Topic::GstRate).await;
    Ok(())
  }

  fn watch(&self, topic: Topic) -> Subscription {
    self.feed.subscribe(topic)
  }
}

/// Fills an empty store with a few demo products and a rate table, and
/// writes `default_gst` when no GST value exists yet. Works on any backend.
#[instrument(name = "db::seed", skip(store))]
pub async fn seed(store: &dyn DataStore, default_gst: Decimal) -> KaratResult<()> {
  if store.gst_rate().await?.is_none() {
    store.set_gst_rate(default_gst).await?;
  }
  if store.gold_rates().await?.is_empty() {
    let rates = GoldRates::new()
      .with(Karat::K18, Decimal::new(4950, 0))
      .with(Karat::K20, Decimal::new(5500, 0))
      .with(Karat::K22, Decimal::new(6000, 0))
      .with(Karat::K24, Decimal::new(6550, 0));
    store.set_gold_rates(rates).await?;
  }
  if !store.list_products().await?.is_empty() {
    return Ok(());
  }

  let samples = [
    ("Lotus Ring", "BJ-R-001", Category::Ring, Decimal::new(52, 1), Decimal::new(48, 1)),
    ("Temple Bangle", "BJ-B-014", Category::Bangle, Decimal::new(245, 1), Decimal::new(238, 1)),
    ("Rope Chain", "BJ-C-099", Category::Chain, Decimal::new(121, 1), Decimal::new(121, 1)),
    ("Black Bead Mangalsutra", "BJ-M-007", Category::Mangalsutra, Decimal::new(186, 1), Decimal::new(172, 1)),
  ];
  for (name, barcode, category, gross, net) in samples {
    store
      .add_product(ProductDraft {
        name: name.to_string(),
        barcode: barcode.to_string(),
        gross_weight: gross,
        net_weight: net,
        karat: Karat::K22,
        category,
        hallmark_charge: Decimal::new(45, 0),
        stone_charge: Decimal::ZERO,
        making_charge_pct: Decimal::new(12, 0),
        image_url: None,
        customizable: false,
        gst_rate: None,
      })
      .await?;
  }
  info!(count = samples.len(), "Seeded demo products.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn relay_publishes_known_topics_only() {
    let feed = ChangeFeed::new();
    let mut rates = feed.subscribe(Topic::GoldRates);
    let mut products = feed.subscribe(Topic::Products);

    assert_eq!(relay_payload(&feed, "not-a-topic"), None);
    assert_eq!(relay_payload(&feed, Topic::GoldRates.as_str()), Some(Topic::GoldRates));

    tokio::time::timeout(Duration::from_secs(1), rates.changed()).await.unwrap().unwrap();
    assert!(tokio::time::timeout(Duration::from_millis(50), products.changed()).await.is_err());
  }

  #[tokio::test]
  async fn recovery_refreshes_every_topic() {
    let feed = ChangeFeed::new();
    let mut subs: Vec<_> = Topic::ALL.iter().map(|t| feed.subscribe(*t)).collect();
    republish_all(&feed);
    for sub in subs.iter_mut() {
      tokio::time::timeout(Duration::from_secs(1), sub.changed()).await.unwrap().unwrap();
    }
  }
}
