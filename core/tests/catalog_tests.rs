// tests/catalog_tests.rs
mod common;

use common::*;
use karat::{CatalogQuery, CatalogView, Category, CategoryFilter, DataStore, InquiryConfig, LiveCatalog, ProductDraft, Topic};
use std::sync::Arc;
use std::time::Duration;

fn names(view: &CatalogView) -> Vec<&str> {
  view.items.iter().map(|i| i.product.name.as_str()).collect()
}

#[tokio::test]
async fn test_barcode_substring_is_case_insensitive() {
  setup_tracing();
  let (store, _) = seeded_store().await;

  let query = CatalogQuery::new(Some("BJ-C".to_string()), CategoryFilter::All);
  let view = CatalogView::load(&store, &query, &InquiryConfig::default()).await.unwrap();
  assert_eq!(names(&view), vec!["Rope Chain"]);

  let query = CatalogQuery::new(Some("bj-".to_string()), CategoryFilter::All);
  let view = CatalogView::load(&store, &query, &InquiryConfig::default()).await.unwrap();
  assert_eq!(view.len(), 3);
}

#[tokio::test]
async fn test_name_search_and_category_filter_combine() {
  let (store, _) = seeded_store().await;

  let query = CatalogQuery::new(Some("  temple ".to_string()), CategoryFilter::All);
  assert_eq!(names(&CatalogView::load(&store, &query, &InquiryConfig::default()).await.unwrap()), vec!["Temple Bangle"]);

  let query = CatalogQuery::new(Some("temple".to_string()), CategoryFilter::Only(Category::Ring));
  assert!(CatalogView::load(&store, &query, &InquiryConfig::default()).await.unwrap().is_empty());

  let query = CatalogQuery::new(None, "ring".parse().unwrap());
  assert_eq!(names(&CatalogView::load(&store, &query, &InquiryConfig::default()).await.unwrap()), vec!["Lotus Ring"]);
}

#[tokio::test]
async fn test_all_returns_full_set_in_store_order() {
  let (store, products) = seeded_store().await;
  let query = CatalogQuery::new(Some("   ".to_string()), "all".parse().unwrap());
  let view = CatalogView::load(&store, &query, &InquiryConfig::default()).await.unwrap();

  assert_eq!(view.total_products, 3);
  let ids: Vec<_> = view.items.iter().map(|i| i.product.id).collect();
  let expected: Vec<_> = products.iter().map(|p| p.id).collect();
  assert_eq!(ids, expected);
  assert!(view.items.iter().all(|i| i.price.total == "68495.00"));
}

#[tokio::test]
async fn test_live_catalog_reprices_on_rate_change() {
  setup_tracing();
  let (store, _) = seeded_store().await;
  let shared: Arc<dyn DataStore> = Arc::new(store.clone());
  let mut live = LiveCatalog::open(shared, CatalogQuery::default(), InquiryConfig::default());

  let before = live.current().await.unwrap();
  assert_eq!(before.items[0].price.total, "68495.00");

  store.set_gold_rates(rates_22k("0")).await.unwrap();
  let after = tokio::time::timeout(Duration::from_secs(2), live.next_view()).await.unwrap().unwrap();
  assert!(after.items.iter().all(|i| i.breakdown.is_unpriced()));
}

#[tokio::test]
async fn test_live_catalog_sees_new_products() {
  let (store, _) = seeded_store().await;
  let shared: Arc<dyn DataStore> = Arc::new(store.clone());
  let mut live = LiveCatalog::open(shared, CatalogQuery::new(Some("kada".to_string()), CategoryFilter::All), InquiryConfig::default());
  assert!(live.current().await.unwrap().is_empty());

  store.add_product(draft("Plain Kada", "BJ-K-3", Category::Kada)).await.unwrap();
  let view = tokio::time::timeout(Duration::from_secs(2), live.next_view()).await.unwrap().unwrap();
  assert_eq!(names(&view), vec!["Plain Kada"]);
}

#[tokio::test]
async fn test_dropping_live_catalog_releases_subscriptions() {
  let (store, _) = seeded_store().await;
  let feed = store.feed().clone();
  let shared: Arc<dyn DataStore> = Arc::new(store.clone());

  let live = LiveCatalog::open(shared.clone(), CatalogQuery::default(), InquiryConfig::default());
  assert_eq!(feed.subscriber_count(Topic::Products), 1);
  assert_eq!(feed.subscriber_count(Topic::GoldRates), 1);
  assert_eq!(feed.subscriber_count(Topic::GstRate), 1);
  live.release();
  assert_eq!(feed.subscriber_count(Topic::Products), 0);
  assert_eq!(feed.subscriber_count(Topic::GoldRates), 0);
  assert_eq!(feed.subscriber_count(Topic::GstRate), 0);

  {
    let _scoped = LiveCatalog::open(shared, CatalogQuery::default(), InquiryConfig::default());
    assert_eq!(feed.subscriber_count(Topic::Products), 1);
  }
  assert_eq!(feed.subscriber_count(Topic::Products), 0);
}

#[tokio::test]
async fn test_cards_carry_a_whatsapp_inquiry_link() {
  let (store, _) = seeded_store().await;
  let inquiry = InquiryConfig {
    phone: "919800011122".to_string(),
    business_name: "Test Jewellers".to_string(),
  };
  let query = CatalogQuery::new(Some("lotus".to_string()), CategoryFilter::All);
  let view = CatalogView::load(&store, &query, &inquiry).await.unwrap();

  let link = view.items[0].inquiry_url.as_deref().unwrap();
  assert!(link.starts_with("https://wa.me/919800011122?text="));
  let url = url::Url::parse(link).unwrap();
  let text = url.query_pairs().find(|(k, _)| k == "text").map(|(_, v)| v.into_owned()).unwrap();
  assert!(text.starts_with("Hello Test Jewellers,"));
  assert!(text.contains("*Lotus Ring*"));
  assert!(text.contains("Barcode: BJ-R-001"));
  assert!(text.ends_with("Price: ₹68495.00"));

  let json = serde_json::to_value(&view).unwrap();
  assert_eq!(json["items"][0]["inquiry_url"], link);
}

#[tokio::test]
async fn test_oversized_weight_lists_as_unpriced_instead_of_failing() {
  let (store, _) = seeded_store().await;
  store
    .add_product(ProductDraft {
      net_weight: dec("99999999999999999999999999"),
      ..draft("Giant Kada", "BJ-K-999", Category::Kada)
    })
    .await
    .unwrap();

  let view = CatalogView::load(&store, &CatalogQuery::default(), &InquiryConfig::default()).await.unwrap();
  assert_eq!(view.len(), 4);
  let giant = view.items.iter().find(|i| i.product.name == "Giant Kada").unwrap();
  assert!(giant.breakdown.is_unpriced());
  assert_eq!(giant.price.total, "0.00");
  assert!(view.items.iter().filter(|i| i.product.name != "Giant Kada").all(|i| i.price.total == "68495.00"));
}
