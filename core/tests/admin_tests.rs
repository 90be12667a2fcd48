// tests/admin_tests.rs
mod common;

use common::*;
use karat::admin::{self, ProductForm};
use karat::{CatalogQuery, CatalogView, DataStore, KaratError, Karat, NewLead};
use std::sync::Arc;

fn ring_form() -> ProductForm {
  ProductForm {
    name: "Peacock Ring".into(),
    barcode: "BJ-R-420".into(),
    gross_weight: "6".into(),
    net_weight: "5.5".into(),
    karat: "18".into(),
    category: "ring".into(),
    making_charge_pct: "12".into(),
    ..Default::default()
  }
}

#[tokio::test]
async fn test_create_then_update_overwrites_fields_and_keeps_identity() {
  setup_tracing();
  let store = Arc::new(karat::MemoryStore::new());
  let created = admin::save_product(store.clone(), None, ring_form()).await.unwrap();
  assert_eq!(created.karat, Karat::K18);

  let mut edit = ProductForm::from_product(&created);
  edit.name = "Peacock Ring (Large)".into();
  edit.stone_charge = String::new();
  edit.gst_rate = "5".into();
  let updated = admin::save_product(store.clone(), Some(created.id), edit).await.unwrap();

  assert_eq!(updated.id, created.id);
  assert_eq!(updated.created_at, created.created_at);
  assert_eq!(updated.name, "Peacock Ring (Large)");
  assert_eq!(updated.gst_rate, Some(dec("5")));
  assert_eq!(store.list_products().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_form_writes_nothing() {
  let store = Arc::new(karat::MemoryStore::new());
  let mut form = ring_form();
  form.net_weight = "".into();
  let err = admin::save_product(store.clone(), None, form).await.unwrap_err();
  assert!(err.is_validation());
  assert!(store.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_of_unknown_id_is_not_found() {
  let store = Arc::new(karat::MemoryStore::new());
  let err = admin::save_product(store, Some(uuid::Uuid::new_v4()), ring_form()).await.unwrap_err();
  assert!(matches!(err, KaratError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_requires_confirmation_then_leaves_catalog() {
  let (store, products) = seeded_store().await;
  let target = products[1].id;

  let err = admin::delete_product(&store, target, false).await.unwrap_err();
  assert!(matches!(err, KaratError::ConfirmationRequired(_)));
  assert_eq!(store.list_products().await.unwrap().len(), 3);

  admin::delete_product(&store, target, true).await.unwrap();
  let view = CatalogView::load(&store, &CatalogQuery::default(), &karat::InquiryConfig::default()).await.unwrap();
  assert_eq!(view.len(), 2);
  assert!(view.items.iter().all(|i| i.product.id != target));

  let again = admin::delete_product(&store, target, true).await.unwrap_err();
  assert!(matches!(again, KaratError::NotFound(_)));
}

#[tokio::test]
async fn test_lead_delete_requires_confirmation() {
  let store = karat::MemoryStore::new();
  let lead = store
    .add_lead(NewLead {
      name: "Ravi".into(),
      phone: "9822012345".into(),
      email: None,
    })
    .await
    .unwrap();

  assert!(admin::delete_lead(&store, lead.id, false).await.is_err());
  assert_eq!(store.list_leads().await.unwrap().len(), 1);
  admin::delete_lead(&store, lead.id, true).await.unwrap();
  assert!(store.list_leads().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_saves_overwrite_singletons() {
  let (store, _) = seeded_store().await;

  admin::save_gold_rates(&store, rates_22k("6200").with(Karat::K24, dec("6800"))).await.unwrap();
  admin::save_gold_rates(&store, rates_22k("6100")).await.unwrap();
  let rates = store.gold_rates().await.unwrap();
  assert_eq!(rates.rate_for(Karat::K22), dec("6100"));
  assert_eq!(rates.rate_for(Karat::K24), dec("0"));

  admin::save_gst_rate(&store, dec("1.5")).await.unwrap();
  assert_eq!(store.rate_config().await.unwrap().gst_rate, dec("1.5"));
  assert!(admin::save_gst_rate(&store, dec("101")).await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_store_outage_surfaces_and_keeps_state() {
  let (store, products) = seeded_store().await;
  store.set_offline(true);
  let err = admin::delete_product(&store, products[0].id, true).await.unwrap_err();
  assert!(matches!(err, KaratError::Store { .. }));
  store.set_offline(false);
  assert_eq!(store.list_products().await.unwrap().len(), 3);
}
