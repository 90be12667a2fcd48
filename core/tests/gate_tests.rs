// tests/gate_tests.rs
mod common;

use common::*;
use karat::store::JsonFileStore;
use karat::{DataStore, GateState, KaratError, LeadForm, LeadGate, LocalStore, MemoryLocalStore, MemoryStore};
use std::sync::Arc;

fn asha() -> LeadForm {
  LeadForm {
    name: "Asha Patil".into(),
    phone: "+91 98765 43210".into(),
    email: "asha@example.com".into(),
  }
}

#[tokio::test]
async fn test_submission_records_lead_and_hides_gate() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let gate = LeadGate::new(Arc::new(MemoryLocalStore::new()));
  assert!(gate.should_show("/api/v1/catalog").unwrap());

  let lead = gate.submit(store.clone(), asha()).await.unwrap();
  assert_eq!(lead.name, "Asha Patil");
  assert_eq!(lead.email.as_deref(), Some("asha@example.com"));
  assert_eq!(store.list_leads().await.unwrap().len(), 1);
  assert_eq!(gate.state().unwrap(), GateState::Submitted);
  assert!(!gate.should_show("/api/v1/catalog").unwrap());
  assert_eq!(gate.cached_profile().unwrap().unwrap().phone, "+91 98765 43210");
}

#[tokio::test]
async fn test_flag_survives_reopening_the_app() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("visitor.json");
  let store = Arc::new(MemoryStore::new());

  {
    let gate = LeadGate::new(Arc::new(JsonFileStore::open(&path).unwrap()));
    gate.submit(store.clone(), asha()).await.unwrap();
  }

  let reopened = LeadGate::new(Arc::new(JsonFileStore::open(&path).unwrap()));
  assert_eq!(reopened.state().unwrap(), GateState::Submitted);
  assert!(!reopened.should_show("/").unwrap());
}

#[tokio::test]
async fn test_skip_dismisses_without_lead() {
  let store = Arc::new(MemoryStore::new());
  let local = Arc::new(MemoryLocalStore::new());
  let gate = LeadGate::new(local.clone());

  gate.skip(store.clone()).await.unwrap();
  assert_eq!(gate.state().unwrap(), GateState::Submitted);
  assert!(store.list_leads().await.unwrap().is_empty());
  assert!(local.get(karat::store::local::USER_PROFILE_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_form_leaves_gate_open() {
  let store = Arc::new(MemoryStore::new());
  let gate = LeadGate::new(Arc::new(MemoryLocalStore::new()));
  let mut form = asha();
  form.phone = "12".into();

  let err = gate.submit(store.clone(), form).await.unwrap_err();
  assert!(err.is_validation());
  assert_eq!(gate.state().unwrap(), GateState::NotSubmitted);
  assert!(store.list_leads().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_failure_still_marks_submitted() {
  let store = Arc::new(MemoryStore::new());
  store.set_offline(true);
  let gate = LeadGate::new(Arc::new(MemoryLocalStore::new()));

  let err = gate.submit(store.clone(), asha()).await.unwrap_err();
  assert!(matches!(err, KaratError::Store { .. }));
  // The flag was set before the append: the gate stays dismissed.
  assert_eq!(gate.state().unwrap(), GateState::Submitted);
  store.set_offline(false);
  assert!(store.list_leads().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_routes_never_show_gate() {
  let gate = LeadGate::new(Arc::new(MemoryLocalStore::new()));
  assert!(!gate.should_show("/api/v1/admin/products").unwrap());
  assert!(gate.should_show("/api/v1/products/abc").unwrap());
}
