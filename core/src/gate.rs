// karat/src/gate.rs

//! The one-time lead-capture gate shown on a visitor's first visit.
//!
//! State lives in the visitor's [`LocalStore`]: once the `form_submitted`
//! flag is set (by submitting or skipping) the gate never reappears for that
//! visitor. Submitting also appends a lead to the shared store; skipping does
//! not. The flag is set before the remote append, so a failed append leaves
//! the visitor marked as submitted without a lead record.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{KaratError, KaratResult};
use crate::flow::Shared;
use crate::flows::submit_lead::{self, LeadSubmission};
use crate::model::{Lead, NewLead};
use crate::store::local::{FORM_SUBMITTED_KEY, USER_PROFILE_KEY};
use crate::store::{DataStore, LocalStore};

const API_PREFIX: &str = "/api/v1";
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
  NotSubmitted,
  Submitted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadForm {
  pub name: String,
  pub phone: String,
  pub email: String,
}

impl LeadForm {
  pub fn validate(&self) -> KaratResult<NewLead> {
    let name = self.name.trim();
    if name.is_empty() {
      return Err(KaratError::validation("name is required"));
    }
    let phone = self.phone.trim();
    if phone.is_empty() {
      return Err(KaratError::validation("phone is required"));
    }
    let digits: String = phone.chars().filter(|c| !matches!(c, ' ' | '+' | '-')).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
      return Err(KaratError::validation(format!(
        "phone must contain {}-{} digits",
        MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
      )));
    }
    let email = Some(self.email.trim()).filter(|e| !e.is_empty()).map(str::to_string);
    Ok(NewLead {
      name: name.to_string(),
      phone: phone.to_string(),
      email,
    })
  }
}

/// Admin routes never show the gate.
pub fn is_admin_path(path: &str) -> bool {
  let path = path.strip_prefix(API_PREFIX).unwrap_or(path);
  path == "/admin" || path.starts_with("/admin/")
}

#[derive(Clone)]
pub struct LeadGate {
  local: Arc<dyn LocalStore>,
}

impl LeadGate {
  pub fn new(local: Arc<dyn LocalStore>) -> Self {
    Self { local }
  }

  pub fn local(&self) -> &Arc<dyn LocalStore> {
    &self.local
  }

  pub fn state(&self) -> KaratResult<GateState> {
    if self.local.as_ref().flag(FORM_SUBMITTED_KEY)? {
      Ok(GateState::Submitted)
    } else {
      Ok(GateState::NotSubmitted)
    }
  }

  pub fn should_show(&self, path: &str) -> KaratResult<bool> {
    if is_admin_path(path) {
      return Ok(false);
    }
    Ok(self.state()? == GateState::NotSubmitted)
  }

  /// The profile cached by the last submission, if any.
  pub fn cached_profile(&self) -> KaratResult<Option<LeadForm>> {
    self.local.as_ref().get_json(USER_PROFILE_KEY)
  }

  pub fn remember_profile(&self, lead: &NewLead) -> KaratResult<()> {
    let profile = LeadForm {
      name: lead.name.clone(),
      phone: lead.phone.clone(),
      email: lead.email.clone().unwrap_or_default(),
    };
    self.local.as_ref().set_json(USER_PROFILE_KEY, &profile)
  }

  pub fn mark_submitted(&self) -> KaratResult<()> {
    debug!("Marking lead gate as submitted.");
    self.local.set(FORM_SUBMITTED_KEY, "true")
  }

  /// Validates, caches the profile, sets the flag, then appends the lead.
  #[instrument(name = "LeadGate::submit", skip_all)]
  pub async fn submit(&self, store: Arc<dyn DataStore>, form: LeadForm) -> KaratResult<Lead> {
    let ctx = Shared::new(LeadSubmission::submit(store, self.clone(), form));
    submit_lead::workflow::<KaratError>()?.run(ctx.clone()).await?;
    let recorded = ctx.read().recorded.clone();
    recorded.ok_or_else(|| KaratError::Internal("lead submission finished without a record".to_string()))
  }

  /// Dismisses the gate without writing a lead.
  #[instrument(name = "LeadGate::skip", skip_all)]
  pub async fn skip(&self, store: Arc<dyn DataStore>) -> KaratResult<()> {
    let ctx = Shared::new(LeadSubmission::skip(store, self.clone()));
    submit_lead::workflow::<KaratError>()?.run(ctx).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phone_needs_seven_to_fifteen_digits() {
    let form = |phone: &str| LeadForm {
      name: "Asha".into(),
      phone: phone.into(),
      email: String::new(),
    };
    assert!(form("+91 98765-43210").validate().is_ok());
    assert!(form("123456").validate().is_err());
    assert!(form("1234567890123456").validate().is_err());
    assert!(form("98765abc10").validate().is_err());
  }

  #[test]
  fn admin_paths_are_exempt() {
    assert!(is_admin_path("/admin"));
    assert!(is_admin_path("/api/v1/admin/products"));
    assert!(!is_admin_path("/api/v1/catalog"));
    assert!(!is_admin_path("/administrator"));
  }
}
