// karat/src/model/lead.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A visitor who filled in the lead-capture form. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
  pub id: Uuid,
  pub name: String,
  pub phone: String,
  pub email: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
  pub name: String,
  pub phone: String,
  pub email: Option<String>,
}

impl NewLead {
  pub fn into_lead(self, id: Uuid, created_at: DateTime<Utc>) -> Lead {
    Lead {
      id,
      name: self.name,
      phone: self.phone,
      email: self.email,
      created_at,
    }
  }
}
