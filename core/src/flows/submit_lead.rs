// karat/src/flows/submit_lead.rs

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{KaratError, KaratResult};
use crate::flow::{Shared, StepControl, Workflow};
use crate::gate::{LeadForm, LeadGate};
use crate::model::{Lead, NewLead};
use crate::store::DataStore;

use super::AUDIT_STEP;

/// A gate dismissal. `form == None` is a skip: only the flag is set.
pub struct LeadSubmission {
  pub store: Arc<dyn DataStore>,
  pub gate: LeadGate,
  pub form: Option<LeadForm>,
  pub lead: Option<NewLead>,
  pub recorded: Option<Lead>,
}

impl LeadSubmission {
  pub fn submit(store: Arc<dyn DataStore>, gate: LeadGate, form: LeadForm) -> Self {
    Self {
      store,
      gate,
      form: Some(form),
      lead: None,
      recorded: None,
    }
  }

  pub fn skip(store: Arc<dyn DataStore>, gate: LeadGate) -> Self {
    Self {
      store,
      gate,
      form: None,
      lead: None,
      recorded: None,
    }
  }

  pub fn is_skip(&self) -> bool {
    self.form.is_none()
  }

  fn pending_lead(&self) -> KaratResult<NewLead> {
    self
      .lead
      .clone()
      .ok_or_else(|| KaratError::Internal("lead used before validation".to_string()))
  }
}

async fn validate(ctx: Shared<LeadSubmission>) -> KaratResult<StepControl> {
  let validated = ctx.read().form.as_ref().map(LeadForm::validate);
  match validated {
    Some(Ok(lead)) => {
      ctx.write().lead = Some(lead);
      Ok(StepControl::Continue)
    }
    Some(Err(e)) => {
      warn!(error = %e, "Lead form rejected.");
      Err(e)
    }
    None => Ok(StepControl::Continue),
  }
}

async fn remember_profile(ctx: Shared<LeadSubmission>) -> KaratResult<StepControl> {
  let guard = ctx.read();
  guard.gate.remember_profile(&guard.pending_lead()?)?;
  Ok(StepControl::Continue)
}

async fn mark_submitted(ctx: Shared<LeadSubmission>) -> KaratResult<StepControl> {
  ctx.read().gate.mark_submitted()?;
  Ok(StepControl::Continue)
}

async fn append_lead(ctx: Shared<LeadSubmission>) -> KaratResult<StepControl> {
  let (store, lead) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.pending_lead()?)
  };
  match store.add_lead(lead).await {
    Ok(recorded) => {
      info!(lead_id = %recorded.id, "Lead recorded.");
      ctx.write().recorded = Some(recorded);
      Ok(StepControl::Continue)
    }
    Err(e) => {
      // The gate flag is already set; the visitor will not be asked again.
      error!(error = %e, "Lead append failed after the gate was dismissed.");
      Err(e)
    }
  }
}

pub fn workflow<E>() -> Result<Workflow<LeadSubmission, E>, KaratError>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  let mut wf = Workflow::new(
    "submit_lead",
    &[
      ("validate", false),
      ("remember_profile", false),
      ("mark_submitted", false),
      ("append_lead", false),
      (AUDIT_STEP, true),
    ],
  );
  wf.on("validate", validate)?;
  wf.on("remember_profile", remember_profile)?;
  wf.on("mark_submitted", mark_submitted)?;
  wf.on("append_lead", append_lead)?;

  for step in ["validate", "remember_profile", "append_lead"] {
    wf.skip_if(step, Arc::new(|ctx: &LeadSubmission| ctx.is_skip()))?;
  }
  Ok(wf)
}
