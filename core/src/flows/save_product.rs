// karat/src/flows/save_product.rs

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::admin::ProductForm;
use crate::error::{KaratError, KaratResult};
use crate::flow::{Shared, StepControl, Workflow};
use crate::model::{Product, ProductDraft};
use crate::store::DataStore;

use super::AUDIT_STEP;

/// Create (`target == None`) or full overwrite of an existing product.
pub struct SaveProduct {
  pub store: Arc<dyn DataStore>,
  pub target: Option<Uuid>,
  pub form: ProductForm,
  pub draft: Option<ProductDraft>,
  pub saved: Option<Product>,
}

impl SaveProduct {
  pub fn new(store: Arc<dyn DataStore>, target: Option<Uuid>, form: ProductForm) -> Self {
    Self {
      store,
      target,
      form,
      draft: None,
      saved: None,
    }
  }
}

async fn parse_form(ctx: Shared<SaveProduct>) -> KaratResult<StepControl> {
  let parsed = ctx.read().form.parse();
  match parsed {
    Ok(draft) => {
      ctx.write().draft = Some(draft);
      Ok(StepControl::Continue)
    }
    Err(e) => {
      warn!(error = %e, "Product form rejected.");
      Err(e)
    }
  }
}

async fn persist(ctx: Shared<SaveProduct>) -> KaratResult<StepControl> {
  let (store, target, draft) = {
    let guard = ctx.read();
    let draft = guard
      .draft
      .clone()
      .ok_or_else(|| KaratError::Internal("persist ran before the form was parsed".to_string()))?;
    (guard.store.clone(), guard.target, draft)
  };

  let saved = match target {
    Some(id) => store.update_product(id, draft).await?,
    None => store.add_product(draft).await?,
  };
  info!(product_id = %saved.id, updated = target.is_some(), "Product saved.");
  ctx.write().saved = Some(saved);
  Ok(StepControl::Continue)
}

pub fn workflow<E>() -> Result<Workflow<SaveProduct, E>, KaratError>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  let mut wf = Workflow::new("save_product", &[("parse", false), ("persist", false), (AUDIT_STEP, true)]);
  wf.on("parse", parse_form)?;
  wf.on("persist", persist)?;
  Ok(wf)
}
