// karat/src/admin.rs

//! Admin-side form parsing and write operations: product create/update/delete,
//! lead delete, and the two rate editors.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{KaratError, KaratResult};
use crate::flow::{Outcome, Shared};
use crate::flows::save_product::{self, SaveProduct};
use crate::model::{Category, GoldRates, Karat, Product, ProductDraft};
use crate::store::DataStore;

const MAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Upper bound for any weight, rate or charge entered in the admin forms.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// The product form exactly as submitted. Every field is text; blank numeric
/// fields default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
  pub name: String,
  pub barcode: String,
  pub gross_weight: String,
  pub net_weight: String,
  pub karat: String,
  pub category: String,
  pub hallmark_charge: String,
  pub stone_charge: String,
  pub making_charge_pct: String,
  pub image_url: String,
  pub customizable: bool,
  pub gst_rate: String,
}

impl ProductForm {
  pub fn from_product(product: &Product) -> Self {
    Self {
      name: product.name.clone(),
      barcode: product.barcode.clone(),
      gross_weight: product.gross_weight.to_string(),
      net_weight: product.net_weight.to_string(),
      karat: product.karat.to_string(),
      category: product.category.to_string(),
      hallmark_charge: product.hallmark_charge.to_string(),
      stone_charge: product.stone_charge.to_string(),
      making_charge_pct: product.making_charge_pct.to_string(),
      image_url: product.image_url.clone().unwrap_or_default(),
      customizable: product.customizable,
      gst_rate: product.gst_rate.map(|g| g.to_string()).unwrap_or_default(),
    }
  }

  /// Validates the form into a draft. Name, barcode, gross and net weight are
  /// required; any unparsable or negative number is rejected.
  pub fn parse(&self) -> KaratResult<ProductDraft> {
    let name = required_text("name", &self.name)?;
    let barcode = required_text("barcode", &self.barcode)?;
    let gross_weight = parse_amount("gross_weight", required_text("gross_weight", &self.gross_weight)?.as_str())?;
    let net_weight = parse_amount("net_weight", required_text("net_weight", &self.net_weight)?.as_str())?;

    let karat = if self.karat.trim().is_empty() {
      Karat::default()
    } else {
      Karat::from_str(&self.karat)?
    };
    let category = if self.category.trim().is_empty() {
      Category::default()
    } else {
      Category::from_str(&self.category)?
    };

    let gst_rate = match self.gst_rate.trim() {
      "" => None,
      raw => Some(parse_percent("gst_rate", raw)?).filter(|g| !g.is_zero()),
    };

    let image_url = Some(self.image_url.trim()).filter(|u| !u.is_empty()).map(str::to_string);

    Ok(ProductDraft {
      name,
      barcode,
      gross_weight,
      net_weight,
      karat,
      category,
      hallmark_charge: parse_amount("hallmark_charge", &self.hallmark_charge)?,
      stone_charge: parse_amount("stone_charge", &self.stone_charge)?,
      making_charge_pct: parse_amount("making_charge_pct", &self.making_charge_pct)?,
      image_url,
      customizable: self.customizable,
      gst_rate,
    })
  }
}

fn required_text(field: &str, raw: &str) -> KaratResult<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(KaratError::validation(format!("{} is required", field)));
  }
  Ok(trimmed.to_string())
}

/// Blank is zero; otherwise a decimal between 0 and [`MAX_AMOUNT`].
pub fn parse_amount(field: &str, raw: &str) -> KaratResult<Decimal> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(Decimal::ZERO);
  }
  let value = Decimal::from_str(raw)
    .map_err(|_| KaratError::validation(format!("{} must be a number, got '{}'", field, raw)))?;
  if value.is_sign_negative() && !value.is_zero() {
    return Err(KaratError::validation(format!("{} must not be negative", field)));
  }
  if value > MAX_AMOUNT {
    return Err(KaratError::validation(format!("{} must be at most {}", field, MAX_AMOUNT)));
  }
  Ok(value)
}

/// A percentage between 0 and 100 inclusive. Blank is rejected.
pub fn parse_percent(field: &str, raw: &str) -> KaratResult<Decimal> {
  let value = parse_amount(field, required_text(field, raw)?.as_str())?;
  if value > MAX_PERCENT {
    return Err(KaratError::validation(format!("{} must be at most 100", field)));
  }
  Ok(value)
}

/// Parses the rate editor's `{"22": "6000", ...}` form. Blank entries are
/// omitted, which prices that grade as unavailable.
pub fn parse_gold_rates(form: &BTreeMap<String, String>) -> KaratResult<GoldRates> {
  let mut rates = GoldRates::new();
  for (grade, raw) in form {
    let karat = Karat::from_str(grade)?;
    if raw.trim().is_empty() {
      continue;
    }
    rates.set(karat, parse_amount(&format!("rate[{}]", karat), raw)?);
  }
  Ok(rates)
}

fn require_confirmation(confirmed: bool, what: &str) -> KaratResult<()> {
  if confirmed {
    Ok(())
  } else {
    warn!(target_record = what, "Destructive operation attempted without confirmation.");
    Err(KaratError::ConfirmationRequired(format!(
      "Deleting {} must be confirmed.",
      what
    )))
  }
}

/// Runs the product-save workflow. `target` is `None` for create.
pub async fn save_product(
  store: Arc<dyn DataStore>,
  target: Option<Uuid>,
  form: ProductForm,
) -> KaratResult<Product> {
  let ctx = Shared::new(SaveProduct::new(store, target, form));
  let outcome = save_product::workflow::<KaratError>()?.run(ctx.clone()).await?;
  let saved = ctx.read().saved.clone();
  match (outcome, saved) {
    (Outcome::Completed, Some(product)) => Ok(product),
    _ => Err(KaratError::Internal("product save finished without a record".to_string())),
  }
}

#[instrument(name = "admin::delete_product", skip(store))]
pub async fn delete_product(store: &dyn DataStore, id: Uuid, confirmed: bool) -> KaratResult<()> {
  require_confirmation(confirmed, "a product")?;
  if !store.delete_product(id).await? {
    return Err(KaratError::NotFound(format!("Product with ID {} not found.", id)));
  }
  info!(product_id = %id, "Product deleted.");
  Ok(())
}

#[instrument(name = "admin::delete_lead", skip(store))]
pub async fn delete_lead(store: &dyn DataStore, id: Uuid, confirmed: bool) -> KaratResult<()> {
  require_confirmation(confirmed, "a user")?;
  if !store.delete_lead(id).await? {
    return Err(KaratError::NotFound(format!("User with ID {} not found.", id)));
  }
  info!(lead_id = %id, "Lead deleted.");
  Ok(())
}

/// Overwrites the whole rate table in one store call.
#[instrument(name = "admin::save_gold_rates", skip(store))]
pub async fn save_gold_rates(store: &dyn DataStore, rates: GoldRates) -> KaratResult<()> {
  store.set_gold_rates(rates).await?;
  info!("Gold rates updated.");
  Ok(())
}

#[instrument(name = "admin::save_gst_rate", skip(store))]
pub async fn save_gst_rate(store: &dyn DataStore, gst_rate: Decimal) -> KaratResult<()> {
  if gst_rate.is_sign_negative() || gst_rate > MAX_PERCENT {
    return Err(KaratError::validation("GST rate must be between 0 and 100"));
  }
  store.set_gst_rate(gst_rate).await?;
  info!(%gst_rate, "GST rate updated.");
  Ok(())
}
