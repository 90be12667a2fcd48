// karat/src/pricing.rs

//! The price formula shared by the catalog, the detail view and the admin
//! listing:
//!
//! ```text
//! gold_value = net_weight × rate[karat]
//! making     = gold_value × making_pct / 100
//! subtotal   = gold_value + making + hallmark + stone
//! gst        = subtotal × gst_pct / 100
//! total      = subtotal + gst
//! ```
//!
//! Values are exact decimals; rounding to two places only happens when a
//! breakdown is rendered.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Product, RateConfig};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PricingInput {
  pub net_weight: Decimal,
  pub rate: Decimal,
  pub making_charge_pct: Decimal,
  pub hallmark_charge: Decimal,
  pub stone_charge: Decimal,
  pub gst_pct: Decimal,
}

impl PricingInput {
  /// Resolves the rate for the product's karat and the applicable GST
  /// (product override when set and non-zero, else the global rate).
  pub fn for_product(product: &Product, rates: &RateConfig) -> Self {
    Self {
      net_weight: product.net_weight,
      rate: rates.gold_rates.rate_for(product.karat),
      making_charge_pct: product.making_charge_pct,
      hallmark_charge: product.hallmark_charge,
      stone_charge: product.stone_charge,
      gst_pct: applicable_gst(product.gst_rate, rates.gst_rate),
    }
  }
}

pub fn applicable_gst(product_override: Option<Decimal>, global: Decimal) -> Decimal {
  product_override.filter(|g| !g.is_zero()).unwrap_or(global)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceBreakdown {
  pub rate: Decimal,
  pub gst_pct: Decimal,
  pub gold_value: Decimal,
  pub making_charge: Decimal,
  pub hallmark_charge: Decimal,
  pub stone_charge: Decimal,
  pub subtotal: Decimal,
  pub gst: Decimal,
  pub total: Decimal,
}

impl PriceBreakdown {
  /// True when the product could not be priced (no rate or no weight).
  pub fn is_unpriced(&self) -> bool {
    self.total.is_zero() && self.gold_value.is_zero()
  }

  pub fn display(&self) -> DisplayBreakdown {
    DisplayBreakdown {
      rate: money(self.rate),
      gst_pct: self.gst_pct.normalize().to_string(),
      gold_value: money(self.gold_value),
      making_charge: money(self.making_charge),
      hallmark_charge: money(self.hallmark_charge),
      stone_charge: money(self.stone_charge),
      subtotal: money(self.subtotal),
      gst: money(self.gst),
      total: money(self.total),
    }
  }
}

/// A breakdown rendered as two-decimal strings, ready for a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBreakdown {
  pub rate: String,
  pub gst_pct: String,
  pub gold_value: String,
  pub making_charge: String,
  pub hallmark_charge: String,
  pub stone_charge: String,
  pub subtotal: String,
  pub gst: String,
  pub total: String,
}

/// Formats a currency amount with exactly two fraction digits.
pub fn money(amount: Decimal) -> String {
  let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  rounded.rescale(2);
  rounded.to_string()
}

/// Computes the price. Never fails: a missing (zero or negative) rate or
/// weight, or an amount too large to represent, yields the zero breakdown.
pub fn price(input: &PricingInput) -> PriceBreakdown {
  if input.rate <= Decimal::ZERO || input.net_weight <= Decimal::ZERO {
    return unpriced(input);
  }
  match checked_price(input) {
    Some(breakdown) => breakdown,
    None => {
      warn!(net_weight = %input.net_weight, rate = %input.rate, "Price overflowed; treating as unavailable.");
      unpriced(input)
    }
  }
}

fn unpriced(input: &PricingInput) -> PriceBreakdown {
  PriceBreakdown {
    rate: input.rate.max(Decimal::ZERO),
    gst_pct: input.gst_pct,
    ..PriceBreakdown::default()
  }
}

fn checked_price(input: &PricingInput) -> Option<PriceBreakdown> {
  let gold_value = input.net_weight.checked_mul(input.rate)?;
  let making_charge = gold_value.checked_mul(input.making_charge_pct)?.checked_div(HUNDRED)?;
  let subtotal = gold_value
    .checked_add(making_charge)?
    .checked_add(input.hallmark_charge)?
    .checked_add(input.stone_charge)?;
  let gst = subtotal.checked_mul(input.gst_pct)?.checked_div(HUNDRED)?;

  Some(PriceBreakdown {
    rate: input.rate,
    gst_pct: input.gst_pct,
    gold_value,
    making_charge,
    hallmark_charge: input.hallmark_charge,
    stone_charge: input.stone_charge,
    subtotal,
    gst,
    total: subtotal.checked_add(gst)?,
  })
}

pub fn price_product(product: &Product, rates: &RateConfig) -> PriceBreakdown {
  price(&PricingInput::for_product(product, rates))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
  }

  #[test]
  fn money_pads_and_rounds_half_away_from_zero() {
    assert_eq!(money(dec("68495")), "68495.00");
    assert_eq!(money(dec("1.005")), "1.01");
    assert_eq!(money(dec("2.5")), "2.50");
    assert_eq!(money(dec("0")), "0.00");
  }

  #[test]
  fn negative_weight_is_treated_as_missing() {
    let b = price(&PricingInput {
      net_weight: dec("-1"),
      rate: dec("6000"),
      gst_pct: dec("3"),
      ..Default::default()
    });
    assert_eq!(b.total, Decimal::ZERO);
    assert!(b.is_unpriced());
  }

  #[test]
  fn overflowing_amounts_price_as_unavailable() {
    let b = price(&PricingInput {
      net_weight: dec("99999999999999999999999999"),
      rate: dec("6000"),
      making_charge_pct: dec("12"),
      gst_pct: dec("3"),
      ..Default::default()
    });
    assert!(b.is_unpriced());
    assert_eq!(b.rate, dec("6000"));

    let b = price(&PricingInput {
      net_weight: dec("1"),
      rate: dec("1"),
      hallmark_charge: Decimal::MAX,
      stone_charge: Decimal::MAX,
      ..Default::default()
    });
    assert!(b.is_unpriced());
  }

  #[test]
  fn zero_override_falls_back_to_global_gst() {
    assert_eq!(applicable_gst(Some(Decimal::ZERO), dec("3")), dec("3"));
    assert_eq!(applicable_gst(Some(dec("5")), dec("3")), dec("5"));
    assert_eq!(applicable_gst(None, dec("1.5")), dec("1.5"));
  }
}
