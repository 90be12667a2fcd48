// karat/src/model/rates.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::product::Karat;

/// GST percentage used when the store holds no value.
pub const DEFAULT_GST_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// GST percentages offered by the admin form.
pub const GST_SLABS: [Decimal; 6] = [
  Decimal::from_parts(15, 0, 0, false, 1),
  Decimal::from_parts(3, 0, 0, false, 0),
  Decimal::from_parts(5, 0, 0, false, 0),
  Decimal::from_parts(75, 0, 0, false, 1),
  Decimal::from_parts(12, 0, 0, false, 0),
  Decimal::from_parts(18, 0, 0, false, 0),
];

/// Per-gram gold price for each karat grade. A grade without an entry has
/// no rate and prices to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoldRates(BTreeMap<Karat, Decimal>);

impl GoldRates {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, karat: Karat, rate: Decimal) -> Self {
    self.0.insert(karat, rate);
    self
  }

  pub fn set(&mut self, karat: Karat, rate: Decimal) {
    self.0.insert(karat, rate);
  }

  /// Rate for `karat`, zero when absent.
  pub fn rate_for(&self, karat: Karat) -> Decimal {
    self.0.get(&karat).copied().unwrap_or(Decimal::ZERO)
  }

  pub fn iter(&self) -> impl Iterator<Item = (Karat, Decimal)> + '_ {
    self.0.iter().map(|(k, v)| (*k, *v))
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<(Karat, Decimal)> for GoldRates {
  fn from_iter<I: IntoIterator<Item = (Karat, Decimal)>>(iter: I) -> Self {
    GoldRates(iter.into_iter().collect())
  }
}

/// The singleton rate configuration every price is computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
  pub gold_rates: GoldRates,
  pub gst_rate: Decimal,
}

impl Default for RateConfig {
  fn default() -> Self {
    Self {
      gold_rates: GoldRates::default(),
      gst_rate: DEFAULT_GST_RATE,
    }
  }
}

impl RateConfig {
  /// Builds the configuration from stored values; a missing or zero GST
  /// falls back to [`DEFAULT_GST_RATE`].
  pub fn from_stored(gold_rates: GoldRates, gst_rate: Option<Decimal>) -> Self {
    Self {
      gold_rates,
      gst_rate: gst_rate.filter(|g| !g.is_zero()).unwrap_or(DEFAULT_GST_RATE),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gold_rates_serialize_keyed_by_grade() {
    let rates = GoldRates::new()
      .with(Karat::K22, Decimal::new(6000, 0))
      .with(Karat::K18, Decimal::new(4900, 0));
    let json = serde_json::to_value(&rates).unwrap();
    assert_eq!(json, serde_json::json!({"18": "4900", "22": "6000"}));

    let back: GoldRates = serde_json::from_value(json).unwrap();
    assert_eq!(back.rate_for(Karat::K22), Decimal::new(6000, 0));
    assert_eq!(back.rate_for(Karat::K24), Decimal::ZERO);
  }

  #[test]
  fn stored_gst_defaults_to_three_percent() {
    assert_eq!(RateConfig::from_stored(GoldRates::new(), None).gst_rate, Decimal::new(3, 0));
    assert_eq!(
      RateConfig::from_stored(GoldRates::new(), Some(Decimal::ZERO)).gst_rate,
      Decimal::new(3, 0)
    );
    assert_eq!(
      RateConfig::from_stored(GoldRates::new(), Some(Decimal::new(5, 0))).gst_rate,
      Decimal::new(5, 0)
    );
  }

  #[test]
  fn slabs_hold_expected_values() {
    assert_eq!(GST_SLABS[0], Decimal::new(15, 1));
    assert_eq!(GST_SLABS[3], Decimal::new(75, 1));
  }
}
