// karat/src/model/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::KaratError;

/// Gold purity tier used to pick a per-gram rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Karat {
  #[serde(rename = "18")]
  K18,
  #[serde(rename = "20")]
  K20,
  #[default]
  #[serde(rename = "22")]
  K22,
  #[serde(rename = "24")]
  K24,
}

impl Karat {
  pub const ALL: [Karat; 4] = [Karat::K18, Karat::K20, Karat::K22, Karat::K24];

  pub fn as_str(&self) -> &'static str {
    match self {
      Karat::K18 => "18",
      Karat::K20 => "20",
      Karat::K22 => "22",
      Karat::K24 => "24",
    }
  }
}

impl fmt::Display for Karat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Karat {
  type Err = KaratError;

  /// Accepts `"22"` as well as `"22K"` / `"22k"`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let digits = s.trim().trim_end_matches(['K', 'k']);
    Karat::ALL
      .into_iter()
      .find(|k| k.as_str() == digits)
      .ok_or_else(|| KaratError::validation(format!("Unknown karat grade '{}'", s.trim())))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  #[default]
  Ring,
  Bangle,
  Kada,
  Chain,
  Necklace,
  Earring,
  Pendant,
  Bracelet,
  Mangalsutra,
}

impl Category {
  pub const ALL: [Category; 9] = [
    Category::Ring,
    Category::Bangle,
    Category::Kada,
    Category::Chain,
    Category::Necklace,
    Category::Earring,
    Category::Pendant,
    Category::Bracelet,
    Category::Mangalsutra,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Ring => "ring",
      Category::Bangle => "bangle",
      Category::Kada => "kada",
      Category::Chain => "chain",
      Category::Necklace => "necklace",
      Category::Earring => "earring",
      Category::Pendant => "pendant",
      Category::Bracelet => "bracelet",
      Category::Mangalsutra => "mangalsutra",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = KaratError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();
    Category::ALL
      .into_iter()
      .find(|c| c.as_str() == wanted)
      .ok_or_else(|| KaratError::validation(format!("Unknown category '{}'", s.trim())))
  }
}

/// A catalog item. Its price is never stored: it is recomputed from the
/// current rate configuration whenever the product is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub barcode: String,
  pub gross_weight: Decimal,
  pub net_weight: Decimal,
  pub karat: Karat,
  pub category: Category,
  pub hallmark_charge: Decimal,
  pub stone_charge: Decimal,
  pub making_charge_pct: Decimal,
  pub image_url: Option<String>,
  pub customizable: bool,
  /// Per-product GST override; `None` (or zero) falls back to the global rate.
  pub gst_rate: Option<Decimal>,
  pub created_at: DateTime<Utc>,
}

/// Every writable product field. Produced by admin form parsing and
/// consumed by the store on create / update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
  pub name: String,
  pub barcode: String,
  pub gross_weight: Decimal,
  pub net_weight: Decimal,
  pub karat: Karat,
  pub category: Category,
  pub hallmark_charge: Decimal,
  pub stone_charge: Decimal,
  pub making_charge_pct: Decimal,
  pub image_url: Option<String>,
  pub customizable: bool,
  pub gst_rate: Option<Decimal>,
}

impl ProductDraft {
  pub fn into_product(self, id: Uuid, created_at: DateTime<Utc>) -> Product {
    Product {
      id,
      name: self.name,
      barcode: self.barcode,
      gross_weight: self.gross_weight,
      net_weight: self.net_weight,
      karat: self.karat,
      category: self.category,
      hallmark_charge: self.hallmark_charge,
      stone_charge: self.stone_charge,
      making_charge_pct: self.making_charge_pct,
      image_url: self.image_url,
      customizable: self.customizable,
      gst_rate: self.gst_rate,
      created_at,
    }
  }
}
