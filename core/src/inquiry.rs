// karat/src/inquiry.rs

//! Outbound WhatsApp deep links pre-filled with a product summary.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use url::Url;

use crate::error::{KaratError, KaratResult};
use crate::model::Product;
use crate::pricing::PriceBreakdown;
use crate::pricing::money;

const WHATSAPP_BASE: &str = "https://wa.me/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryConfig {
  /// International number without `+`, e.g. `918668722207`.
  pub phone: String,
  pub business_name: String,
}

impl Default for InquiryConfig {
  fn default() -> Self {
    Self {
      phone: "918668722207".to_string(),
      business_name: "Bhamare Jewellers".to_string(),
    }
  }
}

impl InquiryConfig {
  pub fn link(&self, message: &str) -> KaratResult<Url> {
    let mut url = Url::parse(WHATSAPP_BASE)
      .and_then(|base| base.join(&self.phone))
      .map_err(|e| KaratError::Internal(format!("invalid inquiry phone '{}': {}", self.phone, e)))?;
    url.query_pairs_mut().append_pair("text", message);
    Ok(url)
  }

  /// The short message sent from a catalog card.
  pub fn card_message(&self, product: &Product, price: &PriceBreakdown) -> String {
    format!(
      "Hello {},\n\nI'm interested in:\n*{}*\nBarcode: {}\nCategory: {}\nCarat: {}K\nWeight: {}g\nPrice: ₹{}",
      self.business_name,
      product.name,
      product.barcode,
      product.category,
      product.karat,
      product.net_weight.normalize(),
      money(price.total),
    )
  }

  /// The full message sent from the detail view, listing every breakdown line.
  pub fn detail_message(&self, product: &Product, price: &PriceBreakdown) -> String {
    let weight = product.net_weight.normalize();
    let mut msg = format!("Hello {},\n\nI'm interested in this product:\n\n", self.business_name);
    // Writing into a String cannot fail.
    let _ = write!(
      msg,
      "*Product Name:* {}\n*Barcode:* {}\n*Category:* {}\n*Carat:* {}K\n*Net Weight:* {}g\n*Gross Weight:* {}g\n*Making Charges:* {}%\n*GST Rate:* {}%\n\n",
      product.name,
      product.barcode,
      product.category,
      product.karat,
      weight,
      product.gross_weight.normalize(),
      product.making_charge_pct.normalize(),
      price.gst_pct.normalize(),
    );
    let _ = write!(
      msg,
      "*Price Breakdown:*\n- Gold Value ({}g × ₹{}/g): ₹{}\n- Making Charges: ₹{}\n- Hallmark Charges: ₹{}\n- Stone Charges: ₹{}\n- Subtotal: ₹{}\n- GST: ₹{}\n*Total Price:* ₹{}\n\nPlease provide more details about this item.",
      weight,
      money(price.rate),
      money(price.gold_value),
      money(price.making_charge),
      money(price.hallmark_charge),
      money(price.stone_charge),
      money(price.subtotal),
      money(price.gst),
      money(price.total),
    );
    msg
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn link_targets_configured_number_and_encodes_text() {
    let cfg = InquiryConfig::default();
    let url = cfg.link("Hello & welcome\n*Ring*").unwrap();
    assert_eq!(url.host_str(), Some("wa.me"));
    assert_eq!(url.path(), "/918668722207");
    let text: Vec<_> = url.query_pairs().filter(|(k, _)| k == "text").map(|(_, v)| v.into_owned()).collect();
    assert_eq!(text, vec!["Hello & welcome\n*Ring*".to_string()]);
  }
}
