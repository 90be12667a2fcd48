// src/lib.rs

//! Karat: the domain core of a jewellery storefront.
//!
//! Prices are never stored. Every view recomputes them from the product
//! fields and the current rate configuration:
//!  - `pricing` holds the one formula every view shares.
//!  - `catalog`, `detail` and `admin` build the listing, the single-product
//!    breakdown and the operator's write paths on top of it.
//!  - `gate` and `media` own the visitor-local state (lead-capture flag,
//!    uploaded-image list).
//!  - `store` is the persistence boundary: a shared `DataStore` with live,
//!    cancellable subscriptions, and a per-visitor `LocalStore`.
//!  - `flow` is a small step-workflow engine; `flows` defines the
//!    multi-step operations on it.

pub mod admin;
pub mod catalog;
pub mod detail;
pub mod error;
pub mod flow;
pub mod flows;
pub mod gate;
pub mod inquiry;
pub mod media;
pub mod model;
pub mod pricing;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::admin::ProductForm;
pub use crate::catalog::{CatalogQuery, CatalogView, CategoryFilter, LeadQuery, LiveCatalog, PricedProduct};
pub use crate::detail::ProductDetail;
pub use crate::error::{KaratError, KaratResult};
pub use crate::flow::{Outcome, Shared, StepControl, Workflow, Workflows};
pub use crate::gate::{GateState, LeadForm, LeadGate};
pub use crate::inquiry::InquiryConfig;
pub use crate::media::{HostUpload, HostedImage, ImageLibrary, ImageUpload, MediaHost, UploadLimits};
pub use crate::model::{Category, GoldRates, Karat, Lead, NewLead, Product, ProductDraft, RateConfig, UploadedImage};
pub use crate::pricing::{price, price_product, DisplayBreakdown, PriceBreakdown, PricingInput};
pub use crate::store::{ChangeFeed, DataStore, LocalStore, MemoryLocalStore, MemoryStore, Subscription, Topic};
