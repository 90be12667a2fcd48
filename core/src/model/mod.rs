// karat/src/model/mod.rs

//! Records held by the data store and the local store.

pub mod image;
pub mod lead;
pub mod product;
pub mod rates;

pub use image::UploadedImage;
pub use lead::{Lead, NewLead};
pub use product::{Category, Karat, Product, ProductDraft};
pub use rates::{GoldRates, RateConfig, DEFAULT_GST_RATE, GST_SLABS};
