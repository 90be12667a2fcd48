// storefront/src/services/mod.rs

pub mod cloudinary;
pub mod cookie_store;

pub use cloudinary::{CloudinaryHost, UnconfiguredHost};
pub use cookie_store::VisitorCookies;
