//! Client and collectors for TCGPlayer marketplace sales.
//!
//! The core is [`SalesCollector::collect_sales`], which pages through a
//! product's latest sales, and [`extract_ids`], which turns a set's catalog
//! into the product ids to collect. [`Updater`] runs both over a whole set
//! and writes one JSON file per product.
mod collector;
mod config;
mod error;
mod http;
mod id;
mod lister;
mod rate_limiter;
pub mod schema;
mod store;
pub mod transport;
mod update;

pub use collector::{PartialHistory, SalesCollector};
pub use config::{Config, Target};
pub use error::Error;
pub use http::HttpClient;
pub use id::ProductId;
pub use lister::extract_ids;
pub use rate_limiter::DelayPolicy;
pub use schema::{Catalog, CatalogEntry, ListingType, Sale, SalesHistory};
pub use store::JsonFileStore;
pub use update::{BatchReport, Updater};

pub type Result<T> = std::result::Result<T, Error>;
