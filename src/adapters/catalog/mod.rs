//! Catalog adapters implementing the LookupGateway port.

mod static_catalog;

pub use static_catalog::{StaticCatalog, StaticCatalogBuilder};
