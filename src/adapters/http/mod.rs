//! HTTP adapters - service routes.

pub mod routes;

pub use routes::{app_router, BannerResponse, HealthResponse, SERVICE_BANNER};
