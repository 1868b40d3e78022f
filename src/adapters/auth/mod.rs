//! Authentication adapters.
//!
//! Implementations of the `TokenVerifier` port:
//!
//! - `static_token` - In-process allowlist, or accept-any when empty

mod static_token;

pub use static_token::StaticTokenVerifier;
