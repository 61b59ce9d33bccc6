//! # Clashtrack CoC API
//!
//! Thin typed client over the public Clash of Clans REST API. Handles
//! authentication, client side rate limiting and request metrics, and maps
//! the player payloads onto [`clashtrack_shared`] types.

pub mod api;
pub mod types;

pub use api::CocApiClient;
