//! Clash of Clans API client implementation.

pub mod client;
pub mod metrics;
mod players;

pub use players::CocApiClient;
