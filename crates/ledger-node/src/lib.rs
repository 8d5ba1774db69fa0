//! HTTP surface of a ledger node and the client it uses to reach peers.
pub mod api;
pub mod config;
pub mod identity;
pub mod peer;

pub use api::{router, AppState};
pub use peer::HttpPeerClient;
