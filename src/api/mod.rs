//! Sensor API module
//!
//! HTTP access to the energy backend and its wire types.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;
