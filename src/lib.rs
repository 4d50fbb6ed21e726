//! City Energy Live Bridge
//!
//! Polls the city energy sensor API and turns every snapshot into rolling
//! live-metric windows, published to MQTT or the log.

pub mod api;
pub mod config;
pub mod errors;
pub mod history;
pub mod live;
pub mod mqtt;
pub mod render;

pub use api::ApiClient;
pub use config::Config;
pub use mqtt::MqttPublisher;
