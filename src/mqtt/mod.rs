//! MQTT rendering sink
//!
//! Publishes live windows, totals and the fleet summary below a root topic.

pub mod context;
pub mod publisher;

pub use publisher::MqttPublisher;
