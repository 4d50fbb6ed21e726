use chrono::{DateTime, Utc};
use rumqttc::{Client, ClientError, QoS};
use serde::Serialize;

use crate::errors::MqttError;

/// Where published messages go.
///
/// Implementations must not block: a full queue is an error, not a wait.
pub trait MqttTransport: Send + Sync {
    fn send(&self, topic: &str, qos: QoS, retain: bool, payload: String) -> Result<(), MqttError>;
}

impl MqttTransport for Client {
    fn send(&self, topic: &str, qos: QoS, retain: bool, payload: String) -> Result<(), MqttError> {
        self.try_publish(topic, qos, retain, payload)
            .map_err(|e| MqttError::PublishFailed {
                topic: topic.to_string(),
                reason: match e {
                    ClientError::TryRequest(_) => "request queue full".to_string(),
                    other => other.to_string(),
                },
            })
    }
}

pub trait MqttPayload {
    fn to_payload(&self) -> String;
}

impl MqttPayload for DateTime<Utc> {
    fn to_payload(&self) -> String {
        self.to_rfc3339()
    }
}

impl MqttPayload for String {
    fn to_payload(&self) -> String {
        self.clone()
    }
}

impl MqttPayload for bool {
    fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl MqttPayload for f64 {
    fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl MqttPayload for u64 {
    fn to_payload(&self) -> String {
        self.to_string()
    }
}

/// Topic prefix bound to a transport; every publish is relative to `topic`
pub struct PublishContext<'a> {
    transport: &'a dyn MqttTransport,
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
}

impl<'a> PublishContext<'a> {
    pub fn new(transport: &'a dyn MqttTransport, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
            qos: QoS::AtLeastOnce,
            retain: true,
        }
    }

    pub fn child(&self, topic: &str) -> PublishContext<'a> {
        PublishContext {
            transport: self.transport,
            topic: format!("{}/{}", self.topic, topic),
            qos: self.qos,
            retain: self.retain,
        }
    }

    pub fn publish<T: MqttPayload>(&self, topic: &str, payload: &T) -> Result<(), MqttError> {
        self.send(topic, payload.to_payload())
    }

    pub fn publish_json<T: Serialize>(&self, topic: &str, value: &T) -> Result<(), MqttError> {
        let json =
            serde_json::to_string(value).map_err(|error| MqttError::SerializationError { error })?;
        self.send(topic, json)
    }

    fn send(&self, topic: &str, payload: String) -> Result<(), MqttError> {
        let full_topic = format!("{}/{}", self.topic, topic);
        self.transport
            .send(&full_topic, self.qos, self.retain, payload)
    }
}
