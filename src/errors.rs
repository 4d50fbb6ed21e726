//! Error types for the live energy bridge
//!
//! Uses thiserror for ergonomic error definitions.
//! These errors can be converted to anyhow::Error in the main application.

/// Sensor API request and envelope errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("API returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("API rejected request: {0}")]
    Rejected(String),

    #[error("API response carried no data")]
    MissingData,

    #[error("Failed to decode API response: {0}")]
    Decode(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Date {0} is after today")]
    FutureDate(chrono::NaiveDate),
}

/// MQTT connection and publishing errors
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("Failed to publish message to topic '{topic}': {reason}")]
    PublishFailed { topic: String, reason: String },

    #[error("Failed to serialize data: {error:?}")]
    SerializationError { error: serde_json::Error },

    #[error("MQTT client error: {0}")]
    ClientError(String),
}

/// Errors raised while handing live data to a rendering sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error(transparent)]
    Mqtt(#[from] MqttError),
}
