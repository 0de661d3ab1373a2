use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("kafka config must include a 'topic' field")]
    MissingTopic,
    #[error("schema.registry.url is required for Avro output")]
    MissingRegistryUrl,
    #[error("invalid sink config: {0}")]
    InvalidConfig(String),
    #[error("broker output for topic '{0}' requires the `kafka` feature")]
    BrokerUnavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("avro encoding failed: {0}")]
    Avro(#[from] apache_avro::Error),
    #[error("schema registry error: {0}")]
    Registry(String),
    #[error("broker error: {0}")]
    Broker(String),
}
