use crate::avro::{value_subject, ConfluentEncoder, HEALTH_EVENT_SCHEMA};
use crate::error::SinkError;
use crate::registry::register_schema;
use crate::settings::SinkSettings;
use crate::Sink;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use std::collections::BTreeMap;
use std::time::Duration;
use vitals_core::Event;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

enum Encoding {
    Json,
    Avro(ConfluentEncoder),
}

/// Publishes events to a Kafka topic, keyed by patient id so each patient's
/// stream stays ordered within its partition.
pub struct KafkaSink {
    producer: BaseProducer,
    topic: String,
    encoding: Encoding,
}

impl KafkaSink {
    pub fn connect(settings: &SinkSettings) -> Result<Self, SinkError> {
        let (topic, properties, encoding) = match settings {
            SinkSettings::Kafka { topic, properties } => (topic, properties, Encoding::Json),
            SinkSettings::KafkaAvro {
                topic,
                properties,
                registry,
            } => {
                let schema_id =
                    register_schema(registry, &value_subject(topic), HEALTH_EVENT_SCHEMA)?;
                (topic, properties, Encoding::Avro(ConfluentEncoder::new(schema_id)?))
            }
            SinkSettings::Stdout => {
                return Err(SinkError::InvalidConfig(
                    "stdout settings passed to the Kafka sink".into(),
                ))
            }
        };

        let producer = client_config(properties)
            .create::<BaseProducer>()
            .map_err(|e| SinkError::Broker(e.to_string()))?;
        tracing::info!(topic = %topic, "kafka producer ready");

        Ok(Self {
            producer,
            topic: topic.clone(),
            encoding,
        })
    }
}

fn client_config(properties: &BTreeMap<String, String>) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in properties {
        config.set(key, value);
    }
    config
}

impl Sink for KafkaSink {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        let payload = match &self.encoding {
            Encoding::Json => serde_json::to_vec(event)?,
            Encoding::Avro(encoder) => encoder.encode(event)?,
        };
        let key = event.patient_id.to_string();
        self.producer
            .send(BaseRecord::to(&self.topic).key(&key).payload(&payload))
            .map_err(|(e, _)| SinkError::Broker(e.to_string()))?;
        // Serve delivery callbacks without blocking the tick.
        self.producer.poll(Duration::ZERO);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.producer
            .flush(FLUSH_TIMEOUT)
            .map_err(|e| SinkError::Broker(e.to_string()))
    }

    fn describe(&self) -> String {
        let encoding = match self.encoding {
            Encoding::Json => "json",
            Encoding::Avro(_) => "avro",
        };
        format!("kafka(topic={}, encoding={encoding})", self.topic)
    }
}
