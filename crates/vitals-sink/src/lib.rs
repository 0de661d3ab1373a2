pub mod avro;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod json_lines;
#[cfg(feature = "kafka")]
pub mod registry;
pub mod settings;

pub use error::SinkError;
pub use json_lines::JsonLinesSink;
pub use settings::{RegistrySettings, SinkSettings};

use vitals_core::Event;

/// Destination for synthesized events, fed one event at a time in emission order.
pub trait Sink {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError>;

    /// Drain anything buffered. Called once at shutdown.
    fn flush(&mut self) -> Result<(), SinkError>;

    fn describe(&self) -> String;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        (**self).publish(event)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Construct the sink selected by `settings`.
pub fn build_sink(settings: &SinkSettings) -> Result<Box<dyn Sink>, SinkError> {
    match settings {
        SinkSettings::Stdout => Ok(Box::new(JsonLinesSink::stdout())),
        #[cfg(feature = "kafka")]
        SinkSettings::Kafka { .. } | SinkSettings::KafkaAvro { .. } => {
            Ok(Box::new(kafka::KafkaSink::connect(settings)?))
        }
        #[cfg(not(feature = "kafka"))]
        SinkSettings::Kafka { topic, .. } | SinkSettings::KafkaAvro { topic, .. } => {
            Err(SinkError::BrokerUnavailable(topic.clone()))
        }
    }
}
