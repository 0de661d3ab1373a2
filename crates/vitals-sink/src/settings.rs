use crate::error::SinkError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const REGISTRY_URL: &str = "schema.registry.url";
const BASIC_AUTH_USER_INFO: &str = "basic.auth.user.info";
const BASIC_AUTH_SOURCE: &str = "basic.auth.credentials.source";
const BEARER_AUTH_TOKEN: &str = "bearer.auth.token";

/// Connection details for a Confluent-compatible schema registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub url: String,
    pub basic_auth_user_info: Option<String>,
    pub bearer_auth_token: Option<String>,
}

/// Where events go, resolved from the run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSettings {
    Stdout,
    Kafka {
        topic: String,
        properties: BTreeMap<String, String>,
    },
    KafkaAvro {
        topic: String,
        properties: BTreeMap<String, String>,
        registry: RegistrySettings,
    },
}

impl SinkSettings {
    /// Pick the sink from the `kafka` config section.
    ///
    /// An absent or empty section, or `force_stdout`, selects stdout. A
    /// `schema.registry.url` key selects Avro output; registry credentials
    /// are split off the broker properties. The topic comes from the section
    /// itself, falling back to `topic_fallback`.
    pub fn resolve(
        kafka: Option<&Map<String, Value>>,
        topic_fallback: Option<&str>,
        force_stdout: bool,
    ) -> Result<Self, SinkError> {
        let section = match kafka {
            Some(section) if !section.is_empty() && !force_stdout => section,
            _ => return Ok(SinkSettings::Stdout),
        };

        let mut properties = BTreeMap::new();
        for (key, value) in section {
            properties.insert(key.clone(), property_string(key, value)?);
        }

        let topic = properties
            .remove("topic")
            .or_else(|| topic_fallback.map(str::to_string))
            .filter(|t| !t.is_empty())
            .ok_or(SinkError::MissingTopic)?;

        let Some(url) = properties.remove(REGISTRY_URL) else {
            return Ok(SinkSettings::Kafka { topic, properties });
        };
        if url.is_empty() {
            return Err(SinkError::MissingRegistryUrl);
        }

        let registry = RegistrySettings {
            url,
            basic_auth_user_info: properties.remove(BASIC_AUTH_USER_INFO),
            bearer_auth_token: properties.remove(BEARER_AUTH_TOKEN),
        };
        properties.remove(BASIC_AUTH_SOURCE);
        properties.retain(|key, _| !key.starts_with("schema.registry."));

        Ok(SinkSettings::KafkaAvro {
            topic,
            properties,
            registry,
        })
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            SinkSettings::Stdout => None,
            SinkSettings::Kafka { topic, .. } | SinkSettings::KafkaAvro { topic, .. } => {
                Some(topic)
            }
        }
    }
}

fn property_string(key: &str, value: &Value) -> Result<String, SinkError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(SinkError::InvalidConfig(format!(
            "property '{key}' must be a string, number or bool"
        ))),
    }
}
