//! Avro encoding of events with Confluent schema-registry framing:
//! magic byte `0`, the 4-byte big-endian schema id, then the Avro datum.

use crate::error::SinkError;
use apache_avro::types::Value;
use apache_avro::Schema;
use vitals_core::Event;

pub const MAGIC_BYTE: u8 = 0;

pub const HEALTH_EVENT_SCHEMA: &str = r#"{
  "namespace": "health_events",
  "name": "health_event",
  "type": "record",
  "fields": [
    {"name": "event_id", "type": "string"},
    {"name": "patient_id", "type": "int"},
    {
      "name": "device_metadata",
      "type": {
        "type": "record",
        "name": "device_metadata",
        "fields": [
          {"name": "device_type", "type": "string"},
          {"name": "battery_level", "type": "int"},
          {"name": "sensor_status", "type": "string"}
        ]
      }
    },
    {
      "name": "vitals",
      "type": {
        "type": "record",
        "name": "vitals",
        "fields": [
          {"name": "heart_rate", "type": "int"},
          {"name": "blood_oxygen_spO2", "type": "int"},
          {
            "name": "blood_pressure",
            "type": {
              "type": "record",
              "name": "blood_pressure",
              "fields": [
                {"name": "systolic", "type": "int"},
                {"name": "diastolic", "type": "int"}
              ]
            }
          },
          {"name": "body_temperature_c", "type": "float"}
        ]
      }
    }
  ]
}"#;

pub fn health_event_schema() -> Result<Schema, SinkError> {
    Ok(Schema::parse_str(HEALTH_EVENT_SCHEMA)?)
}

/// Registry subject for the value schema of `topic` (topic-name strategy).
pub fn value_subject(topic: &str) -> String {
    format!("{topic}-value")
}

/// The event as an Avro record matching [`HEALTH_EVENT_SCHEMA`].
pub fn to_avro_value(event: &Event) -> Value {
    let device = &event.device_metadata;
    let vitals = &event.vitals;
    Value::Record(vec![
        ("event_id".into(), Value::String(event.event_id.clone())),
        ("patient_id".into(), Value::Int(event.patient_id)),
        (
            "device_metadata".into(),
            Value::Record(vec![
                ("device_type".into(), Value::String(device.device_type.clone())),
                ("battery_level".into(), Value::Int(device.battery_level)),
                (
                    "sensor_status".into(),
                    Value::String(device.sensor_status.as_str().to_string()),
                ),
            ]),
        ),
        (
            "vitals".into(),
            Value::Record(vec![
                ("heart_rate".into(), Value::Int(vitals.heart_rate)),
                ("blood_oxygen_spO2".into(), Value::Int(vitals.blood_oxygen_spo2)),
                (
                    "blood_pressure".into(),
                    Value::Record(vec![
                        ("systolic".into(), Value::Int(vitals.blood_pressure.systolic)),
                        ("diastolic".into(), Value::Int(vitals.blood_pressure.diastolic)),
                    ]),
                ),
                ("body_temperature_c".into(), Value::Float(vitals.body_temperature_c)),
            ]),
        ),
    ])
}

/// Encodes events under a registry-assigned schema id.
#[derive(Debug)]
pub struct ConfluentEncoder {
    schema: Schema,
    schema_id: u32,
}

impl ConfluentEncoder {
    pub fn new(schema_id: u32) -> Result<Self, SinkError> {
        Ok(Self {
            schema: health_event_schema()?,
            schema_id,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn encode(&self, event: &Event) -> Result<Vec<u8>, SinkError> {
        let datum = apache_avro::to_avro_datum(&self.schema, to_avro_value(event))?;
        let mut framed = Vec::with_capacity(5 + datum.len());
        framed.push(MAGIC_BYTE);
        framed.extend_from_slice(&self.schema_id.to_be_bytes());
        framed.extend_from_slice(&datum);
        Ok(framed)
    }
}
