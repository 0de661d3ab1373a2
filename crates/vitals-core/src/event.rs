use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Length of generated event identifiers.
pub const EVENT_ID_LEN: usize = 12;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Stable,
    Noisy,
    Offline,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Stable => "stable",
            SensorStatus::Noisy => "noisy",
            SensorStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub device_type: String,
    pub battery_level: i32,
    pub sensor_status: SensorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: i32,
    pub diastolic: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub heart_rate: i32,
    #[serde(rename = "blood_oxygen_spO2")]
    pub blood_oxygen_spo2: i32,
    pub blood_pressure: BloodPressure,
    pub body_temperature_c: f32,
}

/// One synthesized reading for one patient at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub patient_id: i32,
    pub device_metadata: DeviceMetadata,
    pub vitals: Vitals,
}

/// Random lower-case alphanumeric identifier of [`EVENT_ID_LEN`] characters.
pub fn short_id(rng: &mut dyn RngCore) -> String {
    (0..EVENT_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
