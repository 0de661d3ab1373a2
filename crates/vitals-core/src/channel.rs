use crate::drift::DriftParams;
use crate::error::CoreError;
use crate::event::SensorStatus;
use crate::value_set::ValueSet;
use serde::{Deserialize, Serialize};

/// Physiological channels that carry a base value, circadian swing and drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    HeartRate,
    Spo2,
    Systolic,
    Diastolic,
    Temperature,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::HeartRate,
        Channel::Spo2,
        Channel::Systolic,
        Channel::Diastolic,
        Channel::Temperature,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub base: f64,
    pub circadian_amplitude: f64,
    pub drift: Option<DriftParams>,
    pub values: ValueSet,
}

impl ChannelSpec {
    fn validate(&self) -> Result<(), CoreError> {
        if let Some(drift) = &self.drift {
            drift.validate()?;
        }
        Ok(())
    }
}

/// Battery depletion: one step down per `window_s` of run time, minus a
/// small integer jitter, bounded to `[floor, ceiling]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryModel {
    pub window_s: f64,
    pub max_jitter: u32,
    pub floor: i64,
    pub ceiling: i64,
    pub values: ValueSet,
}

impl BatteryModel {
    /// Raw (pre-discretization) battery level at `elapsed_s` given a jitter draw.
    pub fn level(&self, elapsed_s: f64, jitter: u32) -> i64 {
        let depleted = (elapsed_s.max(0.0) / self.window_s).floor() as i64;
        (self.ceiling - depleted - i64::from(jitter)).clamp(self.floor, self.ceiling)
    }
}

/// Device-side metadata choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub device_types: Vec<String>,
    pub sensor_status_weights: Vec<(SensorStatus, f64)>,
    pub battery: BatteryModel,
}

impl DeviceProfile {
    fn validate(&self) -> Result<(), CoreError> {
        if self.device_types.is_empty() {
            return Err(CoreError::InvalidDeviceProfile("no device types".into()));
        }
        if self.sensor_status_weights.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(CoreError::InvalidDeviceProfile(
                "sensor status weights must be finite and >= 0".into(),
            ));
        }
        let total: f64 = self.sensor_status_weights.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(CoreError::InvalidDeviceProfile(format!(
                "sensor status weights must sum to 1, got {total}"
            )));
        }
        let battery = &self.battery;
        if !(battery.window_s.is_finite() && battery.window_s > 0.0) {
            return Err(CoreError::InvalidDeviceProfile(
                "battery window must be positive".into(),
            ));
        }
        if battery.floor > battery.ceiling {
            return Err(CoreError::InvalidDeviceProfile(
                "battery floor above ceiling".into(),
            ));
        }
        Ok(())
    }
}

/// Immutable per-run channel configuration shared by every patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCatalog {
    pub heart_rate: ChannelSpec,
    pub spo2: ChannelSpec,
    pub systolic: ChannelSpec,
    pub diastolic: ChannelSpec,
    pub temperature: ChannelSpec,
    pub device: DeviceProfile,
}

impl ChannelCatalog {
    pub fn new(
        heart_rate: ChannelSpec,
        spo2: ChannelSpec,
        systolic: ChannelSpec,
        diastolic: ChannelSpec,
        temperature: ChannelSpec,
        device: DeviceProfile,
    ) -> Result<Self, CoreError> {
        let catalog = Self {
            heart_rate,
            spo2,
            systolic,
            diastolic,
            temperature,
            device,
        };
        for channel in Channel::ALL {
            catalog.spec(channel).validate()?;
        }
        catalog.device.validate()?;
        Ok(catalog)
    }

    /// Channel set of the reference bedside wearable fleet.
    pub fn reference() -> Result<Self, CoreError> {
        let hr_normal = ValueSet::stepped(55.0, 150.0, 5.0)?;
        let hr_low = ValueSet::stepped(20.0, 50.0, 5.0)?;
        let bp_amplitude = 8.0;

        Self::new(
            ChannelSpec {
                base: 82.0,
                circadian_amplitude: 12.0,
                drift: Some(DriftParams::symmetric(1.5, 6.0)),
                values: hr_normal.union(&hr_low),
            },
            ChannelSpec {
                base: 96.0,
                circadian_amplitude: 1.0,
                drift: Some(DriftParams::symmetric(0.6, 3.0)),
                values: ValueSet::stepped(82.0, 100.0, 2.0)?,
            },
            ChannelSpec {
                base: 120.0,
                circadian_amplitude: bp_amplitude,
                drift: Some(DriftParams::symmetric(2.5, 12.0)),
                values: ValueSet::stepped(90.0, 180.0, 5.0)?,
            },
            ChannelSpec {
                base: 78.0,
                circadian_amplitude: bp_amplitude * 0.6,
                drift: Some(DriftParams::symmetric(1.5, 8.0)),
                values: ValueSet::stepped(60.0, 120.0, 5.0)?,
            },
            ChannelSpec {
                base: 36.7,
                circadian_amplitude: 0.5,
                drift: Some(DriftParams::symmetric(0.05, 0.4)),
                values: ValueSet::stepped(35.0, 40.0, 0.5)?,
            },
            DeviceProfile {
                device_types: vec![
                    "wearable_v4".into(),
                    "wearable_v3".into(),
                    "wearable_v2".into(),
                ],
                sensor_status_weights: vec![
                    (SensorStatus::Stable, 0.80),
                    (SensorStatus::Noisy, 0.15),
                    (SensorStatus::Offline, 0.05),
                ],
                battery: BatteryModel {
                    window_s: 300.0,
                    max_jitter: 2,
                    floor: 5,
                    ceiling: 100,
                    values: ValueSet::stepped(5.0, 100.0, 5.0)?,
                },
            },
        )
    }

    pub fn spec(&self, channel: Channel) -> &ChannelSpec {
        match channel {
            Channel::HeartRate => &self.heart_rate,
            Channel::Spo2 => &self.spo2,
            Channel::Systolic => &self.systolic,
            Channel::Diastolic => &self.diastolic,
            Channel::Temperature => &self.temperature,
        }
    }
}
