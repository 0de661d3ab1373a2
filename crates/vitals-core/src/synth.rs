use crate::channel::{Channel, ChannelCatalog};
use crate::circadian::{circadian_offset, DAY_SECONDS};
use crate::drift::DriftGenerator;
use crate::error::CoreError;
use crate::event::{short_id, BloodPressure, DeviceMetadata, Event, SensorStatus, Vitals};
use crate::overlay::Scenario;
use rand::distributions::WeightedIndex;
use rand::{Rng, RngCore};
use rand_distr::Distribution;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-patient drift state. Each patient owns its own walks so traces of
/// different patients stay uncorrelated.
#[derive(Debug, Clone)]
pub struct PatientState {
    patient_id: i32,
    drift: BTreeMap<Channel, DriftGenerator>,
}

impl PatientState {
    pub fn new(patient_id: i32, catalog: &ChannelCatalog) -> Result<Self, CoreError> {
        let mut drift = BTreeMap::new();
        for channel in Channel::ALL {
            if let Some(params) = catalog.spec(channel).drift {
                drift.insert(channel, DriftGenerator::new(params)?);
            }
        }
        Ok(Self { patient_id, drift })
    }

    pub fn patient_id(&self) -> i32 {
        self.patient_id
    }

    pub fn drift(&self, channel: Channel) -> Option<&DriftGenerator> {
        self.drift.get(&channel)
    }

    fn step(&mut self, channel: Channel, rng: &mut dyn RngCore) -> f64 {
        self.drift
            .get_mut(&channel)
            .map(|walk| walk.step(rng))
            .unwrap_or(0.0)
    }
}

/// Composes channels into events and layers the scenario on top.
#[derive(Debug)]
pub struct Synthesizer {
    catalog: ChannelCatalog,
    scenario: Scenario,
    statuses: Vec<SensorStatus>,
    status_weights: WeightedIndex<f64>,
}

impl Synthesizer {
    pub fn new(catalog: ChannelCatalog, scenario: Scenario) -> Result<Self, CoreError> {
        let statuses = catalog
            .device
            .sensor_status_weights
            .iter()
            .map(|(status, _)| *status)
            .collect();
        let status_weights =
            WeightedIndex::new(catalog.device.sensor_status_weights.iter().map(|(_, w)| *w))
                .map_err(|e| CoreError::InvalidDeviceProfile(e.to_string()))?;
        Ok(Self {
            catalog,
            scenario,
            statuses,
            status_weights,
        })
    }

    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn patient(&self, patient_id: i32) -> Result<PatientState, CoreError> {
        PatientState::new(patient_id, &self.catalog)
    }

    /// One finished event for `patient`: composed channels with the
    /// scenario's overlays applied last.
    pub fn synthesize(
        &self,
        patient: &mut PatientState,
        now_s: f64,
        elapsed: Duration,
        rng: &mut dyn RngCore,
    ) -> Event {
        let mut event = self.compose(patient, now_s, elapsed, rng);
        self.scenario.apply(&mut event, elapsed, &self.catalog, rng);
        event
    }

    /// Base + circadian + drift for every channel, discretized, without overlays.
    pub fn compose(
        &self,
        patient: &mut PatientState,
        now_s: f64,
        elapsed: Duration,
        rng: &mut dyn RngCore,
    ) -> Event {
        let event_id = short_id(rng);

        let heart_rate = self.channel_value(Channel::HeartRate, patient, now_s, rng);
        let temperature = self.channel_value(Channel::Temperature, patient, now_s, rng);
        let systolic = self.channel_value(Channel::Systolic, patient, now_s, rng);
        let diastolic = self.channel_value(Channel::Diastolic, patient, now_s, rng);
        let spo2 = self.channel_value(Channel::Spo2, patient, now_s, rng);

        let device_metadata = self.device_metadata(elapsed, rng);

        Event {
            event_id,
            patient_id: patient.patient_id,
            device_metadata,
            vitals: Vitals {
                heart_rate: heart_rate.round() as i32,
                blood_oxygen_spo2: spo2.round() as i32,
                blood_pressure: BloodPressure {
                    systolic: systolic.round() as i32,
                    diastolic: diastolic.round() as i32,
                },
                body_temperature_c: temperature as f32,
            },
        }
    }

    fn channel_value(
        &self,
        channel: Channel,
        patient: &mut PatientState,
        now_s: f64,
        rng: &mut dyn RngCore,
    ) -> f64 {
        let spec = self.catalog.spec(channel);
        let raw = spec.base
            + circadian_offset(now_s, DAY_SECONDS, spec.circadian_amplitude)
            + patient.step(channel, rng);
        spec.values.nearest(raw)
    }

    fn device_metadata(&self, elapsed: Duration, rng: &mut dyn RngCore) -> DeviceMetadata {
        let device = &self.catalog.device;
        let device_type = device.device_types[rng.gen_range(0..device.device_types.len())].clone();
        let sensor_status = self.statuses[self.status_weights.sample(rng)];
        let jitter = rng.gen_range(0..=device.battery.max_jitter);
        let level = device.battery.level(elapsed.as_secs_f64(), jitter);
        let battery_level = device.battery.values.nearest(level as f64).round() as i32;

        DeviceMetadata {
            device_type,
            battery_level,
            sensor_status,
        }
    }
}
