use crate::channel::ChannelCatalog;
use crate::error::CoreError;
use crate::event::Event;
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A time-triggered transformation layered on top of normal synthesis.
///
/// Overlays run after every channel has been composed and discretized, so
/// whatever they write is the value handed to the sink.
pub trait Overlay: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        event: &mut Event,
        elapsed: Duration,
        catalog: &ChannelCatalog,
        rng: &mut dyn RngCore,
    );

    /// How far the scripted event has progressed, in `[0, 1]`.
    fn progress(&self, _elapsed: Duration) -> f64 {
        0.0
    }
}

/// Parameters of a progressive bradycardia event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BradycardiaSpec {
    pub patient_id: i32,
    pub onset_s: f64,
    pub window_s: f64,
    pub start_bpm: f64,
    pub floor_bpm: f64,
    pub jitter_sigma: f64,
    pub spo2_drop: f64,
}

impl Default for BradycardiaSpec {
    fn default() -> Self {
        Self {
            patient_id: 1,
            onset_s: 30.0,
            window_s: 180.0,
            start_bpm: 65.0,
            floor_bpm: 20.0,
            jitter_sigma: 1.5,
            spo2_drop: 6.0,
        }
    }
}

/// Anomaly descriptions as they appear in run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalySpec {
    Bradycardia(BradycardiaSpec),
}

impl AnomalySpec {
    pub fn patient_id(&self) -> i32 {
        match self {
            AnomalySpec::Bradycardia(spec) => spec.patient_id,
        }
    }

    pub fn build(&self) -> Result<Box<dyn Overlay>, CoreError> {
        match self {
            AnomalySpec::Bradycardia(spec) => Ok(Box::new(Bradycardia::new(spec)?)),
        }
    }
}

/// Heart rate glides linearly from `start_bpm` to `floor_bpm` over `window`
/// after `onset`, and SpO2 sinks by up to `spo2_drop`. There is no recovery:
/// once the floor is reached it is held for the rest of the run.
#[derive(Debug, Clone)]
pub struct Bradycardia {
    onset: Duration,
    window: Duration,
    start_bpm: f64,
    floor_bpm: f64,
    spo2_drop: f64,
    jitter: Normal<f64>,
}

impl Bradycardia {
    pub fn new(spec: &BradycardiaSpec) -> Result<Self, CoreError> {
        let finite = [
            spec.onset_s,
            spec.window_s,
            spec.start_bpm,
            spec.floor_bpm,
            spec.jitter_sigma,
            spec.spo2_drop,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(CoreError::InvalidOverlay("parameters must be finite".into()));
        }
        if spec.onset_s < 0.0 || spec.window_s <= 0.0 {
            return Err(CoreError::InvalidOverlay(format!(
                "onset must be >= 0 and window > 0, got onset={} window={}",
                spec.onset_s, spec.window_s
            )));
        }
        if spec.floor_bpm > spec.start_bpm {
            return Err(CoreError::InvalidOverlay(format!(
                "floor {} above start {}",
                spec.floor_bpm, spec.start_bpm
            )));
        }
        if spec.spo2_drop < 0.0 {
            return Err(CoreError::InvalidOverlay("spo2_drop must be >= 0".into()));
        }
        let jitter = Normal::new(0.0, spec.jitter_sigma)
            .map_err(|e| CoreError::InvalidOverlay(e.to_string()))?;
        let seconds = |v: f64| {
            Duration::try_from_secs_f64(v).map_err(|e| CoreError::InvalidOverlay(e.to_string()))
        };
        Ok(Self {
            onset: seconds(spec.onset_s)?,
            window: seconds(spec.window_s)?,
            start_bpm: spec.start_bpm,
            floor_bpm: spec.floor_bpm,
            spo2_drop: spec.spo2_drop,
            jitter,
        })
    }

    /// `None` while dormant, otherwise progress towards the floor in `[0, 1]`.
    pub fn phase(&self, elapsed: Duration) -> Option<f64> {
        let since_onset = elapsed.checked_sub(self.onset)?;
        Some((since_onset.as_secs_f64() / self.window.as_secs_f64()).min(1.0))
    }

    /// Heart-rate target before jitter, `None` while dormant.
    pub fn target_heart_rate(&self, elapsed: Duration) -> Option<f64> {
        self.phase(elapsed).map(|phase| self.target_at(phase))
    }

    fn target_at(&self, phase: f64) -> f64 {
        self.floor_bpm + (self.start_bpm - self.floor_bpm) * (1.0 - phase)
    }
}

impl Overlay for Bradycardia {
    fn name(&self) -> &'static str {
        "bradycardia"
    }

    fn apply(
        &self,
        event: &mut Event,
        elapsed: Duration,
        catalog: &ChannelCatalog,
        rng: &mut dyn RngCore,
    ) {
        let Some(phase) = self.phase(elapsed) else {
            return;
        };

        let jittered = self.target_at(phase) + self.jitter.sample(rng);
        event.vitals.heart_rate = catalog.heart_rate.values.nearest(jittered).round() as i32;

        let spo2_values = &catalog.spo2.values;
        let spo2 = f64::from(event.vitals.blood_oxygen_spo2) - self.spo2_drop * phase;
        event.vitals.blood_oxygen_spo2 =
            spo2_values.nearest(spo2.max(spo2_values.min())).round() as i32;
    }

    fn progress(&self, elapsed: Duration) -> f64 {
        self.phase(elapsed).unwrap_or(0.0)
    }
}

/// Ordered overlays per patient; patients without an entry are untouched.
#[derive(Debug, Default)]
pub struct Scenario {
    overlays: BTreeMap<i32, Vec<Box<dyn Overlay>>>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patient 1 develops the default progressive bradycardia.
    pub fn reference() -> Result<Self, CoreError> {
        Self::from_specs(&[AnomalySpec::Bradycardia(BradycardiaSpec::default())])
    }

    pub fn from_specs(specs: &[AnomalySpec]) -> Result<Self, CoreError> {
        let mut scenario = Self::new();
        for spec in specs {
            scenario.push(spec.patient_id(), spec.build()?);
        }
        Ok(scenario)
    }

    pub fn push(&mut self, patient_id: i32, overlay: Box<dyn Overlay>) {
        self.overlays.entry(patient_id).or_default().push(overlay);
    }

    pub fn overlays_for(&self, patient_id: i32) -> &[Box<dyn Overlay>] {
        self.overlays
            .get(&patient_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn apply(
        &self,
        event: &mut Event,
        elapsed: Duration,
        catalog: &ChannelCatalog,
        rng: &mut dyn RngCore,
    ) {
        for overlay in self.overlays_for(event.patient_id) {
            overlay.apply(event, elapsed, catalog, rng);
        }
    }

    /// Largest progress among the patient's overlays.
    pub fn progress(&self, patient_id: i32, elapsed: Duration) -> f64 {
        self.overlays_for(patient_id)
            .iter()
            .map(|o| o.progress(elapsed))
            .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
