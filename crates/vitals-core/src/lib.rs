pub mod channel;
pub mod circadian;
pub mod drift;
pub mod error;
pub mod event;
pub mod overlay;
pub mod synth;
pub mod value_set;
#[cfg(test)]
mod tests;

pub use channel::{BatteryModel, Channel, ChannelCatalog, ChannelSpec, DeviceProfile};
pub use circadian::{circadian_offset, DAY_SECONDS};
pub use drift::{DriftGenerator, DriftParams};
pub use error::CoreError;
pub use event::{short_id, BloodPressure, DeviceMetadata, Event, SensorStatus, Vitals};
pub use overlay::{AnomalySpec, Bradycardia, BradycardiaSpec, Overlay, Scenario};
pub use synth::{PatientState, Synthesizer};
pub use value_set::{discretize, ValueSet};
