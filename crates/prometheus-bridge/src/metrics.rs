use prometheus::{
    register_gauge_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, GaugeVec, IntCounter, IntCounterVec, Registry,
    TextEncoder,
};
use vitals_core::Event;

/// Run metrics, kept on a private registry so several simulators (or tests)
/// can coexist in one process.
pub struct SimMetrics {
    registry: Registry,
    pub ticks_total: IntCounter,
    pub events_published_total: IntCounterVec,
    pub publish_errors_total: IntCounter,
    pub heart_rate_bpm: GaugeVec,
    pub spo2_percent: GaugeVec,
    pub anomaly_phase: GaugeVec,
}

impl SimMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let ticks_total = register_int_counter_with_registry!(
            "vitals_ticks_total",
            "Completed run-loop ticks",
            registry
        )?;

        let events_published_total = register_int_counter_vec_with_registry!(
            "vitals_events_published_total",
            "Events handed to the sink per patient",
            &["patient_id"],
            registry
        )?;

        let publish_errors_total = register_int_counter_with_registry!(
            "vitals_publish_errors_total",
            "Events the sink refused",
            registry
        )?;

        let heart_rate_bpm = register_gauge_vec_with_registry!(
            "vitals_heart_rate_bpm",
            "Last emitted heart rate per patient",
            &["patient_id"],
            registry
        )?;

        let spo2_percent = register_gauge_vec_with_registry!(
            "vitals_spo2_percent",
            "Last emitted SpO2 per patient",
            &["patient_id"],
            registry
        )?;

        let anomaly_phase = register_gauge_vec_with_registry!(
            "vitals_anomaly_phase",
            "Progress of scripted anomalies per patient (0 dormant, 1 fully developed)",
            &["patient_id"],
            registry
        )?;

        Ok(Self {
            registry,
            ticks_total,
            events_published_total,
            publish_errors_total,
            heart_rate_bpm,
            spo2_percent,
            anomaly_phase,
        })
    }

    pub fn observe_event(&self, event: &Event, anomaly_progress: f64) {
        let patient = event.patient_id.to_string();
        let labels = [patient.as_str()];
        self.events_published_total.with_label_values(&labels).inc();
        self.heart_rate_bpm
            .with_label_values(&labels)
            .set(f64::from(event.vitals.heart_rate));
        self.spo2_percent
            .with_label_values(&labels)
            .set(f64::from(event.vitals.blood_oxygen_spo2));
        self.anomaly_phase
            .with_label_values(&labels)
            .set(anomaly_progress);
    }

    pub fn observe_publish_error(&self) {
        self.publish_errors_total.inc();
    }

    pub fn observe_tick(&self) {
        self.ticks_total.inc();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current values in the Prometheus text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
