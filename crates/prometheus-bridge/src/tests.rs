use crate::SimMetrics;
use vitals_core::{BloodPressure, DeviceMetadata, Event, SensorStatus, Vitals};

fn event(patient_id: i32, heart_rate: i32) -> Event {
    Event {
        event_id: "000000000000".into(),
        patient_id,
        device_metadata: DeviceMetadata {
            device_type: "wearable_v2".into(),
            battery_level: 100,
            sensor_status: SensorStatus::Stable,
        },
        vitals: Vitals {
            heart_rate,
            blood_oxygen_spo2: 94,
            blood_pressure: BloodPressure {
                systolic: 115,
                diastolic: 75,
            },
            body_temperature_c: 37.0,
        },
    }
}

#[test]
fn events_are_counted_per_patient() {
    let metrics = SimMetrics::new().unwrap();
    metrics.observe_event(&event(1, 40), 0.5);
    metrics.observe_event(&event(1, 35), 0.6);
    metrics.observe_event(&event(2, 80), 0.0);
    metrics.observe_publish_error();
    metrics.observe_tick();

    assert_eq!(
        metrics
            .events_published_total
            .with_label_values(&["1"])
            .get(),
        2
    );
    assert_eq!(metrics.heart_rate_bpm.with_label_values(&["1"]).get(), 35.0);
    assert_eq!(metrics.anomaly_phase.with_label_values(&["1"]).get(), 0.6);
    assert_eq!(metrics.publish_errors_total.get(), 1);
    assert_eq!(metrics.ticks_total.get(), 1);
}

#[test]
fn render_uses_text_format() {
    let metrics = SimMetrics::new().unwrap();
    metrics.observe_event(&event(7, 60), 0.0);
    let text = metrics.render().unwrap();
    assert!(text.contains("vitals_events_published_total{patient_id=\"7\"} 1"));
    assert!(text.contains("# TYPE vitals_heart_rate_bpm gauge"));
}

#[test]
fn independent_registries_do_not_collide() {
    let a = SimMetrics::new().unwrap();
    let b = SimMetrics::new().unwrap();
    a.observe_tick();
    assert_eq!(b.ticks_total.get(), 0);
    assert!(!a.registry().gather().is_empty());
}
