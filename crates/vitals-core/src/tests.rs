use crate::channel::{Channel, ChannelCatalog};
use crate::circadian::{circadian_offset, DAY_SECONDS};
use crate::drift::{DriftGenerator, DriftParams};
use crate::error::CoreError;
use crate::event::{short_id, EVENT_ID_LEN};
use crate::overlay::{AnomalySpec, Bradycardia, BradycardiaSpec, Scenario};
use crate::synth::Synthesizer;
use crate::value_set::{discretize, ValueSet};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

// Fixed wall-clock instant so circadian offsets are stable across runs.
const NOW_S: f64 = 1_767_225_600.0;

fn reference_synth() -> Synthesizer {
    Synthesizer::new(
        ChannelCatalog::reference().unwrap(),
        Scenario::reference().unwrap(),
    )
    .unwrap()
}

#[test]
fn discretize_picks_nearest_and_first_on_tie() {
    assert_eq!(discretize(83.4, &[80.0, 85.0, 90.0]), Some(85.0));
    assert_eq!(discretize(82.5, &[80.0, 85.0]), Some(80.0));
    assert_eq!(discretize(-1e9, &[80.0, 85.0]), Some(80.0));
    assert_eq!(discretize(1e9, &[80.0, 85.0]), Some(85.0));
    assert_eq!(discretize(1.0, &[]), None);
}

#[test]
fn value_set_rejects_bad_input() {
    assert_eq!(ValueSet::new(vec![]), Err(CoreError::EmptyValueSet));
    assert!(matches!(
        ValueSet::new(vec![1.0, 1.0]),
        Err(CoreError::UnorderedValueSet { .. })
    ));
    assert!(matches!(
        ValueSet::new(vec![2.0, 1.0]),
        Err(CoreError::UnorderedValueSet { .. })
    ));
    assert_eq!(
        ValueSet::new(vec![1.0, f64::NAN]),
        Err(CoreError::NonFiniteValue)
    );
    let parsed: Result<ValueSet, _> = serde_json::from_str("[3, 2, 1]");
    assert!(parsed.is_err());
}

#[test]
fn reference_catalog_value_sets() {
    let catalog = ChannelCatalog::reference().unwrap();
    let hr = catalog.heart_rate.values.as_slice();
    assert_eq!(hr.len(), 27);
    assert_eq!(hr.first(), Some(&20.0));
    assert_eq!(hr.last(), Some(&150.0));
    assert_eq!(catalog.spo2.values.min(), 82.0);
    assert_eq!(catalog.spo2.values.max(), 100.0);
    assert_eq!(catalog.temperature.values.as_slice().len(), 11);
    assert_eq!(catalog.device.battery.values.as_slice().len(), 20);
    assert!((catalog.diastolic.circadian_amplitude - 4.8).abs() < 1e-12);
}

#[test]
fn drift_stays_clamped_under_extreme_perturbations() {
    let params = DriftParams::symmetric(1.5, 6.0);
    let mut walk = DriftGenerator::new(params).unwrap();
    for p in [f64::MAX, f64::INFINITY, 1e300, 3.0] {
        let v = walk.step_by(p);
        assert!((-6.0..=6.0).contains(&v), "{v} escaped the clamp");
    }
    assert_eq!(walk.value(), 6.0);
    for p in [f64::MIN, f64::NEG_INFINITY, -1e300, -3.0] {
        let v = walk.step_by(p);
        assert!((-6.0..=6.0).contains(&v), "{v} escaped the clamp");
    }
    assert_eq!(walk.value(), -6.0);
    assert_eq!(walk.step_by(f64::NAN), -6.0);
}

#[test]
fn drift_params_must_contain_origin() {
    let bad = DriftParams {
        volatility: 1.0,
        clamp_min: 1.0,
        clamp_max: 2.0,
    };
    assert!(matches!(DriftGenerator::new(bad), Err(CoreError::InvalidDrift(_))));
    assert!(DriftGenerator::new(DriftParams::symmetric(-1.0, 2.0)).is_err());
}

#[test]
fn short_id_is_lowercase_alphanumeric() {
    let mut rng = StdRng::seed_from_u64(11);
    let id = short_id(&mut rng);
    assert_eq!(id.len(), EVENT_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_ne!(id, short_id(&mut rng));
}

#[test]
fn events_use_reported_values_only() {
    let synth = reference_synth();
    let catalog = synth.catalog();
    let mut rng = StdRng::seed_from_u64(3);
    let mut patients: Vec<_> = (1..=10).map(|id| synth.patient(id).unwrap()).collect();

    for tick in 0..400u64 {
        let elapsed = Duration::from_secs(tick * 3);
        for patient in patients.iter_mut() {
            let event = synth.synthesize(patient, NOW_S + tick as f64, elapsed, &mut rng);
            let v = &event.vitals;
            assert!(catalog.heart_rate.values.contains(f64::from(v.heart_rate)));
            assert!(catalog.spo2.values.contains(f64::from(v.blood_oxygen_spo2)));
            assert!(catalog.systolic.values.contains(f64::from(v.blood_pressure.systolic)));
            assert!(catalog.diastolic.values.contains(f64::from(v.blood_pressure.diastolic)));
            assert!(catalog.temperature.values.contains(f64::from(v.body_temperature_c)));
            assert!(catalog
                .device
                .battery
                .values
                .contains(f64::from(event.device_metadata.battery_level)));
            assert!(catalog
                .device
                .device_types
                .contains(&event.device_metadata.device_type));
            assert_eq!(event.patient_id, patient.patient_id());
        }
    }
}

#[test]
fn battery_depletes_with_run_time() {
    let catalog = ChannelCatalog::reference().unwrap();
    let battery = &catalog.device.battery;
    assert_eq!(battery.level(0.0, 0), 100);
    assert_eq!(battery.level(299.0, 2), 98);
    assert_eq!(battery.level(3000.0, 0), 90);
    assert_eq!(battery.level(1e9, 0), 5);
    assert_eq!(battery.values.nearest(battery.level(0.0, 2) as f64), 100.0);
}

#[test]
fn patients_drift_independently() {
    let synth = reference_synth();
    let mut rng = StdRng::seed_from_u64(5);
    let mut a = synth.patient(2).unwrap();
    let mut b = synth.patient(3).unwrap();
    let mut trace_a = Vec::new();
    let mut trace_b = Vec::new();
    for _ in 0..20 {
        synth.synthesize(&mut a, NOW_S, Duration::ZERO, &mut rng);
        synth.synthesize(&mut b, NOW_S, Duration::ZERO, &mut rng);
        trace_a.push(a.drift(Channel::HeartRate).unwrap().value());
        trace_b.push(b.drift(Channel::HeartRate).unwrap().value());
    }
    assert_ne!(trace_a, trace_b);
}

#[test]
fn overlay_is_dormant_before_onset() {
    let synth = reference_synth();
    let template = synth.patient(1).unwrap();
    for secs in [0.0, 10.0, 29.999] {
        let elapsed = Duration::from_secs_f64(secs);
        let mut plain_state = template.clone();
        let mut overlay_state = template.clone();
        let plain = synth.compose(&mut plain_state, NOW_S, elapsed, &mut StdRng::seed_from_u64(9));
        let layered =
            synth.synthesize(&mut overlay_state, NOW_S, elapsed, &mut StdRng::seed_from_u64(9));
        assert_eq!(plain, layered);
    }
}

#[test]
fn other_patients_are_never_modified() {
    let synth = reference_synth();
    for patient_id in [2, 3, 10] {
        let template = synth.patient(patient_id).unwrap();
        for secs in [0u64, 31, 120, 210, 3600] {
            let elapsed = Duration::from_secs(secs);
            let mut plain_state = template.clone();
            let mut overlay_state = template.clone();
            let plain =
                synth.compose(&mut plain_state, NOW_S, elapsed, &mut StdRng::seed_from_u64(1));
            let layered =
                synth.synthesize(&mut overlay_state, NOW_S, elapsed, &mut StdRng::seed_from_u64(1));
            assert_eq!(plain, layered);
        }
    }
}

#[test]
fn bradycardia_target_glides_to_floor() {
    let brady = Bradycardia::new(&BradycardiaSpec::default()).unwrap();
    assert_eq!(brady.target_heart_rate(Duration::from_secs(29)), None);
    assert_eq!(brady.target_heart_rate(Duration::from_secs(30)), Some(65.0));

    let mut previous = f64::INFINITY;
    for ms in (30_000u64..=400_000).step_by(250) {
        let target = brady
            .target_heart_rate(Duration::from_millis(ms))
            .unwrap();
        assert!(target <= previous);
        assert!(target >= 20.0);
        previous = target;
    }
    assert_eq!(brady.target_heart_rate(Duration::from_secs(210)), Some(20.0));
    assert_eq!(brady.phase(Duration::from_secs(120)), Some(0.5));
}

#[test]
fn bradycardia_reaches_critical_state() {
    let synth = reference_synth();
    let mut patient = synth.patient(1).unwrap();
    let mut rng = StdRng::seed_from_u64(21);
    for secs in 300..360u64 {
        let event = synth.synthesize(&mut patient, NOW_S, Duration::from_secs(secs), &mut rng);
        assert!(event.vitals.heart_rate <= 30, "hr {}", event.vitals.heart_rate);
        assert!(event.vitals.blood_oxygen_spo2 >= 82);
        assert!(event.vitals.blood_oxygen_spo2 <= 94);
    }
    assert_eq!(synth.scenario().progress(1, Duration::from_secs(300)), 1.0);
    assert_eq!(synth.scenario().progress(2, Duration::from_secs(300)), 0.0);
}

#[test]
fn anomaly_specs_parse_from_json() {
    let specs: Vec<AnomalySpec> = serde_json::from_str(
        r#"[{"kind": "bradycardia", "patient_id": 4, "onset_s": 5.0}]"#,
    )
    .unwrap();
    assert_eq!(specs[0].patient_id(), 4);
    let AnomalySpec::Bradycardia(spec) = &specs[0];
    assert_eq!(spec.onset_s, 5.0);
    assert_eq!(spec.window_s, 180.0);

    let scenario = Scenario::from_specs(&specs).unwrap();
    assert_eq!(scenario.overlays_for(4).len(), 1);
    assert!(scenario.overlays_for(1).is_empty());
}

#[test]
fn bradycardia_rejects_inverted_range() {
    let spec = BradycardiaSpec {
        floor_bpm: 90.0,
        ..BradycardiaSpec::default()
    };
    assert!(matches!(
        Bradycardia::new(&spec),
        Err(CoreError::InvalidOverlay(_))
    ));
}

fn sorted_set() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::btree_set(-1000i32..1000, 1..40)
        .prop_map(|set| set.into_iter().map(|v| f64::from(v) * 0.5).collect())
}

proptest! {
    #[test]
    fn discretize_returns_closest_member(target in -2000.0f64..2000.0, options in sorted_set()) {
        let picked = discretize(target, &options).unwrap();
        prop_assert!(options.contains(&picked));
        let dist = (picked - target).abs();
        let first = options.iter().position(|v| *v == picked).unwrap();
        for (i, other) in options.iter().enumerate() {
            let other_dist = (other - target).abs();
            prop_assert!(other_dist >= dist);
            if i < first {
                prop_assert!(other_dist > dist);
            }
        }
    }

    #[test]
    fn drift_never_leaves_clamp(seed in any::<u64>(), volatility in 0.0f64..50.0, bound in 0.0f64..10.0) {
        let mut walk = DriftGenerator::new(DriftParams::symmetric(volatility, bound)).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..200 {
            let v = walk.step(&mut rng);
            prop_assert!(v >= -bound && v <= bound);
        }
    }

    #[test]
    fn circadian_is_periodic_and_bounded(t in -1.0e6f64..1.0e7, amp in 0.0f64..20.0) {
        let a = circadian_offset(t, DAY_SECONDS, amp);
        let b = circadian_offset(t + DAY_SECONDS, DAY_SECONDS, amp);
        prop_assert!((a - b).abs() <= 1e-6 * amp.max(1.0));
        prop_assert!(a.abs() <= amp + 1e-12);
    }
}
