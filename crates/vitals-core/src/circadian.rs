use std::f64::consts::TAU;

/// One day, the period every vital channel oscillates on.
pub const DAY_SECONDS: f64 = 86_400.0;

/// Sinusoidal day-night offset for wall-clock time `now_s`.
///
/// Phase comes from absolute wall-clock time so the same moment of the day
/// yields the same offset across restarts.
pub fn circadian_offset(now_s: f64, period_s: f64, amplitude: f64) -> f64 {
    let phase = TAU * now_s.rem_euclid(period_s) / period_s;
    amplitude * phase.sin()
}
