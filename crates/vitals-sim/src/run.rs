use chrono::Utc;
use prometheus_bridge::SimMetrics;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vitals_core::{CoreError, PatientState, Synthesizer};
use vitals_sink::Sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub interval: Duration,
    /// `None` runs until the shutdown future resolves.
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub published: u64,
    pub publish_errors: u64,
}

/// Synthesizer, per-patient drift state and the run's random generator.
pub struct Simulator {
    synth: Synthesizer,
    patients: Vec<PatientState>,
    rng: StdRng,
}

impl Simulator {
    /// One independent drift state per patient; `seed` makes the stream
    /// reproducible up to wall-clock circadian phase.
    pub fn new(
        synth: Synthesizer,
        patient_ids: &[i32],
        seed: Option<u64>,
    ) -> Result<Self, CoreError> {
        let patients = patient_ids
            .iter()
            .map(|id| synth.patient(*id))
            .collect::<Result<Vec<_>, _>>()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            synth,
            patients,
            rng,
        })
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Synthesize and publish one event per patient, in patient order.
    pub fn tick<S: Sink + ?Sized>(
        &mut self,
        sink: &mut S,
        start: Instant,
        metrics: Option<&SimMetrics>,
        summary: &mut RunSummary,
    ) {
        for patient in self.patients.iter_mut() {
            let elapsed = start.elapsed();
            let event = self
                .synth
                .synthesize(patient, wall_clock_seconds(), elapsed, &mut self.rng);

            match sink.publish(&event) {
                Ok(()) => {
                    summary.published += 1;
                    if let Some(metrics) = metrics {
                        let progress = self.synth.scenario().progress(event.patient_id, elapsed);
                        metrics.observe_event(&event, progress);
                    }
                }
                Err(e) => {
                    // Retry policy belongs to the sink; the tick moves on.
                    summary.publish_errors += 1;
                    warn!(patient_id = event.patient_id, error = %e, "publish failed");
                    if let Some(metrics) = metrics {
                        metrics.observe_publish_error();
                    }
                }
            }
        }
        summary.ticks += 1;
        if let Some(metrics) = metrics {
            metrics.observe_tick();
        }
    }
}

fn wall_clock_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Tick until `options.duration` elapses or `shutdown` resolves, then flush
/// the sink exactly once.
///
/// The interval is a floor sleep after each tick, not a fixed-rate schedule.
pub async fn run<S, F>(
    sim: &mut Simulator,
    sink: &mut S,
    options: RunOptions,
    metrics: Option<&SimMetrics>,
    shutdown: F,
) -> RunSummary
where
    S: Sink + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let start = Instant::now();
    let mut summary = RunSummary::default();

    info!(
        sink = %sink.describe(),
        patients = sim.patient_count(),
        interval_s = options.interval.as_secs_f64(),
        duration_s = options.duration.map(|d| d.as_secs_f64()),
        "simulation started"
    );

    loop {
        if let Some(limit) = options.duration {
            if start.elapsed() >= limit {
                info!("configured duration reached");
                break;
            }
        }

        sim.tick(sink, start, metrics, &mut summary);
        debug!(tick = summary.ticks, "tick complete");

        tokio::select! {
            _ = tokio::time::sleep(options.interval) => {}
            _ = &mut shutdown => {
                info!("interrupt received, stopping");
                break;
            }
        }
    }

    if let Err(e) = sink.flush() {
        error!(error = %e, "final sink flush failed");
    }
    info!(
        ticks = summary.ticks,
        published = summary.published,
        publish_errors = summary.publish_errors,
        "simulation finished"
    );
    summary
}
