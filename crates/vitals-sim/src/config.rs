use crate::logging::LogFormat;
use clap::Parser;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use vitals_core::overlay::AnomalySpec;
use vitals_core::CoreError;
use vitals_sink::{SinkError, SinkSettings};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_INTERVAL_S: f64 = 0.5;
pub const DEFAULT_PATIENTS: std::ops::RangeInclusive<i32> = 1..=10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
    #[error("duration must be a finite number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("at least one patient must be configured")]
    NoPatients,
    #[error("patient {0} is listed more than once")]
    DuplicatePatient(i32),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Command-line flags. Anything given here wins over the config file.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "health-simulator",
    about = "Health data simulator (circadian sine + bounded random-walk drift)"
)]
pub struct Cli {
    /// Seconds between ticks
    #[arg(long)]
    pub interval: Option<f64>,

    /// Run duration in seconds (0 = run until interrupted)
    #[arg(long)]
    pub duration: Option<f64>,

    /// Path to the JSON config file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Write to stdout even if a Kafka section is configured
    #[arg(long)]
    pub stdout: bool,

    /// Seed for the random generator, for reproducible streams
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write Prometheus metrics here on exit
    #[arg(long, value_name = "PATH")]
    pub metrics_out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Contents of the JSON config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub interval: Option<f64>,
    pub duration: Option<f64>,
    pub topic: Option<String>,
    pub kafka: Option<Map<String, Value>>,
    pub patients: Option<Vec<i32>>,
    pub seed: Option<u64>,
    pub anomalies: Option<Vec<AnomalySpec>>,
}

impl FileConfig {
    /// Read `path`. A missing file is an empty config; unreadable or
    /// malformed files are errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub interval: Duration,
    /// `None` runs until interrupted.
    pub duration: Option<Duration>,
    pub patients: Vec<i32>,
    pub seed: Option<u64>,
    /// `None` means the reference scenario.
    pub anomalies: Option<Vec<AnomalySpec>>,
    pub sink: SinkSettings,
    pub metrics_out: Option<PathBuf>,
}

impl RunConfig {
    /// Layer CLI flags over the file over built-in defaults.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let interval_s = cli.interval.or(file.interval).unwrap_or(DEFAULT_INTERVAL_S);
        if !interval_s.is_finite() || interval_s <= 0.0 {
            return Err(ConfigError::InvalidInterval(interval_s));
        }
        let interval = Duration::try_from_secs_f64(interval_s)
            .map_err(|_| ConfigError::InvalidInterval(interval_s))?;

        let duration_s = cli.duration.or(file.duration).unwrap_or(0.0);
        if !duration_s.is_finite() {
            return Err(ConfigError::InvalidDuration(duration_s));
        }
        let duration = if duration_s > 0.0 {
            Some(
                Duration::try_from_secs_f64(duration_s)
                    .map_err(|_| ConfigError::InvalidDuration(duration_s))?,
            )
        } else {
            None
        };

        let patients = file
            .patients
            .unwrap_or_else(|| DEFAULT_PATIENTS.collect());
        if patients.is_empty() {
            return Err(ConfigError::NoPatients);
        }
        let mut seen = BTreeSet::new();
        for id in &patients {
            if !seen.insert(*id) {
                return Err(ConfigError::DuplicatePatient(*id));
            }
        }

        let sink = SinkSettings::resolve(file.kafka.as_ref(), file.topic.as_deref(), cli.stdout)?;

        Ok(Self {
            interval,
            duration,
            patients,
            seed: cli.seed.or(file.seed),
            anomalies: file.anomalies,
            sink,
            metrics_out: cli.metrics_out.clone(),
        })
    }
}
