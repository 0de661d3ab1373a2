use anyhow::Context;
use clap::Parser;
use prometheus_bridge::SimMetrics;
use std::process::ExitCode;
use tracing::{error, info};
use vitals_core::{ChannelCatalog, Scenario, Synthesizer};
use vitals_sim::logging::init_logging;
use vitals_sim::{run, Cli, FileConfig, RunConfig, RunOptions, ShutdownSignals, Simulator};
use vitals_sink::build_sink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match simulate(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn simulate(cli: Cli) -> anyhow::Result<()> {
    let signals = ShutdownSignals::install().context("could not install signal handlers")?;
    let file = FileConfig::load(&cli.config)?;
    let config = RunConfig::resolve(&cli, file)?;

    let catalog = ChannelCatalog::reference()?;
    let scenario = match &config.anomalies {
        Some(specs) => Scenario::from_specs(specs)?,
        None => Scenario::reference()?,
    };
    let synth = Synthesizer::new(catalog, scenario)?;
    let mut sim = Simulator::new(synth, &config.patients, config.seed)?;

    let mut sink = build_sink(&config.sink).context("could not construct sink")?;
    let metrics = SimMetrics::new().context("could not register metrics")?;

    let options = RunOptions {
        interval: config.interval,
        duration: config.duration,
    };
    run(&mut sim, &mut sink, options, Some(&metrics), signals.recv()).await;

    if let Some(path) = &config.metrics_out {
        std::fs::write(path, metrics.render()?)
            .with_context(|| format!("could not write metrics to {}", path.display()))?;
        info!(path = %path.display(), "metrics written");
    }
    Ok(())
}
