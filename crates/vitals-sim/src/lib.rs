pub mod config;
pub mod logging;
pub mod run;
pub mod shutdown;

pub use config::{Cli, ConfigError, FileConfig, RunConfig};
pub use run::{run, RunOptions, RunSummary, Simulator};
pub use shutdown::ShutdownSignals;
