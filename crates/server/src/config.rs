//! Command line and config file handling.
//!
//! The simulation knobs live in an optional TOML file; a handful of them can
//! also be overridden on the command line, which wins over the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use matchday_engine::SimulationConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "matchday-server", about = "Concurrent football fixture simulator")]
pub struct Args {
    /// SQLite database holding fixtures, events and teams.
    #[arg(long, default_value = "matchday.db")]
    pub db: PathBuf,

    /// TOML file with simulation settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port for the live dashboard.
    #[arg(long, default_value_t = 8000)]
    pub dashboard_port: u16,

    /// Run without the dashboard.
    #[arg(long)]
    pub no_dashboard: bool,

    /// Fixtures per cycle (overrides the config file).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Seconds to wait before every discovery pass (overrides the config file).
    #[arg(long)]
    pub startup_delay_secs: Option<u64>,

    /// Seed for reproducible runs (overrides the config file).
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Resolve the effective simulation settings: defaults, then the config
    /// file, then command line overrides.
    pub fn simulation_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => load_file(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(delay) = self.startup_delay_secs {
            config.startup_delay_secs = delay;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn load_file(path: &Path) -> anyhow::Result<SimulationConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn parse(text: &str) -> anyhow::Result<SimulationConfig> {
    Ok(toml::from_str(text)?)
}
