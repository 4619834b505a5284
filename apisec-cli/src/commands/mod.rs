pub mod example_config;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use apisec_core::config::{self, DEFAULT_CONFIG_PATH};
use apisec_core::Config;

/// Where the configuration comes from.
#[derive(Args, Debug)]
pub struct ConfigSource {
    /// Path to the configuration file (JSON, or YAML for `.yaml`/`.yml`).
    #[arg(short = 'p', long = "path", default_value = DEFAULT_CONFIG_PATH, conflicts_with = "config")]
    pub path: PathBuf,

    /// Inline JSON configuration, used instead of a file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,
}

impl ConfigSource {
    pub fn load(&self) -> Result<Config> {
        match &self.config {
            Some(json) => config::from_json_str(json).context("invalid inline configuration"),
            None => config::load_at(&self.path)
                .with_context(|| format!("invalid configuration file {}", self.path.display())),
        }
    }
}
