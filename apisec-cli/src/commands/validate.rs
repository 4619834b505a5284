//! `apisec validate`: check a configuration without running it.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::ConfigSource;

/// Arguments for `apisec validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}

impl ValidateArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.source.load()?;

        println!("{} configuration is valid", "✓".green().bold());
        println!("  site:        {}", config.site_id);
        println!("  management:  {}", config.management_url);
        println!("  action:      {}", config.specification_violation_action);
        println!("  timeout:     {}s", config.timeout_secs);

        let enabled: Vec<_> = config.enabled_providers().map(|p| p.kind.to_string()).collect();
        if enabled.is_empty() {
            println!("  {}", "no providers enabled; a run would abort".yellow());
        } else {
            println!("  providers:   {}", enabled.join(", "));
        }
        Ok(ExitCode::SUCCESS)
    }
}
