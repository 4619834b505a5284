//! `apisec example-config`: print a starting configuration.

use std::process::ExitCode;

use anyhow::Result;

pub const EXAMPLE_CONFIG: &str = include_str!("../../config.example.json");

pub fn run() -> Result<ExitCode> {
    print!("{EXAMPLE_CONFIG}");
    Ok(ExitCode::SUCCESS)
}
