//! `apisec run`: one reconciliation run.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use apisec_client::HttpManagementClient;
use apisec_core::Config;
use apisec_fetchers::FetcherRegistry;
use apisec_sync::{gather, pipeline, plan, Category, Plan, PlannedAction, Snapshot};

use super::ConfigSource;
use crate::logging;

/// Arguments for `apisec run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Read the inventory and fetch the providers, then print the plan
    /// without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.source.load()?;
        logging::init(&config.logging)?;
        tracing::info!(site = %config.site_id, dry_run = self.dry_run, "starting API security run");

        let client = HttpManagementClient::from_config(&config);
        let registry = FetcherRegistry::builtin(config.timeout());

        if self.dry_run {
            return dry_run(&config, &registry, &client);
        }

        let report = pipeline::run(
            &config.fetchers,
            &registry,
            &client,
            config.logging.status_path.as_deref(),
        )
        .context("run aborted")?;

        if report.has_errors {
            tracing::warn!("run finished with errors");
        } else {
            tracing::info!("run finished successfully");
        }
        Ok(ExitCode::from(report.exit_code()))
    }
}

fn dry_run(config: &Config, registry: &FetcherRegistry, client: &HttpManagementClient) -> Result<ExitCode> {
    let Snapshot { existing, fetch } =
        gather(&config.fetchers, registry, client).context("dry run aborted")?;

    for provider in &fetch.providers {
        match &provider.error {
            None => println!("{} {} ({} APIs)", "✓".green().bold(), provider.kind, provider.fetched),
            Some(error) => println!("{} {}: {error}", "✗".red().bold(), provider.kind),
        }
    }

    if fetch.desired.is_empty() {
        bail!("no API specifications were fetched; a real run would abort without changes");
    }

    let plan = plan(&existing, &fetch.desired);
    print_plan(&plan);

    Ok(if fetch.failed_providers() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "api")]
    api: String,
    #[tabled(rename = "remote id")]
    remote_id: String,
}

fn print_plan(plan: &Plan<'_>) {
    println!(
        "[dry-run] {} to add | {} to update | {} to delete",
        plan.count(Category::Added),
        plan.count(Category::Updated),
        plan.count(Category::Deleted),
    );
    if plan.is_empty() {
        println!("[dry-run] nothing to do");
        return;
    }

    let rows: Vec<PlanRow> = plan
        .actions
        .iter()
        .map(|action| PlanRow {
            action: action_label(action),
            api: action.identity().to_string(),
            remote_id: action
                .remote_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn action_label(action: &PlannedAction<'_>) -> String {
    match action {
        PlannedAction::Create { .. } => "ADD".green().bold().to_string(),
        PlannedAction::Update { .. } => "UPDATE".yellow().bold().to_string(),
        PlannedAction::Delete { .. } => "DELETE".red().bold().to_string(),
    }
}
