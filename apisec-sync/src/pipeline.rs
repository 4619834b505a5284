//! One reconciliation run from inventory read to finalized report.

use std::fmt;
use std::path::Path;

use chrono::Utc;

use apisec_core::{ExistingInventory, ManagementService, ProviderConfig};
use apisec_fetchers::FetcherRegistry;

use crate::desired::{collect_desired, FetchOutcome};
use crate::error::RunError;
use crate::reconcile::reconcile;
use crate::status::{RunReport, RunStatus};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Init,
    Fetching,
    Reconciling,
    Finalized,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStage::Init => "init",
            RunStage::Fetching => "fetching",
            RunStage::Reconciling => "reconciling",
            RunStage::Finalized => "finalized",
        })
    }
}

fn enter(stage: RunStage) {
    tracing::info!(stage = %stage, "run stage");
}

/// Everything a run needs to know before it may mutate anything.
#[derive(Debug)]
pub struct Snapshot {
    pub existing: ExistingInventory,
    pub fetch: FetchOutcome,
}

/// Read the inventory, then fetch the desired set.
///
/// An unreadable inventory aborts before any provider runs.
pub fn gather(
    providers: &[ProviderConfig],
    registry: &FetcherRegistry,
    service: &dyn ManagementService,
) -> Result<Snapshot, RunError> {
    enter(RunStage::Init);
    let existing = service.list().map_err(|e| {
        tracing::error!(error = %e, "failed to read the existing APIs");
        RunError::Inventory(e)
    })?;
    tracing::info!(count = existing.len(), "read the existing APIs");

    enter(RunStage::Fetching);
    let fetch = collect_desired(providers, registry);
    Ok(Snapshot { existing, fetch })
}

/// Run one full reconciliation.
///
/// When `status_dir` is set the finalized report is written there as
/// `status.json`; a write failure is logged and does not fail the run. When
/// nothing was fetched the report is still finalized and written, and
/// [`RunError::NothingFetched`] is returned without a single remote mutation.
pub fn run(
    providers: &[ProviderConfig],
    registry: &FetcherRegistry,
    service: &dyn ManagementService,
    status_dir: Option<&Path>,
) -> Result<RunReport, RunError> {
    let snapshot = gather(providers, registry, service)?;

    let mut status = RunStatus::new();
    status.absorb_fetch(&snapshot.fetch);

    if snapshot.fetch.desired.is_empty() {
        tracing::error!("no API specifications were fetched, skipping reconciliation");
        let report = finish(status, status_dir);
        return Err(RunError::NothingFetched(Box::new(report)));
    }

    enter(RunStage::Reconciling);
    let outcome = reconcile(&snapshot.existing, &snapshot.fetch.desired, service);
    status.absorb_sync(&outcome);

    Ok(finish(status, status_dir))
}

fn finish(status: RunStatus, status_dir: Option<&Path>) -> RunReport {
    let report = status.finalize(Utc::now());
    enter(RunStage::Finalized);

    match report.to_json() {
        Ok(json) => tracing::info!(has_errors = report.has_errors, "run report: {json}"),
        Err(e) => tracing::error!(error = %e, "failed to encode run report"),
    }
    if let Some(dir) = status_dir {
        match report.persist_at(dir) {
            Ok(path) => tracing::info!(path = %path.display(), "wrote run report"),
            Err(e) => tracing::error!(error = %e, "failed to write run report"),
        }
    }
    report
}
