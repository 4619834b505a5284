//! # apisec-sync
//!
//! Reconciliation engine: merge the providers' desired set, diff it against
//! the protected inventory, apply the diff item by item and fold every outcome
//! into a run report.
//!
//! Call [`pipeline::run`] for a full run, or [`pipeline::gather`] plus
//! [`reconcile::plan`] to inspect what a run would do.

pub mod desired;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod status;

pub use desired::{collect_desired, FetchOutcome, ProviderOutcome};
pub use error::{ReportError, RunError};
pub use pipeline::{gather, run, RunStage, Snapshot};
pub use reconcile::{apply, plan, reconcile, Category, ItemOutcome, Plan, PlannedAction, SyncOutcome};
pub use status::{ApiBuckets, Buckets, RunReport, RunStatus, STATUS_FILE};
