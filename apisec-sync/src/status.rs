//! Run status accumulation and the frozen run report.
//!
//! [`RunStatus`] is append-only while the run is in progress. Finalizing it
//! consumes it and yields a [`RunReport`], the only source of the exit code.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::desired::FetchOutcome;
use crate::error::{io_err, ReportError};
use crate::reconcile::{Category, SyncOutcome};

/// File name of the persisted report inside the status directory.
pub const STATUS_FILE: &str = "status.json";

/// Successful and failed entries of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl Buckets {
    fn record(&mut self, entry: String, ok: bool) {
        if ok {
            self.success.push(entry);
        } else {
            self.error.push(entry);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBuckets {
    pub added: Buckets,
    pub updated: Buckets,
    pub deleted: Buckets,
}

impl ApiBuckets {
    fn bucket_mut(&mut self, category: Category) -> &mut Buckets {
        match category {
            Category::Added => &mut self.added,
            Category::Updated => &mut self.updated,
            Category::Deleted => &mut self.deleted,
        }
    }

    pub fn bucket(&self, category: Category) -> &Buckets {
        match category {
            Category::Added => &self.added,
            Category::Updated => &self.updated,
            Category::Deleted => &self.deleted,
        }
    }
}

/// Outcomes of the run so far.
#[derive(Debug, Default)]
pub struct RunStatus {
    apis: ApiBuckets,
    fetchers: Buckets,
}

impl RunStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_api(&mut self, category: Category, identity: impl Into<String>, ok: bool) {
        self.apis.bucket_mut(category).record(identity.into(), ok);
    }

    pub fn record_fetcher(&mut self, name: impl Into<String>, ok: bool) {
        self.fetchers.record(name.into(), ok);
    }

    /// Fold one entry per enabled provider into the fetcher buckets.
    pub fn absorb_fetch(&mut self, outcome: &FetchOutcome) {
        for provider in &outcome.providers {
            self.record_fetcher(provider.kind.type_name(), provider.is_success());
        }
    }

    /// Fold one entry per applied action into the API buckets.
    pub fn absorb_sync(&mut self, outcome: &SyncOutcome) {
        for item in &outcome.items {
            self.record_api(item.category, item.identity.as_str(), item.error.is_none());
        }
    }

    pub fn error_count(&self) -> usize {
        self.fetchers.error.len()
            + [Category::Added, Category::Updated, Category::Deleted]
                .iter()
                .map(|c| self.apis.bucket(*c).error.len())
                .sum::<usize>()
    }

    /// Freeze the status into a report stamped with `at`.
    pub fn finalize(self, at: DateTime<Utc>) -> RunReport {
        let has_errors = self.error_count() > 0;
        RunReport {
            time: at.timestamp_millis(),
            has_errors,
            apis: self.apis,
            fetchers: self.fetchers,
        }
    }
}

/// Final, immutable outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub has_errors: bool,
    pub apis: ApiBuckets,
    pub fetchers: Buckets,
}

impl RunReport {
    /// 0 when the run recorded no errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_errors)
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Atomically write the report to `<dir>/status.json`, creating `dir`.
    pub fn persist_at(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let path = dir.join(STATUS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(path)
    }

    /// Read a previously persisted report.
    pub fn load_at(dir: &Path) -> Result<Self, ReportError> {
        let path = dir.join(STATUS_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
