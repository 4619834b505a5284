//! Specifications stored as files in a local directory.
//!
//! Every regular file directly inside `filesystem_path` is one document;
//! symlinks are followed, so mounted config maps work. Each file is parsed as
//! JSON first and as YAML second; the first format that parses wins. Files
//! that cannot be read, are not UTF-8, or match neither format are logged and
//! skipped.

use std::fs;
use std::path::Path;

use serde_json::Value;

use apisec_core::{collect_specs, ApiSpec, DesiredSet, ProviderKind, Settings};

use crate::error::{io_err, FetchError};
use crate::settings::required;
use crate::Fetcher;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemFetcher;

impl Fetcher for FileSystemFetcher {
    fn fetch(&self, settings: &Settings) -> Result<DesiredSet, FetchError> {
        let dir = Path::new(required(settings, "filesystem_path")?);
        tracing::debug!(path = %dir.display(), "fetching API specs from local directory");
        if !dir.exists() {
            return Err(FetchError::NotFound { path: dir.to_path_buf() });
        }

        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| io_err(dir, e))?
            .filter_map(|e| e.ok())
            .filter(|e| fs::metadata(e.path()).map(|m| m.is_file()).unwrap_or(false))
            .collect();
        entries.sort_by_key(|e| e.file_name());

        let mut specs = Vec::new();
        for entry in entries {
            let path = entry.path();
            let content = match read_text(&path) {
                Ok(content) => content,
                Err(reason) => {
                    tracing::error!(file = %path.display(), %reason, "skipping unreadable file");
                    continue;
                }
            };
            match parse_document(&content) {
                Some(document) => {
                    tracing::debug!(file = %path.display(), "parsed API spec");
                    specs.push(ApiSpec::new(document));
                }
                None => {
                    tracing::error!(file = %path.display(), "failed to parse file as JSON and as YAML");
                }
            }
        }

        let fetched = collect_specs(ProviderKind::FileSystem.type_name(), specs);
        tracing::info!(count = fetched.len(), "fetched API specs from the filesystem");
        Ok(fetched)
    }
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|_| "not valid UTF-8".to_string())
}

/// JSON first, YAML second.
pub fn parse_document(content: &str) -> Option<Value> {
    if let Ok(doc) = serde_json::from_str::<Value>(content) {
        return Some(doc);
    }
    serde_yaml::from_str::<Value>(content).ok()
}
