use apisec_core::Settings;

use crate::error::FetchError;

/// A string setting that must be present and non-empty.
pub(crate) fn required<'a>(settings: &'a Settings, key: &'static str) -> Result<&'a str, FetchError> {
    optional(settings, key).ok_or(FetchError::MissingSetting { setting: key })
}

/// A string setting that may be absent; empty strings count as absent.
pub(crate) fn optional<'a>(settings: &'a Settings, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
