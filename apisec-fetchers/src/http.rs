//! Blocking HTTP helpers shared by the HTTP-based fetchers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::FetchError;

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Perform `request` and decode a JSON body.
///
/// A leading UTF-8 byte order mark is tolerated; some management APIs emit one.
pub(crate) fn get_json<T: DeserializeOwned>(request: ureq::Request) -> Result<T, FetchError> {
    let url = without_query(request.url()).to_string();
    let body = get_text(request)?;
    serde_json::from_str(body.trim_start_matches('\u{feff}')).map_err(|e| FetchError::Decode {
        url,
        message: e.to_string(),
    })
}

/// Errors and logs carry the URL without its query string, which may hold
/// access tokens.
pub(crate) fn get_text(request: ureq::Request) -> Result<String, FetchError> {
    let url = without_query(request.url()).to_string();
    tracing::debug!("GET {url}");
    let response = match request.call() {
        Ok(r) => r,
        Err(ureq::Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(FetchError::Status { url, code, body });
        }
        Err(ureq::Error::Transport(t)) => {
            return Err(FetchError::Transport {
                url,
                message: transport_message(&t),
            });
        }
    };
    response.into_string().map_err(|e| FetchError::Decode {
        url,
        message: e.to_string(),
    })
}

fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// `Transport`'s `Display` leads with the full request URL; keep only the
/// failure itself.
fn transport_message(t: &ureq::Transport) -> String {
    let mut message = t.kind().to_string();
    if let Some(detail) = t.message() {
        message.push_str(": ");
        message.push_str(detail);
    }
    if let Some(source) = std::error::Error::source(t) {
        message.push_str(": ");
        message.push_str(&source.to_string());
    }
    message
}
