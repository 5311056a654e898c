//! Shared helpers for the agent API client.

use std::time::Duration;

use af_domain::error::Error;

/// Longest response body echoed into an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Convert a [`reqwest::Error`] into the domain [`Error`] chosen by the
/// calling operation.
///
/// Timeouts name the bound that was hit so they read differently from
/// connection failures.
pub(crate) fn from_reqwest(e: reqwest::Error, limit: Duration, wrap: fn(String) -> Error) -> Error {
    if e.is_timeout() {
        wrap(format!("request timed out after {}s", limit.as_secs()))
    } else {
        wrap(e.to_string())
    }
}

/// Clip a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_owned();
    }
    let clipped: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{clipped}…")
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
