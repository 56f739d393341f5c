//! Shared utility functions for provider adapters.

use mn_domain::error::Error;

/// Convert a [`reqwest::Error`] into an `Error::Upstream` naming the
/// provider, so transport failures and bad statuses surface through the
/// same taxonomy entry.
pub(crate) fn upstream_transport(provider: &str, e: reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        format!("timeout: {e}")
    } else {
        e.to_string()
    };
    Error::Upstream {
        provider: provider.to_owned(),
        message,
    }
}

/// Build an `Error::Upstream` for a non-success HTTP status.
pub(crate) fn upstream_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Error {
    Error::Upstream {
        provider: provider.to_owned(),
        message: format!("HTTP {} - {}", status.as_u16(), body),
    }
}
