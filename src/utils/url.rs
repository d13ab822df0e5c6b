//! URL resolution for backend requests.
//!
//! Maps the paths used throughout the app onto the configured API origin
//! and percent-encodes query values.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::config::API_PREFIX;

/// Resolve a request path against the API origin.
///
/// - Absolute `http(s)://` URLs pass through unchanged.
/// - Paths rooted at `/api` are prefixed with `origin`.
/// - Other rooted paths (`/static/...`) stay app-relative.
/// - Bare fragments (`search?query=x`) are placed under `/api/` on `origin`.
pub fn resolve_api_url(origin: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    if path.starts_with('/') {
        if is_api_path(path) {
            format!("{}{}", origin, path)
        } else {
            path.to_string()
        }
    } else {
        format!("{}{}/{}", origin, API_PREFIX, path)
    }
}

/// Whether `path` lives under the API prefix (`/api`, `/api/...`, `/api?...`).
fn is_api_path(path: &str) -> bool {
    path.strip_prefix(API_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
}

/// Characters `encodeURIComponent` escapes: everything except
/// alphanumerics and `- _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a query component the way JavaScript's
/// `encodeURIComponent` does.
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}
