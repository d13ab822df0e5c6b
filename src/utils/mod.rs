//! Utility modules for web and DOM operations.
//!
//! Provides:
//! - [`FetchTransport`] - Fetch API transport with timeout
//! - [`resolve_api_url`], [`encode_query_component`] - Request URL building

pub mod dom;
mod fetch;
mod url;

pub use fetch::FetchTransport;
pub use url::{encode_query_component, resolve_api_url};
