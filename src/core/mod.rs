//! Data layer for the catalog frontend.
//!
//! This module provides:
//! - [`ApiClient`] for JSON requests with bearer-token injection
//! - [`MovieCache`] for TTL-bounded, coalesced category and search lookups
//! - [`SessionStore`] for login, signup, logout and session restore
//! - [`MovieApi`] for uncached recommendation and history calls
//!
//! Platform access goes through the [`Transport`], [`TokenStore`] and
//! [`Clock`] traits so everything here runs outside the browser in tests.

mod api;
pub mod cache;
pub mod clock;
pub mod error;
pub mod http;
pub mod movies;
mod session;
pub mod storage;
pub mod transport;

pub use api::MovieApi;
pub use cache::{EntrySnapshot, KeyedCache};
pub use clock::{Clock, SystemClock};
pub use error::{ApiError, AuthError, StorageError};
pub use http::{ApiClient, RequestOptions, ResponseBody};
pub use movies::{CacheInfo, CategoryInfo, MovieCache, Movies, normalize_query};
pub use session::SessionStore;
pub use storage::{LocalTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{HttpRequest, Method, RawResponse, Transport};
