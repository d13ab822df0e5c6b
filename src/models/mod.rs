//! Data models and types for the application.
//!
//! Contains domain types for:
//! - [`MovieSummary`], [`Genre`] - Catalog entries from the backend
//! - [`Category`] - Fixed cache buckets for catalog pages
//! - [`Profile`], [`SignupRequest`] - Account payloads
//! - [`SessionState`] - Authentication state

mod category;
mod movie;
mod profile;
mod session;

pub use category::Category;
pub use movie::{Genre, MovieSummary, decode_movie_list};
pub use profile::{LoginRequest, Profile, SignupRequest, TokenResponse};
pub use session::SessionState;
