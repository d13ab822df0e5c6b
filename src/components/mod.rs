//! UI components built with Leptos.
//!
//! - [`HomeFeed`] - Category rows, search and recommendations
//! - [`SessionBadge`] - Current user with login and logout
//! - [`hooks`] - Resources over the movie cache and session

mod feed;
pub mod hooks;
mod session;

pub use feed::HomeFeed;
pub use session::SessionBadge;
