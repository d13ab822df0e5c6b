//! Client-side data layer and thin Leptos UI for the movie recommendation
//! frontend.

pub mod app;
pub mod components;
pub mod config;
pub mod core;
pub mod models;
pub mod utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
