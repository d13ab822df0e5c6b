//! Reactive wrappers around the data layer.
//!
//! Each hook returns a [`LocalResource`] whose fetcher goes through the
//! cache, so re-running it is cheap: a fresh entry resolves immediately and
//! an in-flight one is shared.

use leptos::prelude::*;

use crate::app::AppContext;
use crate::core::{ApiError, EntrySnapshot, Movies};
use crate::models::{Category, SessionState};

pub type MoviesResource = LocalResource<Result<Movies, ApiError>>;

fn app_context() -> AppContext {
    use_context::<AppContext>().expect("AppContext must be provided")
}

/// Movies for one category.
///
/// Categories that need a token re-fetch whenever the session changes.
pub fn use_category(category: Category) -> MoviesResource {
    let ctx = app_context();

    LocalResource::new(move || {
        if category.requires_auth() {
            ctx.session.track();
        }
        ctx.movies.with_value(|movies| movies.get_or_fetch(category))
    })
}

/// Search results for `query`, re-run as it changes.
///
/// Queries shorter than two characters resolve to an empty list without a
/// request.
pub fn use_search(query: Signal<String>) -> MoviesResource {
    let ctx = app_context();

    LocalResource::new(move || {
        let query = query.get();
        ctx.movies.with_value(|movies| movies.search_movies(&query))
    })
}

/// Cache state for `category`, for telling stale data apart from fresh.
pub fn use_category_snapshot(category: Category) -> impl Fn() -> EntrySnapshot<Movies> + Copy {
    let ctx = app_context();
    move || ctx.movies.with_value(|movies| movies.peek(category))
}

/// Cache state for a search query.
pub fn use_search_snapshot(query: Signal<String>) -> impl Fn() -> EntrySnapshot<Movies> + Copy {
    let ctx = app_context();
    move || ctx.movies.with_value(|movies| movies.peek_search(&query.get_untracked()))
}

/// Current session state.
pub fn use_session() -> ReadSignal<SessionState> {
    app_context().session.read_only()
}
