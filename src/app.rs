//! Root application module.
//!
//! Builds the data layer once, exposes it through [`AppContext`], and
//! restores any stored session on mount.

use std::rc::Rc;

use leptos::prelude::*;
use log::debug;
use wasm_bindgen_futures::spawn_local;

use crate::components::{HomeFeed, SessionBadge};
use crate::config::APP_NAME;
use crate::core::{ApiClient, LocalTokenStore, MovieApi, MovieCache, SessionStore, SystemClock};
use crate::models::{Category, SessionState};

// ============================================================================
// AppContext
// ============================================================================

/// Application-wide context.
///
/// The data-layer services are `Rc`-based and live in local stored values;
/// the session is mirrored into a signal so views re-render on login and
/// logout.
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Category and search cache.
    pub movies: StoredValue<Rc<MovieCache>, LocalStorage>,
    /// Login, signup, logout and restore.
    pub sessions: StoredValue<Rc<SessionStore>, LocalStorage>,
    /// Recommendations and watch history.
    pub api: StoredValue<MovieApi, LocalStorage>,
    /// Current session, kept in sync with `sessions`.
    pub session: RwSignal<SessionState>,
}

impl AppContext {
    pub fn new() -> Self {
        let client = Rc::new(ApiClient::browser());
        let movies = Rc::new(MovieCache::new(Rc::clone(&client), Rc::new(SystemClock)));
        let sessions = Rc::new(SessionStore::new(
            Rc::clone(&client),
            Rc::new(LocalTokenStore::new()),
        ));
        let api = MovieApi::new(client, Rc::clone(&movies));
        let session = RwSignal::new(sessions.state());

        {
            let movies = Rc::clone(&movies);
            sessions.subscribe(move |state| {
                session.set(state.clone());
                // The personal list belongs to whoever was signed in before
                if !state.is_resolving() {
                    movies.invalidate(Category::MyList);
                }
            });
        }

        Self {
            movies: StoredValue::new_local(movies),
            sessions: StoredValue::new_local(sessions),
            api: StoredValue::new_local(api),
            session,
        }
    }

    pub fn logout(&self) {
        self.sessions.with_value(|sessions| sessions.logout());
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Root application component with error boundary.
#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext::new();
    provide_context(ctx);

    let sessions = ctx.sessions.get_value();
    spawn_local(async move {
        let state = sessions.restore().await;
        debug!("[app] session restored as {}", state.display_name());
    });

    view! {
        <ErrorBoundary
            fallback=|errors| view! {
                <div class="app-error">
                    <h1>"Something went wrong"</h1>
                    <p>"An unexpected error occurred. Please try reloading the page."</p>
                    <ul>
                        {move || errors.get()
                            .into_iter()
                            .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                            .collect::<Vec<_>>()
                        }
                    </ul>
                    <button on:click=move |_| {
                        if let Some(window) = web_sys::window() {
                            let _ = window.location().reload();
                        }
                    }>
                        "Reload Page"
                    </button>
                </div>
            }
        >
            <header class="app-header">
                <span class="app-title">{APP_NAME}</span>
                <SessionBadge />
            </header>
            <HomeFeed />
        </ErrorBoundary>
    }
}
