//! Home feed: category rows, search, and recommendations for a picked title.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::hooks::{
    MoviesResource, use_category, use_category_snapshot, use_search, use_search_snapshot,
    use_session,
};
use crate::app::AppContext;
use crate::core::{ApiError, EntrySnapshot, Movies};
use crate::models::{Category, MovieSummary};

/// Title the user last opened, shared with the recommendation panel.
#[derive(Clone, Copy)]
struct Selection(RwSignal<Option<(i64, String)>>);

#[component]
pub fn HomeFeed() -> impl IntoView {
    let selection = Selection(RwSignal::new(None));
    provide_context(selection);

    let session = use_session();
    let query = RwSignal::new(String::new());

    view! {
        <main class="feed">
            <input
                class="search-input"
                type="search"
                placeholder="Search movies"
                prop:value=move || query.get()
                on:input=move |ev| query.set(event_target_value(&ev))
            />
            <SearchResults query=query.into() />
            <Recommendations />
            <CategoryRow category=Category::Home title="Discover" />
            <CategoryRow category=Category::TopRated title="Top rated" />
            <Show when=move || session.get().is_authenticated()>
                <CategoryRow category=Category::MyList title="My list" />
            </Show>
        </main>
    }
}

#[component]
fn CategoryRow(category: Category, title: &'static str) -> impl IntoView {
    let resource = use_category(category);
    let snapshot = use_category_snapshot(category);

    view! {
        <section class="row" data-category=category.name()>
            <h2>{title}</h2>
            <MovieResults resource=resource snapshot=snapshot />
        </section>
    }
}

#[component]
fn SearchResults(query: Signal<String>) -> impl IntoView {
    let resource = use_search(query);
    let snapshot = use_search_snapshot(query);

    view! {
        <Show when=move || !query.get().trim().is_empty()>
            <section class="row search-results">
                <h2>"Results"</h2>
                <MovieResults resource=resource snapshot=snapshot />
            </section>
        </Show>
    }
}

/// Loading, failed, stale and loaded states for one movie list.
#[component]
fn MovieResults(
    resource: MoviesResource,
    snapshot: impl Fn() -> EntrySnapshot<Movies> + Copy + Send + Sync + 'static,
) -> impl IntoView {
    view! {
        <Suspense fallback=move || view! { <p class="loading">"Loading..."</p> }>
            {move || {
                resource.get().map(|result| match result {
                    Ok(movies) if movies.is_empty() => view! {
                        <p class="empty">"Nothing here yet."</p>
                    }.into_any(),
                    Ok(movies) => movie_grid(&movies).into_any(),
                    Err(e) => match snapshot().data {
                        Some(stale) => view! {
                            <p class="stale">{stale_notice(&e)}</p>
                            {movie_grid(&stale)}
                        }.into_any(),
                        None => view! {
                            <p class="error">{e.to_string()}</p>
                        }.into_any(),
                    },
                })
            }}
        </Suspense>
    }
}

fn stale_notice(error: &ApiError) -> String {
    format!("Showing saved results ({})", error)
}

fn movie_grid(movies: &[MovieSummary]) -> impl IntoView + use<> {
    let cards = movies
        .iter()
        .filter(|movie| movie.is_available())
        .map(movie_card)
        .collect_view();
    view! { <ul class="movie-grid">{cards}</ul> }
}

fn movie_card(movie: &MovieSummary) -> impl IntoView + use<> {
    let id = movie.id;
    let title = movie.display_title().to_string();
    let year = movie.release_year().map(str::to_string).unwrap_or_default();
    let rating = format!("{:.1}", movie.vote_average.unwrap_or_default());
    let poster = movie.poster_url();
    let alt = title.clone();
    let picked = title.clone();

    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let selection = use_context::<Selection>();
    let on_click = move |_: leptos::ev::MouseEvent| {
        if let Some(Selection(selection)) = selection {
            selection.set(Some((id, picked.clone())));
        }
        if ctx.session.get_untracked().is_authenticated() {
            let api = ctx.api.get_value();
            spawn_local(async move { api.record_watch(id).await });
        }
    };

    view! {
        <li class="movie-card" on:click=on_click>
            {poster.map(|src| view! { <img src=src alt=alt loading="lazy" /> })}
            <span class="movie-title">{title}</span>
            <span class="movie-meta">{year}" · "{rating}</span>
        </li>
    }
}

/// Similar titles for the last movie the user opened.
#[component]
fn Recommendations() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let Selection(selection) = expect_context::<Selection>();

    let recommendations = LocalResource::new(move || {
        let picked = selection.get();
        let api = ctx.api.get_value();
        async move {
            match picked {
                Some((_, title)) => api.recommendations(&title).await.map(Some),
                None => Ok(None),
            }
        }
    });

    view! {
        <Suspense fallback=|| ()>
            {move || {
                recommendations.get().map(|result| match result {
                    Ok(Some(movies)) => view! {
                        <section class="row recommendations">
                            <h2>"Because you picked "{selected_title(selection)}</h2>
                            {movie_grid(&movies)}
                        </section>
                    }.into_any(),
                    Ok(None) => ().into_any(),
                    Err(e) => view! {
                        <p class="error">{e.to_string()}</p>
                    }.into_any(),
                })
            }}
        </Suspense>
    }
}

fn selected_title(selection: RwSignal<Option<(i64, String)>>) -> String {
    selection
        .get_untracked()
        .map(|(_, title)| title)
        .unwrap_or_default()
}
