//! Movie data cache shared by every catalog page.
//!
//! Two [`KeyedCache`]s sit behind one facade: a fixed set of category
//! buckets and an open-ended map of search queries. Both use the same TTL
//! and coalescing rules.

use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use log::debug;

use crate::config::{cache, endpoints};
use crate::core::cache::{EntrySnapshot, KeyedCache};
use crate::core::clock::Clock;
use crate::core::error::ApiError;
use crate::core::http::ApiClient;
use crate::models::{Category, MovieSummary};
use crate::utils::encode_query_component;

/// A cached movie list. Every caller served from the same fetch gets the
/// same allocation.
pub type Movies = Rc<Vec<MovieSummary>>;

/// Normalize a search query: trimmed and lower-cased.
///
/// Returns `None` for queries too short to search.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.chars().count() < cache::MIN_QUERY_LEN {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Debug view of one category bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInfo {
    pub category: Category,
    pub has_data: bool,
    pub item_count: usize,
    pub is_loading: bool,
    pub is_fresh: bool,
    /// `None` if never fetched.
    pub age_ms: Option<u64>,
}

/// Debug view of the whole cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheInfo {
    pub categories: Vec<CategoryInfo>,
    pub cached_queries: usize,
}

/// Category and search caches in front of the API client.
pub struct MovieCache {
    client: Rc<ApiClient>,
    categories: KeyedCache<Category, Movies>,
    searches: KeyedCache<String, Movies>,
}

impl MovieCache {
    pub fn new(client: Rc<ApiClient>, clock: Rc<dyn Clock>) -> Self {
        Self::with_ttl(client, clock, cache::TTL_MS)
    }

    pub fn with_ttl(client: Rc<ApiClient>, clock: Rc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            client,
            categories: KeyedCache::new("category", Rc::clone(&clock), ttl_ms),
            searches: KeyedCache::new("search", clock, ttl_ms),
        }
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    /// Cached movies for `category`, fetching if stale or missing.
    pub fn get_or_fetch(&self, category: Category) -> LocalBoxFuture<'static, Result<Movies, ApiError>> {
        let client = Rc::clone(&self.client);
        self.categories.get_or_fetch(category, move || {
            client
                .get_movies(&category.endpoint())
                .map(|result| result.map(Rc::new))
        })
    }

    pub fn fetch_top_rated(&self) -> LocalBoxFuture<'static, Result<Movies, ApiError>> {
        self.get_or_fetch(Category::TopRated)
    }

    pub fn fetch_my_list(&self) -> LocalBoxFuture<'static, Result<Movies, ApiError>> {
        self.get_or_fetch(Category::MyList)
    }

    pub fn fetch_genres(&self) -> LocalBoxFuture<'static, Result<Movies, ApiError>> {
        self.get_or_fetch(Category::Genres)
    }

    pub fn fetch_home(&self) -> LocalBoxFuture<'static, Result<Movies, ApiError>> {
        self.get_or_fetch(Category::Home)
    }

    pub fn peek(&self, category: Category) -> EntrySnapshot<Movies> {
        self.categories.peek(&category)
    }

    pub fn invalidate(&self, category: Category) {
        self.categories.invalidate(&category);
    }

    /// Reset every category and drop all search results.
    pub fn clear(&self) {
        debug!("[cache] clearing all movie data");
        self.categories.clear();
        self.searches.clear();
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Search results for `query`, cached per normalized query.
    ///
    /// Queries shorter than two characters resolve to an empty list
    /// immediately, without a request or a cache entry.
    pub fn search_movies(&self, query: &str) -> LocalBoxFuture<'static, Result<Movies, ApiError>> {
        let Some(key) = normalize_query(query) else {
            return future::ready(Ok(Rc::new(Vec::new()))).boxed_local();
        };

        let client = Rc::clone(&self.client);
        let path = format!("{}?query={}", endpoints::SEARCH, encode_query_component(&key));
        self.searches.get_or_fetch(key, move || {
            client.get_movies(&path).map(|result| result.map(Rc::new))
        })
    }

    /// Snapshot for `query`; empty for unknown or too-short queries.
    pub fn peek_search(&self, query: &str) -> EntrySnapshot<Movies> {
        normalize_query(query)
            .map(|key| self.searches.peek(&key))
            .unwrap_or_default()
    }

    /// Drop all search results.
    pub fn clear_search(&self) {
        self.searches.clear();
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    pub fn info(&self) -> CacheInfo {
        let now = self.categories.now_ms();
        let ttl = self.categories.ttl_ms();
        let categories = Category::ALL
            .into_iter()
            .map(|category| {
                let snapshot = self.categories.peek(&category);
                CategoryInfo {
                    category,
                    has_data: snapshot.data.is_some(),
                    item_count: snapshot.data.as_ref().map_or(0, |movies| movies.len()),
                    is_loading: snapshot.loading,
                    is_fresh: snapshot.is_fresh(now, ttl),
                    age_ms: snapshot.age_ms(now),
                }
            })
            .collect();

        CacheInfo {
            categories,
            cached_queries: self.searches.len(),
        }
    }
}
