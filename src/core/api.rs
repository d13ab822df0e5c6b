//! Uncached backend calls: recommendations and watch-history writes.
//!
//! Recommendation routes are keyed by movie title and go straight to the
//! network. History writes invalidate the my-list bucket so the next read
//! reflects them.

use std::rc::Rc;

use log::{debug, warn};
use serde::Serialize;

use crate::config::endpoints;
use crate::core::error::ApiError;
use crate::core::http::{ApiClient, RequestOptions};
use crate::core::movies::MovieCache;
use crate::core::transport::Method;
use crate::models::{Category, MovieSummary};
use crate::utils::encode_query_component;

#[derive(Serialize)]
struct HistoryRequest {
    tmdb_movie_id: i64,
}

/// Backend operations that bypass the read cache.
#[derive(Clone)]
pub struct MovieApi {
    client: Rc<ApiClient>,
    movies: Rc<MovieCache>,
}

impl MovieApi {
    pub fn new(client: Rc<ApiClient>, movies: Rc<MovieCache>) -> Self {
        Self { client, movies }
    }

    /// Six most similar movies to `title`.
    pub async fn recommendations(&self, title: &str) -> Result<Vec<MovieSummary>, ApiError> {
        let path = format!("{}?name={}", endpoints::TOP_6, encode_query_component(title));
        self.client.get_movies(&path).await
    }

    /// Similar movies ranked 7 through 12.
    pub async fn more_recommendations(&self, title: &str) -> Result<Vec<MovieSummary>, ApiError> {
        let path = format!("{}?name={}", endpoints::TOP_6_TO_12, encode_query_component(title));
        self.client.get_movies(&path).await
    }

    /// Record that the user opened a movie. Failures are logged and dropped.
    pub async fn record_watch(&self, movie_id: i64) {
        let body = HistoryRequest {
            tmdb_movie_id: movie_id,
        };
        let result = self
            .client
            .send_json::<_, serde_json::Value>(endpoints::HISTORY, Method::Post, &body)
            .await;

        match result {
            Ok(_) => {
                debug!("[history] recorded {}", movie_id);
                self.movies.invalidate(Category::MyList);
            }
            Err(e) => warn!("[history] could not record {}: {}", movie_id, e),
        }
    }

    /// Remove a movie from the user's history.
    pub async fn remove_from_history(&self, movie_id: i64) -> Result<(), ApiError> {
        let path = format!("{}{}", endpoints::HISTORY, movie_id);
        self.client.request(&path, RequestOptions::delete()).await?;
        self.movies.invalidate(Category::MyList);
        Ok(())
    }
}
