//! Movie payloads returned by the backend.
//!
//! The backend proxies TMDB, so list items arrive in slightly different
//! shapes depending on the route: `genre_ids` from discover/search,
//! `genres[{id,name}]` from detail lookups, `name` instead of `title` for
//! some entries, and a `status: "unavailable"` placeholder in history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::POSTER_BASE_URL;
use crate::core::error::ApiError;

/// TMDB genre reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// One movie as shown on cards and lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieSummary {
    pub id: i64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Vec<i64>,
    pub genres: Vec<Genre>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub status: Option<String>,
}

impl MovieSummary {
    /// `title`, falling back to `name`.
    pub fn display_title(&self) -> &str {
        [self.title.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or("Untitled")
    }

    /// Genre ids from whichever representation the payload used.
    pub fn genre_id_list(&self) -> Vec<i64> {
        if self.genre_ids.is_empty() {
            self.genres.iter().map(|g| g.id).collect()
        } else {
            self.genre_ids.clone()
        }
    }

    pub fn has_genre(&self, genre_id: i64) -> bool {
        self.genre_id_list().contains(&genre_id)
    }

    /// False for history placeholders whose TMDB lookup failed.
    pub fn is_available(&self) -> bool {
        self.status.as_deref() != Some("unavailable")
    }

    /// Four-digit year from `release_date`, if present.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }

    /// Full TMDB poster URL, if the movie has a poster.
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", POSTER_BASE_URL, path))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoviesPayload {
    Bare(Vec<MovieSummary>),
    Wrapped {
        #[serde(default)]
        movies: Vec<MovieSummary>,
    },
}

/// Decode `{ movies: [...] }` or a bare array into a movie list.
///
/// An object without `movies` (e.g. `{"message": "No history found"}`)
/// decodes as an empty list.
pub fn decode_movie_list(value: Value) -> Result<Vec<MovieSummary>, ApiError> {
    match serde_json::from_value(value) {
        Ok(MoviesPayload::Bare(movies)) | Ok(MoviesPayload::Wrapped { movies }) => Ok(movies),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}
