//! Application configuration.
//!
//! Centralizes all configuration constants used throughout the application.
//! The API origin is read at compile time from the `API_BASE` environment
//! variable so that production builds can point at a separate backend.

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name.
pub const APP_NAME: &str = "movierec";

// =============================================================================
// Network Configuration
// =============================================================================

/// Path prefix under which every backend route lives.
pub const API_PREFIX: &str = "/api";

/// Backend origin, e.g. `https://movierec-api.onrender.com`.
///
/// Empty means same-origin (the dev server proxies `/api`).
pub const API_BASE: &str = match option_env!("API_BASE") {
    Some(origin) => origin,
    None => "",
};

/// Fetch request timeout in milliseconds.
pub const FETCH_TIMEOUT_MS: i32 = 10000;

/// Backend routes consumed by the data layer.
pub mod endpoints {
    pub const COLD_SAMPLE: &str = "/api/cold-sample";
    pub const TOP_RATED: &str = "/api/top-rated";
    pub const HISTORY: &str = "/api/user/history/";
    pub const SEARCH: &str = "/api/search";
    pub const TOP_6: &str = "/api/top_6";
    pub const TOP_6_TO_12: &str = "/api/top_6_to_12";
    pub const LOGIN: &str = "/api/login";
    pub const SIGNUP: &str = "/api/signup";
    pub const CURRENT_USER: &str = "/api/current_user";
}

/// TMDB image CDN prefix for `poster_path` values.
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Query parameters for the top-rated category.
pub mod top_rated {
    /// Minimum TMDB average rating.
    pub const MIN_RATING: u32 = 7;
    /// Minimum vote count so obscure titles don't dominate.
    pub const MIN_VOTES: u32 = 1000;
}

// =============================================================================
// Session Configuration
// =============================================================================

/// localStorage key holding the bearer token.
pub const TOKEN_STORAGE_KEY: &str = "token";

// =============================================================================
// Cache Configuration
// =============================================================================

/// In-memory data cache configuration.
pub mod cache {
    /// Maximum age of a cached payload (5 minutes).
    pub const TTL_MS: u64 = 5 * 60 * 1000;
    /// Search queries shorter than this (after trimming) never hit the network.
    pub const MIN_QUERY_LEN: usize = 2;
}

// =============================================================================
// Runtime API Configuration
// =============================================================================

/// Connection settings for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Backend origin without a trailing slash. Empty for same-origin.
    pub origin: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: i32,
}

impl ApiConfig {
    /// Create a config for the given origin with the default timeout.
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }

    /// Config built from the compile-time `API_BASE`.
    pub fn from_env() -> Self {
        Self::new(API_BASE)
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout_ms: i32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_trailing_slash_trimmed() {
        let config = ApiConfig::new("https://api.example.com/");
        assert_eq!(config.origin, "https://api.example.com");
        assert_eq!(config.timeout_ms, FETCH_TIMEOUT_MS);
    }

    #[test]
    fn test_with_timeout() {
        let config = ApiConfig::new("").with_timeout(250);
        assert_eq!(config.origin, "");
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn test_endpoints_live_under_prefix() {
        for path in [
            endpoints::COLD_SAMPLE,
            endpoints::TOP_RATED,
            endpoints::HISTORY,
            endpoints::SEARCH,
            endpoints::LOGIN,
            endpoints::CURRENT_USER,
        ] {
            assert!(path.starts_with(API_PREFIX), "{path}");
        }
    }
}
