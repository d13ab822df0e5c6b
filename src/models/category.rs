//! Fixed cache buckets for catalog pages.

use std::fmt;

use crate::config::{endpoints, top_rated};

/// A named data bucket backed by one backend route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    TopRated,
    MyList,
    Genres,
    Home,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 4] = [
        Category::Home,
        Category::TopRated,
        Category::Genres,
        Category::MyList,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TopRated => "top-rated",
            Self::MyList => "my-list",
            Self::Genres => "genres",
            Self::Home => "home",
        }
    }

    /// Request path for this category.
    ///
    /// Home and Genres share the cold-sample route but are cached separately.
    pub fn endpoint(self) -> String {
        match self {
            Self::TopRated => format!(
                "{}?min_rating={}&min_votes={}",
                endpoints::TOP_RATED,
                top_rated::MIN_RATING,
                top_rated::MIN_VOTES
            ),
            Self::MyList => endpoints::HISTORY.to_string(),
            Self::Genres | Self::Home => endpoints::COLD_SAMPLE.to_string(),
        }
    }

    /// Whether the route needs a bearer token.
    pub fn requires_auth(self) -> bool {
        matches!(self, Self::MyList)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(
            Category::TopRated.endpoint(),
            "/api/top-rated?min_rating=7&min_votes=1000"
        );
        assert_eq!(Category::MyList.endpoint(), "/api/user/history/");
        assert_eq!(Category::Home.endpoint(), "/api/cold-sample");
        assert_eq!(Category::Genres.endpoint(), Category::Home.endpoint());
    }

    #[test]
    fn test_only_my_list_requires_auth() {
        let gated: Vec<_> = Category::ALL.into_iter().filter(|c| c.requires_auth()).collect();
        assert_eq!(gated, vec![Category::MyList]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Category::TopRated.to_string(), "top-rated");
        assert_eq!(format!("{}", Category::Home), "home");
    }
}
