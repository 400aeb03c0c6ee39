// src/app/types.rs
use serde::Deserialize;

// ---- catalog records ----
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub original_language: Option<String>,
}

impl Movie {
    /// Full poster URL, or `None` when the catalog has no artwork.
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{image_base_url}{p}"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

/// Per-id record with the richer fields only the detail endpoint returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieDetails {
    pub movie: Movie,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    pub budget: u64,
    pub revenue: u64,
    pub vote_count: Option<u64>,
    pub backdrop_path: Option<String>,
    pub trailer_key: Option<String>,
    pub cast: Vec<CastMember>,
    pub similar: Vec<Movie>,
}

/// One page of catalog results, already normalized at the client boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogPage {
    pub results: Vec<Movie>,
    pub total_pages: u32,
}

// ---- requests / completions ----
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    Search,
    Discover,
}

impl FetchMode {
    pub fn for_query(query: &str) -> Self {
        if query.is_empty() {
            Self::Discover
        } else {
            Self::Search
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Discover => "discover",
        }
    }
}

/// Immutable descriptor for one triggered fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub mode: FetchMode,
    pub query: String,
    pub page: u32,
}

pub struct FetchDone {
    pub generation: u64,
    pub result: Result<CatalogPage, crate::app::catalog::CatalogError>,
}

pub struct DetailDone {
    pub generation: u64,
    pub movie_id: u64,
    pub result: Result<MovieDetails, crate::app::catalog::CatalogError>,
}

// ---- observable states ----
#[derive(Clone, Debug, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Success {
        movies: Vec<Movie>,
        total_pages: u32,
    },
    Failed(String),
}

impl FetchState {
    pub fn movies(&self) -> &[Movie] {
        match self {
            Self::Success { movies, .. } => movies,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DetailState {
    Idle,
    Loading(u64),
    Ready(Box<MovieDetails>),
    Failed(String),
}

/// Aggregated popularity record owned by the trending store.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendingEntry {
    pub id: u64,
    pub title: String,
    pub poster_url: String,
    pub search_count: u64,
    pub last_query: String,
    pub updated_at: i64,
}
