// src/app/catalog.rs
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::app::types::{
    CastMember, CatalogPage, FetchMode, FetchRequest, Genre, Movie, MovieDetails,
};
use crate::config::AppConfig;

/// Shown to the user for any transport / HTTP / decode failure.
pub const GENERIC_FETCH_ERROR: &str = "Error fetching movies. Please try again!";
/// Shown when the server flags an error but gives no message.
pub const DEFAULT_UPSTREAM_ERROR: &str = "Failed to fetch!";

const MAX_CAST: usize = 6;
const MAX_SIMILAR: usize = 8;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog client setup failed: {0}")]
    Config(String),

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("upstream error payload: {}", .message.as_deref().unwrap_or("<none>"))]
    Upstream { message: Option<String> },

    #[error("malformed catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    /// Text that is safe to put in front of the user. Only the
    /// application-level payload is allowed to carry server wording.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { message } => message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_UPSTREAM_ERROR)
                .to_string(),
            _ => GENERIC_FETCH_ERROR.to_string(),
        }
    }
}

/// Remote movie catalog. Implementations must be callable from worker threads.
pub trait CatalogClient: Send + Sync {
    fn fetch_page(&self, request: &FetchRequest) -> Result<CatalogPage, CatalogError>;
    fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, CatalogError>;
}

// ---- URL building ----
pub fn page_url(base_url: &str, mode: FetchMode, query: &str, page: u32) -> String {
    match mode {
        FetchMode::Search => format!(
            "{base_url}/search/movie?query={}&page={page}",
            urlencoding::encode(query)
        ),
        FetchMode::Discover => {
            format!("{base_url}/discover/movie?sort_by=popularity.desc&page={page}")
        }
    }
}

pub fn details_url(base_url: &str, movie_id: u64) -> String {
    format!("{base_url}/movie/{movie_id}?append_to_response=videos,credits,similar")
}

// ---- response normalization ----
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(rename = "Response")]
    response: Option<Value>,
    #[serde(rename = "Error")]
    error: Option<String>,
    success: Option<bool>,
    status_message: Option<String>,
    results: Option<Vec<Movie>>,
    total_pages: Option<u32>,
}

impl RawPage {
    /// The server flags errors either as `"Response": "false"` (string or
    /// bool) or as `"success": false`.
    fn error_flagged(&self) -> bool {
        let response_false = match &self.response {
            Some(Value::Bool(b)) => !b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("false"),
            _ => false,
        };
        response_false || self.success == Some(false)
    }
}

pub fn parse_page_body(body: &str) -> Result<CatalogPage, CatalogError> {
    let raw: RawPage = serde_json::from_str(body)?;
    if raw.error_flagged() {
        return Err(CatalogError::Upstream {
            message: raw.error.or(raw.status_message),
        });
    }
    Ok(CatalogPage {
        results: raw.results.unwrap_or_default(),
        total_pages: raw.total_pages.unwrap_or(0),
    })
}

#[derive(Debug, Deserialize)]
struct RawList<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

impl<T> Default for RawList<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVideo {
    key: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCredits {
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    #[serde(flatten)]
    movie: Movie,
    success: Option<bool>,
    status_message: Option<String>,
    tagline: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    budget: Option<u64>,
    revenue: Option<u64>,
    vote_count: Option<u64>,
    backdrop_path: Option<String>,
    #[serde(default)]
    videos: RawList<RawVideo>,
    #[serde(default)]
    credits: RawCredits,
    #[serde(default)]
    similar: RawList<Movie>,
}

pub fn parse_details_body(body: &str) -> Result<MovieDetails, CatalogError> {
    let raw: RawDetails = serde_json::from_str(body)?;
    if raw.success == Some(false) {
        return Err(CatalogError::Upstream {
            message: raw.status_message,
        });
    }

    let trailer_key = raw
        .videos
        .results
        .into_iter()
        .find(|v| v.kind == "Trailer" && !v.key.is_empty())
        .map(|v| v.key);

    Ok(MovieDetails {
        movie: raw.movie,
        tagline: raw.tagline.filter(|t| !t.is_empty()),
        overview: raw.overview.filter(|o| !o.is_empty()),
        genres: raw.genres,
        runtime: raw.runtime.filter(|r| *r > 0),
        budget: raw.budget.unwrap_or(0),
        revenue: raw.revenue.unwrap_or(0),
        vote_count: raw.vote_count,
        backdrop_path: raw.backdrop_path,
        trailer_key,
        cast: raw.credits.cast.into_iter().take(MAX_CAST).collect(),
        similar: raw.similar.results.into_iter().take(MAX_SIMILAR).collect(),
    })
}

// ---- TMDB over reqwest ----
pub struct TmdbClient {
    client: Client,
    base_url: String,
}

impl TmdbClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent("cinedex/catalog")
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
                let mut h = HeaderMap::new();
                h.insert(ACCEPT, HeaderValue::from_static("application/json"));
                if let Some(token) = &cfg.tmdb_api_token {
                    let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                        .map_err(|e| CatalogError::Config(format!("bad API token: {e}")))?;
                    bearer.set_sensitive(true);
                    h.insert(AUTHORIZATION, bearer);
                }
                h
            })
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.api_base_url.clone(),
        })
    }

    fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        debug!("GET {url}");
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text()?)
    }
}

impl CatalogClient for TmdbClient {
    fn fetch_page(&self, request: &FetchRequest) -> Result<CatalogPage, CatalogError> {
        let url = page_url(&self.base_url, request.mode, &request.query, request.page);
        let body = self.get_text(&url)?;
        parse_page_body(&body)
    }

    fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, CatalogError> {
        let body = self.get_text(&details_url(&self.base_url, movie_id))?;
        parse_details_body(&body)
    }
}
