use std::{env, fs, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_CACHE_DIR: &str = ".cinedex_cache";
pub const LOCAL_TRENDING_DB_FILE: &str = "trending.db";
pub const SESSION_PREFS_FILE: &str = "session_prefs.txt";

pub const DEFAULT_DEBOUNCE_MS: u64 = 750;
pub const DEFAULT_TRENDING_LIMIT: usize = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cache_dir: Option<String>,
    pub api_base_url: String,
    pub image_base_url: String,
    pub tmdb_api_token: Option<String>,
    pub trending_db: Option<String>,
    pub debounce_ms: u64,
    pub trending_limit: usize,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            tmdb_api_token: None,
            trending_db: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            trending_limit: DEFAULT_TRENDING_LIMIT,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(self.cache_dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR))
    }

    pub fn session_prefs_path(&self) -> PathBuf {
        self.cache_dir().join(SESSION_PREFS_FILE)
    }

    pub fn trending_db_path(&self) -> PathBuf {
        match &self.trending_db {
            Some(p) => PathBuf::from(p),
            None => self.cache_dir().join(LOCAL_TRENDING_DB_FILE),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    cache_dir: Option<String>,
    api_base_url: Option<String>,
    image_base_url: Option<String>,
    #[serde(alias = "tmdb_api_key")]
    tmdb_api_token: Option<String>,
    trending_db: Option<String>,
    debounce_ms: Option<u64>,
    trending_limit: Option<usize>,
    http_timeout_secs: Option<u64>,
}

pub fn load_config() -> AppConfig {
    let cfg_path = PathBuf::from("config.json");
    let mut cfg = match fs::read_to_string(&cfg_path) {
        Ok(raw) => match parse_config(&raw) {
            Ok(cfg) => {
                info!("Loaded config from {}", cfg_path.display());
                cfg
            }
            Err(err) => {
                warn!("Failed to parse config.json ({}). Using defaults.", err);
                AppConfig::default()
            }
        },
        Err(_) => {
            info!("No config.json found; using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut cfg);
    cfg
}

/// Merge a `config.json` body over the defaults. Unknown keys are ignored.
pub fn parse_config(raw: &str) -> Result<AppConfig, serde_json::Error> {
    let parsed = serde_json::from_str::<RawConfig>(raw)?;
    let mut cfg = AppConfig::default();

    if parsed.cache_dir.is_some() {
        cfg.cache_dir = parsed.cache_dir;
    }
    if let Some(url) = parsed.api_base_url {
        cfg.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = parsed.image_base_url {
        cfg.image_base_url = url.trim_end_matches('/').to_string();
    }
    if parsed.tmdb_api_token.is_some() {
        cfg.tmdb_api_token = parsed.tmdb_api_token;
    }
    if parsed.trending_db.is_some() {
        cfg.trending_db = parsed.trending_db;
    }
    if let Some(ms) = parsed.debounce_ms {
        if ms == 0 {
            warn!("debounce_ms must be positive; keeping {DEFAULT_DEBOUNCE_MS}.");
        } else {
            cfg.debounce_ms = ms;
        }
    }
    if let Some(limit) = parsed.trending_limit {
        cfg.trending_limit = limit.clamp(1, 50);
    }
    if let Some(secs) = parsed.http_timeout_secs {
        cfg.http_timeout_secs = secs.max(1);
    }

    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    let token = env::var("TMDB_API_TOKEN").or_else(|_| env::var("TMDB_API_KEY"));
    if let Ok(token) = token {
        if !token.trim().is_empty() {
            cfg.tmdb_api_token = Some(token.trim().to_string());
        }
    }
    if let Some(dir) = env::var_os("CINEDEX_CACHE_DIR") {
        cfg.cache_dir = Some(dir.to_string_lossy().into_owned());
    }
    if cfg.tmdb_api_token.is_none() {
        warn!("No TMDB token configured; catalog requests will be rejected upstream.");
    }
}
