// src/app/trending.rs
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use chrono::Utc;
use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::types::{Movie, TrendingEntry};

/// Stored when a movie has no poster in the catalog.
pub const NO_POSTER_URL: &str = "/no-movie.png";

#[derive(Debug, Error)]
pub enum TrendingError {
    #[error("trending store SQL failure in {context}: {source}")]
    Sql {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("trending store lock poisoned")]
    Poisoned,

    #[error("trending store unavailable: {0}")]
    Unavailable(String),
}

/// Counter store keyed by catalog id. `increment` must be atomic per id.
pub trait PopularityStore: Send + Sync {
    fn increment(
        &self,
        movie_id: u64,
        title: &str,
        poster_url: &str,
        query: &str,
    ) -> Result<(), TrendingError>;

    /// Entries by descending count, most recently updated first on ties.
    fn top_n(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendingError>;
}

// ---- sqlite-backed store ----
const SQL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trending (
  movie_id     INTEGER PRIMARY KEY,
  title        TEXT    NOT NULL,
  poster_url   TEXT    NOT NULL,
  search_count INTEGER NOT NULL,
  last_query   TEXT    NOT NULL DEFAULT '',
  updated_at   INTEGER NOT NULL,
  seq          INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS trending_rank ON trending (search_count DESC, seq DESC);
"#;

// The seq column orders updates that land within the same millisecond.
const SQL_INCREMENT: &str = r#"
INSERT INTO trending (movie_id, title, poster_url, search_count, last_query, updated_at, seq)
VALUES (?1, ?2, ?3, 1, ?4, ?5, (SELECT COALESCE(MAX(seq), 0) + 1 FROM trending))
ON CONFLICT(movie_id) DO UPDATE SET
  search_count = search_count + 1,
  title        = excluded.title,
  poster_url   = excluded.poster_url,
  last_query   = excluded.last_query,
  updated_at   = excluded.updated_at,
  seq          = excluded.seq
"#;

const SQL_TOP_N: &str = r#"
SELECT movie_id, title, poster_url, search_count, last_query, updated_at
FROM trending
ORDER BY search_count DESC, seq DESC
LIMIT ?1
"#;

pub struct SqliteTrendingStore {
    conn: Mutex<Connection>,
}

impl SqliteTrendingStore {
    pub fn open(path: &Path) -> Result<Self, TrendingError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| TrendingError::Unavailable(format!("{}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path).map_err(|source| TrendingError::Sql {
            context: "open",
            source,
        })?;
        info!("Opened trending store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, TrendingError> {
        let conn = Connection::open_in_memory().map_err(|source| TrendingError::Sql {
            context: "open",
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, TrendingError> {
        conn.execute_batch(SQL_SCHEMA)
            .map_err(|source| TrendingError::Sql {
                context: "schema",
                source,
            })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PopularityStore for SqliteTrendingStore {
    fn increment(
        &self,
        movie_id: u64,
        title: &str,
        poster_url: &str,
        query: &str,
    ) -> Result<(), TrendingError> {
        let conn = self.conn.lock().map_err(|_| TrendingError::Poisoned)?;
        conn.execute(
            SQL_INCREMENT,
            params![
                movie_id as i64,
                title,
                poster_url,
                query,
                Utc::now().timestamp_millis()
            ],
        )
        .map_err(|source| TrendingError::Sql {
            context: "increment",
            source,
        })?;
        Ok(())
    }

    fn top_n(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendingError> {
        let conn = self.conn.lock().map_err(|_| TrendingError::Poisoned)?;
        let sql_err = |source| TrendingError::Sql {
            context: "top_n",
            source,
        };
        let mut stmt = conn.prepare_cached(SQL_TOP_N).map_err(sql_err)?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(TrendingEntry {
                    id: row.get::<_, i64>(0)? as u64,
                    title: row.get(1)?,
                    poster_url: row.get(2)?,
                    search_count: row.get::<_, i64>(3)? as u64,
                    last_query: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })
            .map_err(sql_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
    }
}

// ---- business rule on top of the store ----
/// Bumps the top hit of every successful non-empty search. Never fails
/// outward: the trending list is decoration.
pub struct PopularityAggregator {
    store: Arc<dyn PopularityStore>,
    image_base_url: String,
}

impl PopularityAggregator {
    pub fn new(store: Arc<dyn PopularityStore>, image_base_url: impl Into<String>) -> Self {
        Self {
            store,
            image_base_url: image_base_url.into(),
        }
    }

    /// Returns whether the store accepted the increment.
    pub fn record(&self, query: &str, top_result: &Movie) -> bool {
        if query.is_empty() {
            return false;
        }
        let poster_url = top_result
            .poster_url(&self.image_base_url)
            .unwrap_or_else(|| NO_POSTER_URL.to_string());
        match self
            .store
            .increment(top_result.id, &top_result.title, &poster_url, query)
        {
            Ok(()) => {
                debug!("trending +1 for {} ({}) via {query:?}", top_result.title, top_result.id);
                true
            }
            Err(err) => {
                warn!("failed to record search for {}: {err}", top_result.id);
                false
            }
        }
    }

    /// Fire-and-forget variant for the event loop.
    pub fn spawn_record(self: &Arc<Self>, query: String, top_result: Movie) -> JoinHandle<()> {
        let this = Arc::clone(self);
        std::thread::spawn(move || {
            this.record(&query, &top_result);
        })
    }

    pub fn top_n(&self, limit: usize) -> Vec<TrendingEntry> {
        match self.store.top_n(limit) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Error fetching trending movies: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{id}.jpg")),
            ..Movie::default()
        }
    }

    fn aggregator() -> (Arc<SqliteTrendingStore>, PopularityAggregator) {
        let store = Arc::new(SqliteTrendingStore::open_in_memory().unwrap());
        let agg = PopularityAggregator::new(store.clone(), "https://img/w500");
        (store, agg)
    }

    struct BrokenStore;

    impl PopularityStore for BrokenStore {
        fn increment(&self, _: u64, _: &str, _: &str, _: &str) -> Result<(), TrendingError> {
            Err(TrendingError::Unavailable("offline".into()))
        }

        fn top_n(&self, _: usize) -> Result<Vec<TrendingEntry>, TrendingError> {
            Err(TrendingError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn first_record_creates_entry() {
        let (store, agg) = aggregator();
        assert!(agg.record("dune", &movie(1, "Dune")));
        let top = store.top_n(10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, 1);
        assert_eq!(top[0].search_count, 1);
        assert_eq!(top[0].poster_url, "https://img/w500/1.jpg");
        assert_eq!(top[0].last_query, "dune");
    }

    #[test]
    fn repeated_records_add_exactly_one_each() {
        let (_store, agg) = aggregator();
        agg.record("dune", &movie(1, "Dune"));
        let before = agg.top_n(1)[0].search_count;
        agg.record("dune", &movie(1, "Dune"));
        agg.record("dune part two", &movie(1, "Dune"));
        let after = agg.top_n(1)[0].search_count;
        assert_eq!(after, before + 2);
    }

    #[test]
    fn empty_query_is_not_counted() {
        let (store, agg) = aggregator();
        assert!(!agg.record("", &movie(1, "Dune")));
        assert!(store.top_n(5).unwrap().is_empty());
    }

    #[test]
    fn missing_poster_uses_placeholder() {
        let (_store, agg) = aggregator();
        let mut m = movie(5, "Obscure");
        m.poster_path = None;
        agg.record("obscure", &m);
        assert_eq!(agg.top_n(1)[0].poster_url, NO_POSTER_URL);
    }

    #[test]
    fn orders_by_count_then_recency() {
        let (_store, agg) = aggregator();
        agg.record("a", &movie(1, "A"));
        agg.record("a", &movie(1, "A"));
        agg.record("b", &movie(2, "B"));
        agg.record("c", &movie(3, "C"));
        agg.record("b", &movie(2, "B"));
        agg.record("d", &movie(4, "D"));

        let ids: Vec<u64> = agg.top_n(10).iter().map(|e| e.id).collect();
        // 2 was bumped after 1, so it wins the tie; 4 is newer than 3
        assert_eq!(ids, vec![2, 1, 4, 3]);
        assert_eq!(agg.top_n(2).len(), 2);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let (store, agg) = aggregator();
        let agg = Arc::new(agg);
        let handles: Vec<_> = (0..8)
            .map(|_| agg.spawn_record("alien".into(), movie(7, "Alien")))
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.top_n(1).unwrap()[0].search_count, 8);
    }

    #[test]
    fn store_failures_are_swallowed() {
        let agg = PopularityAggregator::new(Arc::new(BrokenStore), "https://img");
        assert!(!agg.record("dune", &movie(1, "Dune")));
        assert!(agg.top_n(5).is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("trending.db");
        {
            let store = SqliteTrendingStore::open(&path).unwrap();
            store.increment(3, "Heat", "/h.jpg", "heat").unwrap();
        }
        let store = SqliteTrendingStore::open(&path).unwrap();
        store.increment(3, "Heat", "/h.jpg", "heat").unwrap();
        assert_eq!(store.top_n(1).unwrap()[0].search_count, 2);
    }
}
