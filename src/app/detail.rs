// src/app/detail.rs
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::catalog::CatalogClient;
use crate::app::types::{DetailDone, DetailState};

pub const DETAIL_FETCH_ERROR: &str = "Failed to load movie details. Please try again later.";

/// Loads one movie's detail record at a time. Opening another movie
/// supersedes the pending one; nothing is cached.
pub struct DetailLoader {
    client: Arc<dyn CatalogClient>,
    state: DetailState,
    generation: u64,
    done_tx: Sender<DetailDone>,
    done_rx: Receiver<DetailDone>,
}

impl DetailLoader {
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        let (done_tx, done_rx) = mpsc::channel::<DetailDone>();
        Self {
            client,
            state: DetailState::Idle,
            generation: 0,
            done_tx,
            done_rx,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn load(&mut self, movie_id: u64) {
        self.generation += 1;
        self.state = DetailState::Loading(movie_id);

        let generation = self.generation;
        let client = Arc::clone(&self.client);
        let done_tx = self.done_tx.clone();
        std::thread::spawn(move || {
            let result = client.fetch_details(movie_id);
            let _ = done_tx.send(DetailDone {
                generation,
                movie_id,
                result,
            });
        });
    }

    pub fn clear(&mut self) {
        // bumping the generation orphans any request still in flight
        self.generation += 1;
        self.state = DetailState::Idle;
    }

    /// Returns true if the visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            let done = match self.done_rx.try_recv() {
                Ok(done) => done,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            if done.generation != self.generation {
                debug!("dropping stale detail response for {}", done.movie_id);
                continue;
            }
            self.state = match done.result {
                Ok(details) => DetailState::Ready(Box::new(details)),
                Err(err) => {
                    warn!("Error fetching movie details for {}: {err}", done.movie_id);
                    DetailState::Failed(DETAIL_FETCH_ERROR.into())
                }
            };
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::catalog::CatalogError;
    use crate::app::types::{CatalogPage, FetchRequest, Movie, MovieDetails};
    use std::time::Duration;

    /// Sleeps longer for lower ids so earlier loads finish last.
    struct SlowClient;

    impl CatalogClient for SlowClient {
        fn fetch_page(&self, _: &FetchRequest) -> Result<CatalogPage, CatalogError> {
            Ok(CatalogPage::default())
        }

        fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, CatalogError> {
            if movie_id == 0 {
                return Err(CatalogError::Status {
                    status: 404,
                    url: "movie/0".into(),
                });
            }
            std::thread::sleep(Duration::from_millis(120 / movie_id));
            Ok(MovieDetails {
                movie: Movie {
                    id: movie_id,
                    title: format!("Movie {movie_id}"),
                    ..Movie::default()
                },
                ..MovieDetails::default()
            })
        }
    }

    fn settle(loader: &mut DetailLoader) {
        for _ in 0..100 {
            loader.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn latest_load_wins() {
        let mut loader = DetailLoader::new(Arc::new(SlowClient));
        loader.load(1);
        loader.load(4);
        assert_eq!(loader.state(), &DetailState::Loading(4));
        settle(&mut loader);
        match loader.state() {
            DetailState::Ready(d) => assert_eq!(d.movie.id, 4),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn failure_uses_friendly_message() {
        let mut loader = DetailLoader::new(Arc::new(SlowClient));
        loader.load(0);
        settle(&mut loader);
        assert_eq!(
            loader.state(),
            &DetailState::Failed(DETAIL_FETCH_ERROR.to_string())
        );
    }

    #[test]
    fn clear_orphans_pending_request() {
        let mut loader = DetailLoader::new(Arc::new(SlowClient));
        loader.load(2);
        loader.clear();
        settle(&mut loader);
        assert_eq!(loader.state(), &DetailState::Idle);
    }
}
