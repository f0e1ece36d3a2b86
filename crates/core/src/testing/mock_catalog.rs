//! Mock movie catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, Movie, MovieCatalog};

/// Mock implementation of the MovieCatalog trait.
///
/// Serves a configurable movie list and supports one-shot error injection.
pub struct MockMovieCatalog {
    movies: Arc<RwLock<Vec<Movie>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockMovieCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMovieCatalog {
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the catalog contents.
    pub async fn set_movies(&self, movies: Vec<Movie>) {
        *self.movies.write().await = movies;
    }

    /// Add a single movie.
    pub async fn add_movie(&self, movie: Movie) {
        self.movies.write().await.push(movie);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl MovieCatalog for MockMovieCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn movies(&self) -> Result<Vec<Movie>, CatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.movies.read().await.clone())
    }

    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, CatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .find(|m| m.id == movie_id)
            .cloned())
    }
}
