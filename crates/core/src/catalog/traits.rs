//! Trait definitions for the catalog collaborator.

use async_trait::async_trait;

use super::types::{CatalogError, Movie};

/// Read access to the library manager's movie catalog.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Returns the name of this catalog implementation.
    fn name(&self) -> &str;

    /// List all movies in the catalog.
    async fn movies(&self) -> Result<Vec<Movie>, CatalogError>;

    /// Look up a single movie by catalog id.
    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, CatalogError>;
}
