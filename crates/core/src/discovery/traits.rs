//! Trait definitions for discovery providers.

use async_trait::async_trait;

use crate::catalog::Movie;

use super::types::{DiscoveredTrailer, DiscoveryError};

/// A pluggable source of candidate trailer URLs for a movie.
///
/// Each call may re-scrape the upstream source; the result is a finite
/// snapshot, not a resumable stream. An empty result is a valid answer.
/// Providers are composed by the pipeline; duplicate URLs across providers
/// are absorbed by the store's insert-if-unseen semantics.
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Returns the name of this provider implementation.
    fn name(&self) -> &str;

    /// Discover candidate trailer URLs for the given movie.
    async fn discover(&self, movie: &Movie) -> Result<Vec<DiscoveredTrailer>, DiscoveryError>;
}
