//! Trait definitions for the placement module.

use async_trait::async_trait;

use crate::catalog::Movie;
use crate::store::TrailerCandidate;

use super::error::PlacementError;
use super::types::PlacedTrailer;

/// Moves a selected candidate's staged file to its final library path.
#[async_trait]
pub trait TrailerPlacer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Compute the final path and move the staged file there.
    ///
    /// On failure the staging file must remain intact and nothing partial
    /// may be visible at the final path.
    async fn place(
        &self,
        movie: &Movie,
        candidate: &TrailerCandidate,
    ) -> Result<PlacedTrailer, PlacementError>;
}
