//! Mock discovery provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::Movie;
use crate::discovery::{DiscoveredTrailer, DiscoveryError, DiscoveryProvider};

/// Mock implementation of the DiscoveryProvider trait.
///
/// Returns configured trailers per movie id, records calls, and can be put
/// into a permanently-failing state to exercise the Skipped path.
pub struct MockDiscoveryProvider {
    trailers: Arc<RwLock<HashMap<i64, Vec<DiscoveredTrailer>>>>,
    discover_calls: Arc<RwLock<Vec<i64>>>,
    fail_always: Arc<RwLock<bool>>,
}

impl Default for MockDiscoveryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDiscoveryProvider {
    pub fn new() -> Self {
        Self {
            trailers: Arc::new(RwLock::new(HashMap::new())),
            discover_calls: Arc::new(RwLock::new(Vec::new())),
            fail_always: Arc::new(RwLock::new(false)),
        }
    }

    /// Set the trailers returned for a movie.
    pub async fn set_trailers(&self, movie_id: i64, trailers: Vec<DiscoveredTrailer>) {
        self.trailers.write().await.insert(movie_id, trailers);
    }

    /// Make every discover call fail.
    pub async fn set_fail_always(&self, fail: bool) {
        *self.fail_always.write().await = fail;
    }

    /// Movie ids discover was called with, in order.
    pub async fn discover_calls(&self) -> Vec<i64> {
        self.discover_calls.read().await.clone()
    }
}

#[async_trait]
impl DiscoveryProvider for MockDiscoveryProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn discover(&self, movie: &Movie) -> Result<Vec<DiscoveredTrailer>, DiscoveryError> {
        self.discover_calls.write().await.push(movie.id);

        if *self.fail_always.read().await {
            return Err(DiscoveryError::ConnectionFailed(
                "mock provider down".to_string(),
            ));
        }

        Ok(self
            .trailers
            .read()
            .await
            .get(&movie.id)
            .cloned()
            .unwrap_or_default())
    }
}
