use std::sync::Arc;

use trailhound_core::{
    Authenticator, Config, SanitizedConfig, TrailerPipeline, TrailerStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn TrailerStore>,
    pipeline: Arc<TrailerPipeline>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn TrailerStore>,
        pipeline: Arc<TrailerPipeline>,
    ) -> Self {
        Self {
            config,
            authenticator,
            store,
            pipeline,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn store(&self) -> &dyn TrailerStore {
        self.store.as_ref()
    }

    pub fn pipeline(&self) -> &Arc<TrailerPipeline> {
        &self.pipeline
    }
}
