//! Movie catalog collaborator.
//!
//! The library manager owns the movie list; this module provides the trait
//! the pipeline consumes plus the HTTP client for a Radarr-style API and
//! the webhook event model.

mod http;
mod traits;
mod types;

pub use http::{CatalogConfig, HttpMovieCatalog};
pub use traits::MovieCatalog;
pub use types::{CatalogError, CatalogEvent, Movie};
