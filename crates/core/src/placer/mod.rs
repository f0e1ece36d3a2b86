//! Trailer placement.
//!
//! Moves a selected candidate's staged file to its final library path:
//! atomic rename on the same volume, copy-verify-replace across volumes.

mod config;
mod error;
mod fs_placer;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacementError;
pub use fs_placer::FsPlacer;
pub use traits::TrailerPlacer;
pub use types::{ChecksumType, PlacedTrailer};
