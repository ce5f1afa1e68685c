// Resolver module - video id to playable stream catalog

pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod extractors;
pub mod mirrors;
pub mod models;
pub mod orchestrator;
pub mod race;
pub mod strategies;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, TtlCache};
pub use catalog::FormatCatalogBuilder;
pub use config::ResolverConfig;
pub use errors::ResolveError;
pub use models::{FormatCatalog, FormatDescriptor, Resolution, StreamInfo, VideoId};
pub use orchestrator::{Collaborators, StreamResolver};
pub use race::{EndpointRaceCoordinator, RaceOutcome};
