mod api;
mod collection;
mod config;
mod fetch;
pub mod layout;
pub mod parse;
pub mod probe;
mod repository;
mod sink;
mod snapshot;
mod stats;
mod walker;

pub use api::{CdmApi, Format, HttpApi};
pub use collection::{listing_starts, scrape_collection};
pub use config::{OnError, ScraperConfig, SnapshotMode, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_START};
pub use fetch::Fetcher;
pub use repository::{repository_aliases, scrape_collections, scrape_repository};
pub use sink::{FsSink, Sink};
pub use snapshot::{ArtifactCache, Snapshot};
pub use stats::{Outcome, ScrapeStats};
pub use walker::TreeWalker;

pub use anyhow;
