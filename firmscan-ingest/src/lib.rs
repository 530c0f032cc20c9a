//! firmscan-ingest library interface
//!
//! Company-directory ingest: per-source fetch strategies, record
//! normalization and quality scoring, cross-source deduplication, and the
//! pipeline runner tying them together.

pub mod dedup;
pub mod error;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sources;

pub use crate::dedup::{DeduplicationEngine, DeduplicationResult};
pub use crate::error::FetchError;
pub use crate::models::{CompanyRecord, RawListing};
pub use crate::pipeline::{AutoScraper, PipelineRunner, ScrapeOptions};
pub use crate::sources::SourceRegistry;
