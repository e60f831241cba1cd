//! Archiving pipeline: ingestion, batch processing and metadata persistence.

pub mod batch;
pub mod ingest;
pub mod startup;
pub mod store;

pub use batch::{plan_destinations, BatchProcessor, BatchReport};
pub use ingest::{run_ingest, ChatFilter};
pub use startup::send_greetings;
pub use store::MetadataStore;
