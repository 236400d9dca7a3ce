//! Remote-table data engine
//!
//! A Rust async engine for interactive table views over remote paginated
//! APIs: it probes the dataset size, keeps small datasets fully resident and
//! large ones windowed behind an LRU cache, prefetches ahead of the user's
//! position, retries transient failures with backoff, and translates UI
//! filter/sort state into the backend query DSL.

pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod response;
pub mod transport;

mod table;

pub use config::TableConfig;
pub use table::*;
