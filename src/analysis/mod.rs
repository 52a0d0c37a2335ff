//! Analysis modules.
//!
//! Code resolution, the per-question aggregation engine, catalog-wide
//! statistics and search predicates. Nothing in here performs I/O.

pub mod aggregator;
pub mod catalog;
pub mod filter;
pub mod resolver;

pub use aggregator::{aggregate_with, AggregateOptions};
pub use catalog::{code_catalog_summary, participant_summary};
pub use resolver::resolve;
