//! Data layer for the deposit/lending dashboard.
//!
//! Reads the per-bank CSV rows, aggregates them into period summaries and
//! derives the growth, comparison, bank-wise and CD ratio tables the pages
//! render.

pub mod aggregator;
pub mod analysis;
pub mod bankwise;
pub mod cd_ratio;
pub mod comparison;
pub mod growth;
pub mod reader;
pub mod search;

#[cfg(test)]
mod test_support;

pub use aggregator::{load_and_aggregate, AggregatedDataset, GroupingPolicy};
pub use analysis::{load_dataset, Dataset, DatasetMetadata};
pub use dl_core as core;
pub use growth::{growth_series, percent_growth_series, BaselinePolicy};
pub use search::search;
