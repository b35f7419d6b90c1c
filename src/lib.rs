pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::storage::LocalStorage;
pub use crate::core::{
    catalog::{AnchorListingParser, CatalogDiscoverer},
    cleaner::DatasetCleaner,
    etl::EtlEngine,
    export::SpreadsheetExporter,
    fetcher::DatasetFetcher,
    filter::{apply_filter, filter_options, FilterOptions},
    normalizer::normalize_number,
    pipeline::ProductionPipeline,
};
pub use domain::model::{Cell, CleanRecord, CleanTable, Column, FilterCriteria, RawDataset, YearEntry};
pub use utils::error::{EtlError, Result};
