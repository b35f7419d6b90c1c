pub mod catalog;
pub mod cleaner;
pub mod etl;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;

pub use crate::domain::model::{CleanTable, FilterCriteria, RawDataset, YearEntry};
pub use crate::domain::ports::{ConfigProvider, ListingParser, Pipeline, Storage};
pub use crate::utils::error::Result;
