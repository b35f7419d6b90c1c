use crate::domain::model::{CleanTable, MissingNumeric, RawDataset, YearEntry};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn listing_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn min_year(&self) -> i32;
    fn link_keywords(&self) -> &[String];

    fn delimiter(&self) -> u8;
    fn fallback_encoding(&self) -> &'static encoding_rs::Encoding;
    fn missing_numeric(&self) -> MissingNumeric;
    fn derived_metrics(&self) -> bool;

    fn output_path(&self) -> &str;
    /// File name for the exported spreadsheet of a given year label.
    fn output_filename(&self, label: &str) -> String;
    fn sheet_name(&self) -> &str;
    fn column_width(&self) -> f64;
}

/// Turns listing page markup into year entries. Kept apart from the HTTP
/// layer so the extraction rule can change with the portal's layout.
pub trait ListingParser: Send + Sync {
    fn parse_listing(&self, html: &str, base_url: &Url) -> Result<Vec<YearEntry>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawDataset>;
    async fn transform(&self, data: RawDataset) -> Result<CleanTable>;
    async fn load(&self, table: CleanTable) -> Result<String>;
}
