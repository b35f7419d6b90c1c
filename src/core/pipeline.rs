use crate::core::cleaner::DatasetCleaner;
use crate::core::export::SpreadsheetExporter;
use crate::core::fetcher::DatasetFetcher;
use crate::core::filter::apply_filter;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{CleanTable, FilterCriteria, RawDataset, YearEntry};
use crate::utils::error::Result;

/// Fetch → clean → filter → export for one selected year.
pub struct ProductionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    entry: YearEntry,
    criteria: FilterCriteria,
    fetcher: DatasetFetcher,
    cleaner: DatasetCleaner,
    exporter: SpreadsheetExporter,
}

impl<S: Storage, C: ConfigProvider> ProductionPipeline<S, C> {
    pub fn new(storage: S, config: C, entry: YearEntry, criteria: FilterCriteria) -> Result<Self> {
        let fetcher = DatasetFetcher::from_config(&config)?;
        let cleaner = DatasetCleaner::from_config(&config);
        let exporter = SpreadsheetExporter::from_config(&config);

        Ok(Self {
            storage,
            config,
            entry,
            criteria,
            fetcher,
            cleaner,
            exporter,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ProductionPipeline<S, C> {
    async fn extract(&self) -> Result<RawDataset> {
        self.fetcher.fetch(&self.entry).await
    }

    async fn transform(&self, data: RawDataset) -> Result<CleanTable> {
        tracing::debug!(
            "Parsing {} bytes as {} with delimiter {:?}",
            data.bytes.len(),
            data.encoding_name(),
            self.config.delimiter() as char
        );
        self.cleaner.clean(&data)
    }

    async fn load(&self, table: CleanTable) -> Result<String> {
        let filtered = apply_filter(&table, &self.criteria);
        if filtered.is_empty() {
            tracing::warn!("⚠️  No rows match {:?}, exporting header only", self.criteria);
        } else {
            tracing::info!(
                "🔍 {} of {} rows match the filters",
                filtered.len(),
                table.len()
            );
        }

        let filename = self.config.output_filename(&self.entry.label);
        let output_path = format!("{}/{}", self.config.output_path(), filename);

        let bytes = self.exporter.to_xlsx_bytes(&filtered)?;
        tracing::debug!("Writing workbook ({} bytes) to storage", bytes.len());
        self.storage.write_file(&filename, &bytes).await?;

        Ok(output_path)
    }
}
