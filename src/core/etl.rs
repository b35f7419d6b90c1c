use crate::core::Pipeline;
use crate::domain::model::CleanTable;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Extract and transform only; used to list filter options.
    pub async fn prepare(&self) -> Result<CleanTable> {
        tracing::info!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} bytes", raw_data.bytes.len());

        tracing::info!("Transforming data...");
        let table = self.pipeline.transform(raw_data).await?;
        tracing::info!("Transformed {} records", table.len());

        Ok(table)
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting ETL process...");

        let table = self.prepare().await?;

        tracing::info!("Loading data...");
        let output_path = self.pipeline.load(table).await?;
        tracing::info!(
            "📁 Output saved to: {} ({:?})",
            output_path,
            started.elapsed()
        );

        Ok(output_path)
    }
}
