use crate::core::metrics;
use crate::core::normalizer::normalize_cell;
use crate::domain::model::{
    Cell, CleanRecord, CleanTable, Column, ColumnKind, MissingNumeric, RawDataset, RawRecord,
    CAMPO, POCO,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub const ANO: &str = "Ano";
pub const MES: &str = "Mês";

pub const OLEO: &str = "Produção de Óleo (m³)";
pub const GAS_ASSOCIADO: &str = "Produção de Gás Associado (Mm³)";
pub const GAS_NAO_ASSOCIADO: &str = "Produção de Gás Não Associado (Mm³)";
pub const AGUA: &str = "Produção de Água (m³)";

/// Filtering and derived metrics depend on these exact names.
pub const REQUIRED_COLUMNS: [&str; 4] = [ANO, MES, CAMPO, POCO];

pub const DROPPED_COLUMNS: [&str; 7] = [
    "Bacia",
    "Instalação",
    "Estado",
    "Ambiente",
    "Produção de Condensado (m³)",
    "Injeção de Polímeros (m³)",
    "Injeção de Outros Fluidos (m³)",
];

pub const NUMERIC_COLUMNS: [&str; 10] = [
    OLEO,
    GAS_ASSOCIADO,
    GAS_NAO_ASSOCIADO,
    AGUA,
    "Injeção de Gás (Mm³)",
    "Injeção de Água para Recuperação Secundária (m³)",
    "Injeção de Água para Descarte (m³)",
    "Injeção de Gás Carbônico (Mm³)",
    "Injeção de Nitrogênio (Mm³)",
    "Injeção de Vapor de Água (t)",
];

#[derive(Debug, Clone)]
pub struct DatasetCleaner {
    delimiter: u8,
    missing_numeric: MissingNumeric,
    derived_metrics: bool,
}

/// Header plus the rows that had the header's field count.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    pub skipped: usize,
}

impl DatasetCleaner {
    pub fn new(delimiter: u8, missing_numeric: MissingNumeric, derived_metrics: bool) -> Self {
        Self {
            delimiter,
            missing_numeric,
            derived_metrics,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(
            config.delimiter(),
            config.missing_numeric(),
            config.derived_metrics(),
        )
    }

    pub fn clean(&self, dataset: &RawDataset) -> Result<CleanTable> {
        // decode 會依 BOM 自動修正編碼
        let (text, used, had_errors) = dataset.encoding.decode(&dataset.bytes);
        if had_errors {
            tracing::warn!(
                "Some bytes of {} were not valid {}, replaced with U+FFFD",
                dataset.source_url,
                used.name()
            );
        }

        let raw = self.read_raw(&text)?;
        self.clean_raw(raw)
    }

    pub fn read_raw(&self, text: &str) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();

        let mut records = Vec::new();
        let mut skipped = 0;
        for result in reader.records() {
            let record = result?;
            if record.len() != headers.len() {
                skipped += 1;
                tracing::debug!(
                    "Skipping line {}: {} fields, expected {}",
                    record.position().map(|p| p.line()).unwrap_or(0),
                    record.len(),
                    headers.len()
                );
                continue;
            }
            records.push(RawRecord {
                fields: record.iter().map(str::to_string).collect(),
            });
        }

        if skipped > 0 {
            tracing::warn!("⚠️  Skipped {} malformed lines", skipped);
        }

        Ok(RawTable {
            headers,
            records,
            skipped,
        })
    }

    pub fn clean_raw(&self, raw: RawTable) -> Result<CleanTable> {
        let present: HashSet<&str> = raw.headers.iter().map(String::as_str).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !present.contains(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EtlError::SchemaError { missing });
        }

        // (source index, column) for every column that survives
        let kept: Vec<(usize, Column)> = raw
            .headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !DROPPED_COLUMNS.contains(&name.as_str()))
            .map(|(idx, name)| {
                let column = if NUMERIC_COLUMNS.contains(&name.as_str()) {
                    Column::numeric(name.clone())
                } else {
                    Column::text(name.clone())
                };
                (idx, column)
            })
            .collect();

        let mut table = CleanTable::new(kept.iter().map(|(_, c)| c.clone()).collect());
        let mut format_errors = 0usize;

        for record in raw.records {
            let cells = kept
                .iter()
                .map(|(idx, column)| {
                    let raw_value = record.fields[*idx].as_str();
                    match column.kind {
                        ColumnKind::Numeric => {
                            let (cell, err) = normalize_cell(raw_value, self.missing_numeric);
                            if let Some(e) = err {
                                format_errors += 1;
                                tracing::debug!("{}: {}", column.name, e);
                            }
                            cell
                        }
                        ColumnKind::Text if raw_value.is_empty() => Cell::Missing,
                        ColumnKind::Text => Cell::Text(raw_value.to_string()),
                    }
                })
                .collect();
            table.rows.push(CleanRecord { cells });
        }

        if format_errors > 0 {
            tracing::warn!(
                "⚠️  {} numeric cells could not be parsed and were set to {:?}",
                format_errors,
                self.missing_numeric
            );
        }

        if self.derived_metrics {
            metrics::append_derived_metrics(&mut table);
        }

        tracing::info!(
            "🧹 Cleaned {} rows x {} columns",
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }
}

/// "[Campo]" -> "Campo"
pub fn clean_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .replace(['[', ']'], "")
        .trim()
        .to_string()
}
