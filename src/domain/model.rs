use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One downloadable yearly file found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEntry {
    pub year: i32,
    /// Set for historical range links such as "1941-1979".
    pub end_year: Option<i32>,
    pub label: String,
    pub source_url: String,
}

impl YearEntry {
    pub fn covers(&self, year: i32) -> bool {
        match self.end_year {
            Some(end) => (self.year..=end).contains(&year),
            None => self.year == year,
        }
    }
}

/// Bytes of a downloaded CSV together with the encoding they were declared in.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub source_url: String,
    pub bytes: Vec<u8>,
    pub encoding: &'static encoding_rs::Encoding,
}

impl RawDataset {
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// A CSV row exactly as read, header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub cells: Vec<Cell>,
}

/// Cleaned rows sharing one column list; `cells[i]` belongs to `columns[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CleanTable {
    pub columns: Vec<Column>,
    pub rows: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.cells.get(idx)
    }

    /// Sorted unique non-empty text values of a column.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.column_index(column) else {
            return Vec::new();
        };

        self.rows
            .iter()
            .filter_map(|r| r.cells.get(idx).and_then(Cell::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// What a numeric cell becomes when its text cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingNumeric {
    #[default]
    Null,
    Zero,
}

impl MissingNumeric {
    pub fn fill(self) -> Cell {
        match self {
            MissingNumeric::Null => Cell::Missing,
            MissingNumeric::Zero => Cell::Number(0.0),
        }
    }
}

/// Field names the user can filter on.
pub const CAMPO: &str = "Campo";
pub const POCO: &str = "Poço";

/// Equality filters on Campo and Poço. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub campo: Option<String>,
    pub poco: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_campo(mut self, campo: impl Into<String>) -> Self {
        self.campo = Some(campo.into());
        self
    }

    pub fn with_poco(mut self, poco: impl Into<String>) -> Self {
        self.poco = Some(poco.into());
        self
    }

    /// (field name, selected value) for every set field.
    pub fn active(&self) -> Vec<(&'static str, &str)> {
        let mut active = Vec::with_capacity(2);
        if let Some(campo) = &self.campo {
            active.push((CAMPO, campo.as_str()));
        }
        if let Some(poco) = &self.poco {
            active.push((POCO, poco.as_str()));
        }
        active
    }

    pub fn is_empty(&self) -> bool {
        self.campo.is_none() && self.poco.is_none()
    }
}
