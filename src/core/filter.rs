use crate::domain::model::{Cell, CleanTable, FilterCriteria, CAMPO, POCO};

/// Keeps the rows whose set fields equal the selected values exactly.
pub fn apply_filter(table: &CleanTable, criteria: &FilterCriteria) -> CleanTable {
    let active = criteria.active();
    if active.is_empty() {
        return table.clone();
    }

    // 欄位不存在時任何列都不符合
    let checks: Option<Vec<(usize, &str)>> = active
        .iter()
        .map(|(field, value)| table.column_index(field).map(|idx| (idx, *value)))
        .collect();

    let rows = match checks {
        Some(checks) => table
            .rows
            .iter()
            .filter(|row| {
                checks.iter().all(|(idx, value)| {
                    matches!(row.cells.get(*idx), Some(Cell::Text(s)) if s == value)
                })
            })
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    tracing::debug!(
        "Filter {:?} kept {} of {} rows",
        criteria,
        rows.len(),
        table.len()
    );

    CleanTable {
        columns: table.columns.clone(),
        rows,
    }
}

/// Choices offered for each filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub campos: Vec<String>,
    /// Wells of the selected Campo, or of every Campo when none is selected.
    pub pocos: Vec<String>,
}

pub fn filter_options(table: &CleanTable, campo: Option<&str>) -> FilterOptions {
    let campos = table.distinct_values(CAMPO);
    let pocos = match campo {
        Some(campo) => {
            apply_filter(table, &FilterCriteria::new().with_campo(campo)).distinct_values(POCO)
        }
        None => table.distinct_values(POCO),
    };
    FilterOptions { campos, pocos }
}
