//! Per-well reservoir engineering columns appended after cleaning.
//!
//! Rows are regrouped by well and ordered by reporting month, so the
//! cumulative and elapsed-time columns read top to bottom.

use crate::core::cleaner::{AGUA, ANO, GAS_ASSOCIADO, GAS_NAO_ASSOCIADO, MES, OLEO};
use crate::domain::model::{Cell, CleanRecord, CleanTable, Column, POCO};
use chrono::NaiveDate;

pub const TEMPO: &str = "tempo";
pub const NP: &str = "Np";
pub const RGO: &str = "RGO";
pub const RAO: &str = "RAO";
pub const LNQ: &str = "lnq";

struct Inputs {
    ano: usize,
    mes: usize,
    poco: usize,
    oleo: Option<usize>,
    gas_associado: Option<usize>,
    gas_nao_associado: Option<usize>,
    agua: Option<usize>,
}

pub fn append_derived_metrics(table: &mut CleanTable) {
    let (Some(ano), Some(mes), Some(poco)) = (
        table.column_index(ANO),
        table.column_index(MES),
        table.column_index(POCO),
    ) else {
        tracing::warn!("Derived metrics need {}, {} and {}; skipped", ANO, MES, POCO);
        return;
    };

    let inputs = Inputs {
        ano,
        mes,
        poco,
        oleo: table.column_index(OLEO),
        gas_associado: table.column_index(GAS_ASSOCIADO),
        gas_nao_associado: table.column_index(GAS_NAO_ASSOCIADO),
        agua: table.column_index(AGUA),
    };

    sort_by_well_and_date(table, &inputs);

    let mut current_well: Option<String> = None;
    let mut first_date: Option<NaiveDate> = None;
    let mut cumulative_oil = 0.0;

    for row in &mut table.rows {
        let well = text(row, inputs.poco).unwrap_or_default().to_string();
        let date = row_date(row, &inputs);

        if current_well.as_deref() != Some(well.as_str()) {
            current_well = Some(well);
            // 排序後每口井的第一個有效日期就是最早日期
            first_date = date;
            cumulative_oil = 0.0;
        }

        let oleo = number(row, inputs.oleo);
        let gas_total = match (
            number(row, inputs.gas_associado),
            number(row, inputs.gas_nao_associado),
        ) {
            (Some(a), Some(b)) => Some((a + b) * 1000.0),
            _ => None,
        };
        let agua = number(row, inputs.agua);

        cumulative_oil += oleo.unwrap_or(0.0);

        let tempo = match (date, first_date) {
            (Some(d), Some(first)) => Cell::Number((d - first).num_days() as f64),
            _ => Cell::Missing,
        };
        let lnq = match oleo {
            Some(q) if q > 0.0 => Cell::Number(q.ln()),
            _ => Cell::Missing,
        };

        row.cells.push(tempo);
        row.cells.push(Cell::Number(cumulative_oil));
        row.cells.push(Cell::Number(ratio(gas_total, oleo)));
        row.cells.push(Cell::Number(ratio(agua, oleo)));
        row.cells.push(lnq);
    }

    table.columns.extend([
        Column::numeric(TEMPO),
        Column::numeric(NP),
        Column::numeric(RGO),
        Column::numeric(RAO),
        Column::numeric(LNQ),
    ]);
}

/// Division where anything undefined (missing input, zero oil) becomes 0.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match (numerator, denominator) {
        (Some(n), Some(d)) => {
            let r = n / d;
            if r.is_finite() {
                r
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

fn sort_by_well_and_date(table: &mut CleanTable, inputs: &Inputs) {
    let rows = std::mem::take(&mut table.rows);
    let mut keyed: Vec<(String, Option<NaiveDate>, CleanRecord)> = rows
        .into_iter()
        .map(|row| {
            let well = text(&row, inputs.poco).unwrap_or_default().to_string();
            let date = row_date(&row, inputs);
            (well, date, row)
        })
        .collect();

    // 無效日期排在該井最後
    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.is_none().cmp(&b.1.is_none()))
            .then_with(|| a.1.cmp(&b.1))
    });

    table.rows = keyed.into_iter().map(|(_, _, row)| row).collect();
}

fn row_date(row: &CleanRecord, inputs: &Inputs) -> Option<NaiveDate> {
    let year: i32 = text(row, inputs.ano)?.trim().parse().ok()?;
    let month: u32 = text(row, inputs.mes)?.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn text(row: &CleanRecord, idx: usize) -> Option<&str> {
    row.cells.get(idx).and_then(Cell::as_str)
}

fn number(row: &CleanRecord, idx: Option<usize>) -> Option<f64> {
    row.cells.get(idx?).and_then(Cell::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, &str, Option<f64>, Option<f64>, Option<f64>, Option<f64>)]) -> CleanTable {
        let mut t = CleanTable::new(vec![
            Column::text(ANO),
            Column::text(MES),
            Column::text(POCO),
            Column::numeric(OLEO),
            Column::numeric(GAS_ASSOCIADO),
            Column::numeric(GAS_NAO_ASSOCIADO),
            Column::numeric(AGUA),
        ]);
        for (ano, mes, poco, oleo, ga, gn, agua) in rows {
            let num = |v: &Option<f64>| v.map(Cell::Number).unwrap_or(Cell::Missing);
            t.rows.push(CleanRecord {
                cells: vec![
                    Cell::Text(ano.to_string()),
                    Cell::Text(mes.to_string()),
                    Cell::Text(poco.to_string()),
                    num(oleo),
                    num(ga),
                    num(gn),
                    num(agua),
                ],
            });
        }
        t
    }

    fn col(t: &CleanTable, name: &str) -> Vec<Cell> {
        (0..t.len()).map(|i| t.cell(i, name).cloned().unwrap()).collect()
    }

    #[test]
    fn test_rows_sorted_by_well_then_date() {
        let mut t = table(&[
            ("2023", "3", "B", Some(1.0), Some(0.0), Some(0.0), Some(0.0)),
            ("2023", "1", "B", Some(1.0), Some(0.0), Some(0.0), Some(0.0)),
            ("2023", "2", "A", Some(1.0), Some(0.0), Some(0.0), Some(0.0)),
        ]);
        append_derived_metrics(&mut t);

        let wells: Vec<_> = col(&t, POCO).into_iter().map(|c| c.as_str().unwrap().to_string()).collect();
        let months: Vec<_> = col(&t, MES).into_iter().map(|c| c.as_str().unwrap().to_string()).collect();
        assert_eq!(wells, vec!["A", "B", "B"]);
        assert_eq!(months, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_tempo_and_cumulative_oil_per_well() {
        let mut t = table(&[
            ("2023", "1", "P1", Some(100.0), Some(1.0), Some(0.5), Some(50.0)),
            ("2023", "2", "P1", Some(200.0), Some(2.0), Some(0.0), Some(20.0)),
            ("2023", "1", "P2", Some(10.0), Some(0.0), Some(0.0), Some(0.0)),
        ]);
        append_derived_metrics(&mut t);

        assert_eq!(
            col(&t, TEMPO),
            vec![Cell::Number(0.0), Cell::Number(31.0), Cell::Number(0.0)]
        );
        assert_eq!(
            col(&t, NP),
            vec![Cell::Number(100.0), Cell::Number(300.0), Cell::Number(10.0)]
        );
        assert_eq!(
            col(&t, RGO),
            vec![Cell::Number(15.0), Cell::Number(10.0), Cell::Number(0.0)]
        );
        assert_eq!(
            col(&t, RAO),
            vec![Cell::Number(0.5), Cell::Number(0.1), Cell::Number(0.0)]
        );
        assert_eq!(t.cell(0, LNQ), Some(&Cell::Number(100.0f64.ln())));
    }

    #[test]
    fn test_zero_or_missing_oil() {
        let mut t = table(&[
            ("2023", "1", "P1", Some(0.0), Some(1.0), Some(1.0), Some(5.0)),
            ("2023", "2", "P1", None, Some(1.0), Some(1.0), Some(5.0)),
        ]);
        append_derived_metrics(&mut t);

        assert_eq!(col(&t, RGO), vec![Cell::Number(0.0), Cell::Number(0.0)]);
        assert_eq!(col(&t, RAO), vec![Cell::Number(0.0), Cell::Number(0.0)]);
        assert_eq!(col(&t, LNQ), vec![Cell::Missing, Cell::Missing]);
        assert_eq!(col(&t, NP), vec![Cell::Number(0.0), Cell::Number(0.0)]);
    }

    #[test]
    fn test_invalid_date_sorts_last_without_tempo() {
        let mut t = table(&[
            ("2023", "13", "P1", Some(1.0), None, None, None),
            ("2023", "5", "P1", Some(1.0), None, None, None),
        ]);
        append_derived_metrics(&mut t);

        assert_eq!(t.cell(0, MES), Some(&Cell::Text("5".to_string())));
        assert_eq!(col(&t, TEMPO), vec![Cell::Number(0.0), Cell::Missing]);
    }
}
