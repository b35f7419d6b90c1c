use crate::domain::model::{Cell, CleanTable};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use rust_xlsxwriter::{Format, Table, TableColumn, Workbook};

/// Writes a table as a one-sheet workbook: header row, Excel table over the
/// data, fixed column width, numbers as numbers and missing cells blank.
#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    sheet_name: String,
    column_width: f64,
}

impl Default for SpreadsheetExporter {
    fn default() -> Self {
        Self::new("Sheet1", 15.0)
    }
}

impl SpreadsheetExporter {
    pub fn new(sheet_name: impl Into<String>, column_width: f64) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            column_width,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.sheet_name(), config.column_width())
    }

    pub fn to_xlsx_bytes(&self, table: &CleanTable) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        let number_format = Format::new().set_num_format("#,##0.00");
        let last_col = u16::try_from(table.columns.len().saturating_sub(1)).unwrap_or(u16::MAX);

        for (row, record) in table.rows.iter().enumerate() {
            let r = u32::try_from(row + 1).unwrap_or(u32::MAX);
            for (col, cell) in record.cells.iter().enumerate() {
                let c = u16::try_from(col).unwrap_or(u16::MAX);
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number_with_format(r, c, *n, &number_format)?;
                    }
                    Cell::Missing => {}
                }
            }
        }

        if !table.columns.is_empty() && table.rows.is_empty() {
            let bold = Format::new().set_bold();
            for (col, column) in table.columns.iter().enumerate() {
                let c = u16::try_from(col).unwrap_or(u16::MAX);
                worksheet.write_string_with_format(0, c, &column.name, &bold)?;
            }
        } else if !table.columns.is_empty() {
            // The table writes the header row itself
            let columns: Vec<TableColumn> = table
                .columns
                .iter()
                .map(|c| TableColumn::new().set_header(&c.name))
                .collect();
            let excel_table = Table::new().set_columns(&columns);
            let last_row = u32::try_from(table.rows.len()).unwrap_or(u32::MAX);
            worksheet.add_table(0, 0, last_row, last_col, &excel_table)?;
        }

        for col in 0..table.columns.len() {
            let c = u16::try_from(col).unwrap_or(u16::MAX);
            worksheet.set_column_width(c, self.column_width)?;
        }

        let buffer = workbook.save_to_buffer()?;
        tracing::debug!("Workbook is {} bytes", buffer.len());
        Ok(buffer)
    }
}
