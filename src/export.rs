use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use tracing::info;

use crate::error::{AtencionesError, Result};
use crate::models::{Column, Scalar, VisitRecord};
use crate::range::{export_file_name, DateRange};

pub const SHEET_NAME: &str = "Atenciones";

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
    Empty,
}

impl ExportCell {
    fn from_scalar(value: Option<&Scalar>) -> Self {
        match value {
            None => ExportCell::Empty,
            Some(Scalar::Number(n)) => match n.as_f64() {
                Some(f) => ExportCell::Number(f),
                None => ExportCell::Text(n.to_string()),
            },
            Some(other) => ExportCell::Text(other.to_string()),
        }
    }
}

/// Header row followed by one row per record. The timestamp column becomes
/// `YYYY-MM-DD` in `tz`; every other field is passed through.
pub fn build_grid<Tz: TimeZone>(records: &[VisitRecord], tz: &Tz) -> Vec<Vec<ExportCell>> {
    let header = Column::ALL
        .iter()
        .map(|c| ExportCell::Text(c.label().to_string()))
        .collect();
    let mut grid = vec![header];
    for record in records {
        let row = Column::ALL
            .iter()
            .map(|&col| match col {
                Column::VisitTimestamp if record.visit_timestamp.is_some() => {
                    ExportCell::Text(record.visit_date_in(tz))
                }
                _ => ExportCell::from_scalar(record.value(col)),
            })
            .collect();
        grid.push(row);
    }
    grid
}

/// Write `grid` as a single-sheet workbook at `path`.
pub fn write_xlsx(grid: &[Vec<ExportCell>], path: &Path) -> Result<()> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(SHEET_NAME)
        .map_err(|e| AtencionesError::Xlsx(e.to_string()))?;
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            // umya coordinates are 1-based (column, row)
            let coord = (c as u32 + 1, r as u32 + 1);
            match cell {
                ExportCell::Text(s) => {
                    sheet.get_cell_mut(coord).set_value_string(s.clone());
                }
                ExportCell::Number(n) => {
                    sheet.get_cell_mut(coord).set_value_number(*n);
                }
                ExportCell::Empty => {}
            }
        }
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| AtencionesError::Xlsx(e.to_string()))?;
    Ok(())
}

/// Export the visible records for `range` into `dir`. Returns the written path.
pub fn export(records: &[VisitRecord], range: &DateRange, dir: &Path) -> Result<PathBuf> {
    let (start, end) = range.bounds().ok_or(AtencionesError::InvalidRange)?;
    let path = dir.join(export_file_name(start, end));
    let grid = build_grid(records, &Local);
    write_xlsx(&grid, &path)?;
    info!(path = %path.display(), rows = records.len(), "exported visits");
    Ok(path)
}
