use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::api::AtencionApi;
use crate::error::Result;
use crate::filter::{self, FilterSet};
use crate::fmt::{number, soles};
use crate::models::{Column, VisitRecord};
use crate::range::DateRange;

/// Fetch the range and return the visible (filtered) records.
pub fn fetch_visible(
    api: &dyn AtencionApi,
    range: &DateRange,
    filters: &FilterSet,
) -> Result<Vec<VisitRecord>> {
    let query = range.query()?;
    let records = api.list(&query)?;
    Ok(filter::apply(&records, filters))
}

pub fn render_table(records: &[VisitRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(Column::ALL.iter().map(|c| c.label()));
    for rec in records {
        let cells = Column::ALL.iter().map(|&col| {
            let text = match col {
                Column::VisitTimestamp => rec.visit_date(),
                _ => rec.text(col),
            };
            let cell = Cell::new(text);
            if col == Column::Amount {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            }
        });
        table.add_row(cells);
    }
    table
}

pub fn run(api: &dyn AtencionApi, range: &DateRange, filters: &FilterSet) -> Result<()> {
    let visible = fetch_visible(api, range, filters)?;
    if visible.is_empty() {
        println!("No se encontraron atenciones para esta fecha.");
        return Ok(());
    }
    let total: f64 = visible.iter().map(VisitRecord::amount_value).sum();
    println!("{}\n{}", "Atenciones".bold(), render_table(&visible));
    println!(
        "{} {}   {} {}",
        "Totales:".bold(),
        soles(total).green(),
        "Registros:".bold(),
        number(visible.len())
    );
    if !filters.is_empty() {
        println!("{}", format!("Filtros: {}", filters.describe()).dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::error::AtencionesError;
    use crate::models::Scalar;

    fn rec(name: &str, amount: &str) -> VisitRecord {
        VisitRecord {
            patient_name: Some(Scalar::from(name)),
            amount: Some(Scalar::from(amount)),
            ..Default::default()
        }
    }

    #[test]
    fn fetch_visible_applies_filters() {
        let api = FakeApi::returning(vec![rec("Ana", "10"), rec("Luis", "5")]);
        let mut filters = FilterSet::new();
        filters.set(Column::PatientName, "lu");
        let visible = fetch_visible(&api, &DateRange::today(), &filters).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(api.list_count(), 1);
    }

    #[test]
    fn incomplete_range_skips_backend() {
        let api = FakeApi::returning(vec![]);
        let err = fetch_visible(&api, &DateRange::default(), &FilterSet::new()).unwrap_err();
        assert!(matches!(err, AtencionesError::InvalidRange));
        assert_eq!(api.list_count(), 0);
    }

    #[test]
    fn table_has_header_and_rows() {
        let table = render_table(&[rec("Ana", "10")]);
        let rendered = table.to_string();
        assert!(rendered.contains("Paciente"));
        assert!(rendered.contains("Ana"));
        assert_eq!(table.row_count(), 1);
    }
}
