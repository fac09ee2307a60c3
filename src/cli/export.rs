use std::path::PathBuf;

use crate::api::AtencionApi;
use crate::cli::list::fetch_visible;
use crate::error::Result;
use crate::filter::FilterSet;
use crate::range::DateRange;

/// Fetch, filter and write the spreadsheet. Returns the written path.
pub fn run(
    api: &dyn AtencionApi,
    range: &DateRange,
    filters: &FilterSet,
    dir: PathBuf,
) -> Result<PathBuf> {
    let visible = fetch_visible(api, range, filters)?;
    let path = crate::export::export(&visible, range, &dir)?;
    println!("Wrote {} ({} registros)", path.display(), visible.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::error::AtencionesError;
    use crate::models::{Column, Scalar, VisitRecord};
    use chrono::NaiveDate;

    #[test]
    fn writes_filtered_rows() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::returning(vec![
            VisitRecord {
                patient_name: Some(Scalar::from("Ana")),
                ..Default::default()
            },
            VisitRecord {
                patient_name: Some(Scalar::from("Luis")),
                ..Default::default()
            },
        ]);
        let mut filters = FilterSet::new();
        filters.set(Column::PatientName, "ana");
        let day = NaiveDate::from_ymd_opt(2024, 6, 1);
        let range = DateRange::new(day, day);
        let path = run(&api, &range, &filters, dir.path().to_path_buf()).unwrap();
        assert!(path.ends_with("atenciones_20240601_a_20240601.xlsx"));
        assert!(path.exists());
    }

    #[test]
    fn partial_range_is_rejected_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::returning(vec![]);
        let range = DateRange::new(None, NaiveDate::from_ymd_opt(2024, 6, 1));
        let err = run(&api, &range, &FilterSet::new(), dir.path().to_path_buf()).unwrap_err();
        assert!(matches!(err, AtencionesError::InvalidRange));
        assert_eq!(api.list_count(), 0);
    }
}
