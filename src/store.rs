use crate::filter::{self, FilterSet};
use crate::models::VisitRecord;

/// Fetched records plus the subset that passes the current filters.
#[derive(Debug, Default)]
pub struct RecordStore {
    all: Vec<VisitRecord>,
    visible: Vec<VisitRecord>,
}

impl RecordStore {
    /// Replace the full set and recompute the visible subset against `filters`.
    pub fn replace(&mut self, records: Vec<VisitRecord>, filters: &FilterSet) {
        self.all = records;
        self.recompute(filters);
    }

    /// Must be called after every filter change.
    pub fn recompute(&mut self, filters: &FilterSet) {
        self.visible = filter::apply(&self.all, filters);
    }

    pub fn all(&self) -> &[VisitRecord] {
        &self.all
    }

    pub fn visible(&self) -> &[VisitRecord] {
        &self.visible
    }

    /// Sum of coerced amounts over the visible subset.
    pub fn visible_total(&self) -> f64 {
        self.visible.iter().map(VisitRecord::amount_value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt::two_decimals;
    use crate::models::{Column, Scalar};

    fn with_amount(amount: &str) -> VisitRecord {
        VisitRecord {
            amount: Some(Scalar::from(amount)),
            ..Default::default()
        }
    }

    #[test]
    fn totals_skip_non_numeric_amounts() {
        let mut store = RecordStore::default();
        store.replace(
            vec![with_amount("100.5"), with_amount("abc"), with_amount("50")],
            &FilterSet::new(),
        );
        assert_eq!(store.visible().len(), 3);
        assert_eq!(two_decimals(store.visible_total()), "150.50");
    }

    #[test]
    fn filters_apply_on_replace_and_recompute() {
        let mut store = RecordStore::default();
        let mut filters = FilterSet::new();
        filters.set(Column::Amount, "5");
        store.replace(
            vec![with_amount("100.5"), with_amount("abc"), with_amount("50")],
            &filters,
        );
        assert_eq!(store.all().len(), 3);
        assert_eq!(store.visible().len(), 2);
        assert_eq!(two_decimals(store.visible_total()), "150.50");

        filters.set(Column::Amount, "");
        store.recompute(&filters);
        assert_eq!(store.visible().len(), 3);
    }

    #[test]
    fn empty_store_totals_zero() {
        let store = RecordStore::default();
        assert!(store.visible().is_empty());
        assert_eq!(two_decimals(store.visible_total()), "0.00");
    }
}
