use crate::models::{Column, VisitRecord};

/// Per-column substring patterns. An empty pattern does not constrain its
/// column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    patterns: [String; 9],
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: Column) -> &str {
        &self.patterns[column.index()]
    }

    pub fn set(&mut self, column: Column, pattern: impl Into<String>) {
        self.patterns[column.index()] = pattern.into();
    }

    pub fn push_char(&mut self, column: Column, c: char) {
        self.patterns[column.index()].push(c);
    }

    pub fn pop_char(&mut self, column: Column) {
        self.patterns[column.index()].pop();
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.iter().all(String::is_empty)
    }

    /// Columns with a non-empty pattern, paired with the pattern.
    pub fn active(&self) -> impl Iterator<Item = (Column, &str)> {
        Column::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, p)| !p.is_empty())
    }

    /// Short human description, e.g. `nom_pac~ana, for_ate~yape`.
    pub fn describe(&self) -> String {
        self.active()
            .map(|(c, p)| format!("{}~{p}", c.key()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lower-cased view of a filter set, built once per recompute.
struct Matcher {
    needles: Vec<(Column, String)>,
}

impl Matcher {
    fn new(filters: &FilterSet) -> Self {
        Self {
            needles: filters
                .active()
                .map(|(c, p)| (c, p.to_lowercase()))
                .collect(),
        }
    }

    fn matches(&self, record: &VisitRecord) -> bool {
        self.needles
            .iter()
            .all(|(col, needle)| record.text(*col).to_lowercase().contains(needle.as_str()))
    }
}

/// Records passing every active pattern, in their original order.
pub fn apply(records: &[VisitRecord], filters: &FilterSet) -> Vec<VisitRecord> {
    if filters.is_empty() {
        return records.to_vec();
    }
    let matcher = Matcher::new(filters);
    records
        .iter()
        .filter(|r| matcher.matches(r))
        .cloned()
        .collect()
}
