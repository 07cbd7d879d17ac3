//! Data models for the count census.
//!
//! This module contains the core data structures used throughout
//! the application for representing query results, derived totals,
//! and category orderings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entrez database a count query is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// GEO DataSets
    Gds,
    /// Sequence Read Archive
    Sra,
}

impl Database {
    /// Returns the `db` parameter value understood by E-utilities.
    pub fn as_str(&self) -> &'static str {
        match self {
            Database::Gds => "gds",
            Database::Sra => "sra",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single (year, category) match count returned by one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    /// Publication year the query was restricted to.
    pub year: i32,
    /// Category label (not the raw query term).
    pub category: String,
    /// Number of matching entries.
    pub count: u64,
}

impl CountRecord {
    pub fn new(year: i32, category: impl Into<String>, count: u64) -> Self {
        Self {
            year,
            category: category.into(),
            count,
        }
    }
}

/// Append-only table of count records, kept in query issue order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    records: Vec<CountRecord>,
}

impl ResultTable {
    /// Append a record at the end of the table.
    pub fn push(&mut self, record: CountRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CountRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of `count` over every record.
    #[cfg(test)]
    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }
}

impl FromIterator<CountRecord> for ResultTable {
    fn from_iter<I: IntoIterator<Item = CountRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Summed count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_count: u64,
}

/// Categories ranked by descending total count.
///
/// Ties are broken lexicographically on the category label, so the
/// order depends only on the multiset of records, not on row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOrder(Vec<String>);

impl CategoryOrder {
    /// Rank a set of totals. Input order does not matter.
    pub fn from_totals(totals: &[CategoryTotal]) -> Self {
        let mut ranked: Vec<&CategoryTotal> = totals.iter().collect();
        ranked.sort_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a.category.cmp(&b.category))
        });
        Self(ranked.into_iter().map(|t| t.category.clone()).collect())
    }

    /// Zero-based position of a category, if present.
    pub fn rank_of(&self, category: &str) -> Option<usize> {
        self.0.iter().position(|c| c == category)
    }

    #[cfg(test)]
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// A count record annotated with its category's rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub rank: usize,
    pub record: CountRecord,
}

/// Per-year, per-category summed count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCategorySum {
    pub year: i32,
    pub category: String,
    pub total_count: u64,
}

/// One row of the SRA library census.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub year: i32,
    /// Organism name as used in the `[ORGN]` filter.
    pub species: String,
    /// Library source, e.g. `transcriptomic` or `genomic`.
    pub source: String,
    pub lib_count: u64,
}

/// SRA census rows in query issue order (year, then species, then source).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryTable {
    records: Vec<LibraryRecord>,
}

impl LibraryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: LibraryRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[LibraryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct species in first-appearance order.
    pub fn species(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.species.as_str()))
    }

    /// Distinct sources in first-appearance order.
    pub fn sources(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.source.as_str()))
    }
}

impl FromIterator<LibraryRecord> for LibraryTable {
    fn from_iter<I: IntoIterator<Item = LibraryRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// A query that could not be answered during collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFailure {
    /// The Entrez filter expression that was submitted.
    pub expression: String,
    pub year: i32,
    /// Rendered error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(category: &str, total_count: u64) -> CategoryTotal {
        CategoryTotal {
            category: category.to_string(),
            total_count,
        }
    }

    #[test]
    fn test_database_names() {
        assert_eq!(Database::Gds.as_str(), "gds");
        assert_eq!(Database::Sra.to_string(), "sra");
    }

    #[test]
    fn test_order_descending_by_total() {
        let order = CategoryOrder::from_totals(&[total("a", 1), total("b", 9), total("c", 4)]);
        assert_eq!(order.labels(), &["b", "c", "a"]);
    }

    #[test]
    fn test_order_ties_are_lexicographic() {
        let order = CategoryOrder::from_totals(&[total("sequencing", 12), total("microarray", 12)]);
        assert_eq!(order.labels(), &["microarray", "sequencing"]);
    }

    #[test]
    fn test_rank_of() {
        let order = CategoryOrder::from_totals(&[total("x", 3), total("y", 5)]);
        assert_eq!(order.rank_of("y"), Some(0));
        assert_eq!(order.rank_of("x"), Some(1));
        assert_eq!(order.rank_of("z"), None);
    }

    #[test]
    fn test_result_table_total() {
        let table: ResultTable = vec![
            CountRecord::new(2022, "a", 3),
            CountRecord::new(2023, "a", 4),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_count(), 7);
    }

    #[test]
    fn test_library_table_distinct_values() {
        let row = |species: &str, source: &str| LibraryRecord {
            year: 2020,
            species: species.to_string(),
            source: source.to_string(),
            lib_count: 1,
        };
        let table: LibraryTable = vec![
            row("Zea mays", "genomic"),
            row("Oryza sativa", "genomic"),
            row("Zea mays", "transcriptomic"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.species(), vec!["Zea mays", "Oryza sativa"]);
        assert_eq!(table.sources(), vec!["genomic", "transcriptomic"]);
    }
}
