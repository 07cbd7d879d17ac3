//! Count aggregation and category ranking.
//!
//! This module turns a flat table of per-year query results into
//! category totals, a rank order of categories, and per-year summaries
//! that charts can render in rank order.

use crate::models::{
    CategoryOrder, CategoryTotal, LibraryTable, RankedRecord, ResultTable, YearCategorySum,
};
use std::collections::{BTreeMap, HashMap};

/// Sum counts per category, listed in rank order.
pub fn category_totals(table: &ResultTable) -> Vec<CategoryTotal> {
    let mut sums: HashMap<&str, u64> = HashMap::new();

    for record in table.records() {
        *sums.entry(record.category.as_str()).or_default() += record.count;
    }

    let totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, total_count)| CategoryTotal {
            category: category.to_string(),
            total_count,
        })
        .collect();

    let order = CategoryOrder::from_totals(&totals);
    let mut ranked = totals;
    ranked.sort_by_key(|t| order.rank_of(&t.category));
    ranked
}

/// Rank the categories of a table by descending total count.
pub fn category_order(table: &ResultTable) -> CategoryOrder {
    CategoryOrder::from_totals(&category_totals(table))
}

/// Annotate every record with its category rank and sort by rank.
///
/// Records of the same category keep their insertion order.
pub fn apply_order(table: &ResultTable, order: &CategoryOrder) -> Vec<RankedRecord> {
    let mut ranked: Vec<RankedRecord> = table
        .records()
        .iter()
        .map(|record| RankedRecord {
            // Categories missing from `order` sort last.
            rank: order.rank_of(&record.category).unwrap_or(order.len()),
            record: record.clone(),
        })
        .collect();

    ranked.sort_by_key(|r| r.rank);
    ranked
}

/// Sum counts per (year, category).
///
/// Output is sorted by year, then by category rank.
pub fn yearly_summary(table: &ResultTable) -> Vec<YearCategorySum> {
    let order = category_order(table);
    let mut sums: BTreeMap<(i32, usize), (&str, u64)> = BTreeMap::new();

    for record in table.records() {
        let rank = order.rank_of(&record.category).unwrap_or(order.len());
        sums.entry((record.year, rank))
            .or_insert((record.category.as_str(), 0))
            .1 += record.count;
    }

    sums.into_iter()
        .map(|((year, _), (category, total_count))| YearCategorySum {
            year,
            category: category.to_string(),
            total_count,
        })
        .collect()
}

/// Sum library counts per source, in first-appearance order.
pub fn source_totals(table: &LibraryTable) -> Vec<(String, u64)> {
    let mut totals: Vec<(String, u64)> = table
        .sources()
        .into_iter()
        .map(|s| (s.to_string(), 0))
        .collect();

    for record in table.records() {
        if let Some(entry) = totals.iter_mut().find(|(s, _)| *s == record.source) {
            entry.1 += record.lib_count;
        }
    }

    totals
}
