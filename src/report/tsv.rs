//! Tab-separated table I/O.
//!
//! Header row first, then one row per record. Fields containing a tab,
//! quote or line break are quoted with doubled inner quotes.

use crate::models::{CategoryTotal, LibraryRecord, LibraryTable, RankedRecord, YearCategorySum};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::{self, Write};
use std::mem::take;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEP: char = '\t';

/// Column headers of the SRA census table.
pub const LIBRARY_HEADERS: [&str; 4] = ["Year", "Species", "Source", "lib_count"];

/// Problems reading a census table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("table is empty")]
    Empty,

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: invalid {column} value {value:?}")]
    BadValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

/* ---------------- Naming ---------------- */

/// First two characters of every species name, taken verbatim and
/// concatenated.
///
/// `["Arabidopsis thaliana", "Zea mays"]` gives `"ArZe"`.
pub fn species_initials<S: AsRef<str>>(species: &[S]) -> String {
    species
        .iter()
        .flat_map(|s| s.as_ref().chars().take(2))
        .collect()
}

/// Date-stamped output file names for one census run.
#[derive(Debug, Clone)]
pub struct OutputName {
    pub initials: String,
    /// `geo` or `sra`.
    pub kind: &'static str,
    pub start_year: i32,
    pub end_year: i32,
    pub date: NaiveDate,
}

impl OutputName {
    /// `{initials}_{kind}_{start}_to_{end}_{label}_{YYYYMMDD}.{ext}`
    pub fn file_name(&self, label: &str, ext: &str) -> String {
        format!(
            "{}_{}_{}_to_{}_{}_{}.{}",
            self.initials,
            self.kind,
            self.start_year,
            self.end_year,
            label,
            self.date.format("%Y%m%d"),
            ext
        )
    }

    pub fn path_in(&self, dir: &Path, label: &str, ext: &str) -> PathBuf {
        dir.join(self.file_name(label, ext))
    }
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single TSV row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", SEP)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

fn render(headers: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let header_row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    // Writing into a Vec<u8> cannot fail.
    let _ = write_row(&mut buf, &header_row);
    for row in rows {
        let _ = write_row(&mut buf, &row);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Ordered GEO table: `Year  Category  Count  Rank`, rows in rank order.
pub fn ordered_table_to_tsv(ranked: &[RankedRecord]) -> String {
    render(
        &["Year", "Category", "Count", "Rank"],
        ranked.iter().map(|r| {
            vec![
                r.record.year.to_string(),
                r.record.category.clone(),
                r.record.count.to_string(),
                (r.rank + 1).to_string(),
            ]
        }),
    )
}

/// Per-year summary: `Year  Category  TotalCount`.
pub fn summary_to_tsv(summary: &[YearCategorySum]) -> String {
    render(
        &["Year", "Category", "TotalCount"],
        summary.iter().map(|s| {
            vec![
                s.year.to_string(),
                s.category.clone(),
                s.total_count.to_string(),
            ]
        }),
    )
}

/// Category totals in rank order: `Category  TotalCount`.
pub fn totals_to_tsv(totals: &[CategoryTotal]) -> String {
    render(
        &["Category", "TotalCount"],
        totals
            .iter()
            .map(|t| vec![t.category.clone(), t.total_count.to_string()]),
    )
}

/// SRA census: `Year  Species  Source  lib_count`.
pub fn library_table_to_tsv(table: &LibraryTable) -> String {
    render(
        &LIBRARY_HEADERS,
        table.records().iter().map(|r| {
            vec![
                r.year.to_string(),
                r.species.clone(),
                r.source.clone(),
                r.lib_count.to_string(),
            ]
        }),
    )
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_table(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/* ---------------- Parsing ---------------- */

/// Minimal TSV parser (quotes + CRLF tolerant). Blank lines are dropped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == SEP && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }

    rows
}

/// Parse an SRA census table. Columns are located by header name
/// (case-insensitive); extra columns are ignored. Rows with an empty
/// `lib_count` are failed queries and are skipped.
pub fn parse_library_table(text: &str) -> Result<LibraryTable, TableError> {
    let mut rows = parse_rows(text).into_iter();
    let header = rows.next().ok_or(TableError::Empty)?;

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    };
    let year_col = column("Year")?;
    let species_col = column("Species")?;
    let source_col = column("Source")?;
    let count_col = column("lib_count")?;

    let mut table = LibraryTable::new();
    for (index, row) in rows.enumerate() {
        // Header is line 1.
        let line = index + 2;
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");

        let count_cell = cell(count_col);
        if count_cell.is_empty() {
            continue;
        }

        let year = cell(year_col)
            .parse::<i32>()
            .map_err(|_| TableError::BadValue {
                line,
                column: "Year",
                value: cell(year_col).to_string(),
            })?;
        let lib_count = parse_count_cell(count_cell).ok_or_else(|| TableError::BadValue {
            line,
            column: "lib_count",
            value: count_cell.to_string(),
        })?;

        table.push(LibraryRecord {
            year,
            species: cell(species_col).to_string(),
            source: cell(source_col).to_string(),
            lib_count,
        });
    }

    Ok(table)
}

/// Accepts `12` and the `12.0` form some tools emit for integer columns.
fn parse_count_cell(cell: &str) -> Option<u64> {
    if let Ok(n) = cell.parse::<u64>() {
        return Some(n);
    }
    let f = cell.parse::<f64>().ok()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// Read and parse an SRA census table from disk.
pub fn read_library_table(path: &Path) -> Result<LibraryTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_library_table(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
