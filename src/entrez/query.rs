//! Entrez filter expressions.
//!
//! Builds the field-qualified search terms submitted to `esearch`.

use crate::models::Database;
use std::fmt;

/// A search expression bound to the database it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrezQuery {
    pub db: Database,
    pub expression: String,
}

impl EntrezQuery {
    /// GEO DataSets of one dataset type, published in `year`, for `species`.
    pub fn geo_dataset_type(term: &str, year: i32, species: &str) -> Self {
        Self {
            db: Database::Gds,
            expression: format!("{term}[DataSet Type] AND {year}[PDAT] AND {species}[ORGN]"),
        }
    }

    /// SRA libraries of one source, published in `year`, for `species`.
    pub fn sra_library(species: &str, source: &str, year: i32) -> Self {
        Self {
            db: Database::Sra,
            expression: format!("{species}[ORGN] AND {source}[SRC] AND {year}[PDAT]"),
        }
    }
}

impl fmt::Display for EntrezQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.db, self.expression)
    }
}
