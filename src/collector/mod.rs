//! Query collector.
//!
//! Issues one count query per (term, year) or (year, species, source)
//! combination, sequentially, and gathers the answers into a table.
//! A failing query is logged and skipped; it never aborts the run.

use crate::config::{GeoConfig, SraConfig};
use crate::entrez::{CountService, EntrezQuery};
use crate::models::{CountRecord, LibraryRecord, LibraryTable, QueryFailure, ResultTable};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// A GEO query together with the category its answer rolls up into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoQuery {
    pub category: String,
    pub year: i32,
    pub query: EntrezQuery,
}

/// An SRA query together with the census cell it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SraQuery {
    pub year: i32,
    pub species: String,
    pub source: String,
    pub query: EntrezQuery,
}

/// Result of a GEO collection run.
#[derive(Debug, Clone, Default)]
pub struct GeoOutcome {
    pub table: ResultTable,
    pub failures: Vec<QueryFailure>,
}

/// Result of an SRA collection run.
#[derive(Debug, Clone, Default)]
pub struct SraOutcome {
    pub table: LibraryTable,
    pub failures: Vec<QueryFailure>,
}

/// Plan the GEO queries: category-major, then term, then year ascending.
pub fn plan_geo(config: &GeoConfig) -> Vec<GeoQuery> {
    let mut planned = Vec::new();

    for category in &config.categories {
        for term in &category.terms {
            for year in config.start_year..=config.end_year {
                planned.push(GeoQuery {
                    category: category.name.clone(),
                    year,
                    query: EntrezQuery::geo_dataset_type(term, year, &config.species),
                });
            }
        }
    }

    planned
}

/// Plan the SRA queries: year-major, then species, then source.
pub fn plan_sra(config: &SraConfig) -> Vec<SraQuery> {
    let mut planned = Vec::new();

    for year in config.start_year..=config.end_year {
        for species in &config.species {
            for source in &config.sources {
                planned.push(SraQuery {
                    year,
                    species: species.clone(),
                    source: source.clone(),
                    query: EntrezQuery::sra_library(species, source, year),
                });
            }
        }
    }

    planned
}

/// Run every planned GEO query and collect the counts.
pub async fn collect_geo<S: CountService>(
    service: &S,
    planned: &[GeoQuery],
    show_progress: bool,
) -> GeoOutcome {
    info!("Issuing {} GEO count queries", planned.len());
    let pb = progress_bar(planned.len(), show_progress);
    let mut outcome = GeoOutcome::default();

    for item in planned {
        match service.count(&item.query).await {
            Ok(count) => {
                debug!("{} -> {}", item.query.expression, count);
                outcome
                    .table
                    .push(CountRecord::new(item.year, item.category.clone(), count));
            }
            Err(e) => outcome.failures.push(failure(&item.query, item.year, &e)),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    outcome
}

/// Run every planned SRA query and collect the library counts.
pub async fn collect_sra<S: CountService>(
    service: &S,
    planned: &[SraQuery],
    show_progress: bool,
) -> SraOutcome {
    info!("Issuing {} SRA count queries", planned.len());
    let pb = progress_bar(planned.len(), show_progress);
    let mut outcome = SraOutcome::default();

    for item in planned {
        match service.count(&item.query).await {
            Ok(lib_count) => {
                debug!("{} -> {}", item.query.expression, lib_count);
                outcome.table.push(LibraryRecord {
                    year: item.year,
                    species: item.species.clone(),
                    source: item.source.clone(),
                    lib_count,
                });
            }
            Err(e) => outcome.failures.push(failure(&item.query, item.year, &e)),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    outcome
}

fn failure(query: &EntrezQuery, year: i32, error: &dyn std::error::Error) -> QueryFailure {
    warn!("Query failed, skipping ({}): {}", query.expression, error);
    QueryFailure {
        expression: query.expression.clone(),
        year,
        error: error.to_string(),
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
