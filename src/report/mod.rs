//! Output writers: TSV tables and SVG charts.

pub mod chart;
pub mod tsv;

pub use chart::{faceted_scatter, grouped_bar_chart};
pub use tsv::{
    library_table_to_tsv, ordered_table_to_tsv, read_library_table, species_initials,
    summary_to_tsv, totals_to_tsv, write_table, OutputName,
};
