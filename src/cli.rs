//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ncbicount - GEO dataset and SRA library counts over time
///
/// Query NCBI E-utilities for per-year counts, write TSV tables and
/// render SVG charts.
///
/// Examples:
///   ncbicount geo --species "Zea mays" --start-year 2015 --end-year 2023
///   ncbicount sra --species "Zea mays,Oryza sativa" --sources genomic
///   ncbicount plot result/ArZeOr_sra_2008_to_2023_df_20240608.tsv
///   ncbicount --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .ncbicount.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Contact email sent to NCBI with every request
    #[arg(long, value_name = "ADDR", env = "NCBI_EMAIL", global = true)]
    pub email: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the queries that would be issued without contacting NCBI
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Generate a default .ncbicount.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Count GEO DataSets per year and dataset category
    Geo(GeoArgs),
    /// Count SRA libraries per year, species and source
    Sra(SraArgs),
    /// Render a faceted chart from an SRA census table
    Plot(PlotArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct GeoArgs {
    /// Organism to restrict the search to
    #[arg(long, value_name = "NAME")]
    pub species: Option<String>,

    /// First publication year (inclusive)
    #[arg(long, value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last publication year (inclusive)
    #[arg(long, value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Directory for output tables and charts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_chart: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SraArgs {
    /// Organisms to census (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub species: Option<Vec<String>>,

    /// Library sources to census (comma-separated)
    ///
    /// Example: --sources transcriptomic,genomic
    #[arg(long, value_name = "SOURCES", value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// First publication year (inclusive)
    #[arg(long, value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last publication year (inclusive)
    #[arg(long, value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Directory for output tables and charts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_chart: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PlotArgs {
    /// SRA census table (TSV with Year, Species, Source, lib_count)
    #[arg(value_name = "TSV")]
    pub input: PathBuf,

    /// Output SVG path (defaults to the input path with an .svg extension)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let command = match self.command {
            Some(ref command) => command,
            None => return Err("A subcommand is required: geo, sra or plot".to_string()),
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref email) = self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(format!("Not an email address: {}", email));
            }
        }

        match command {
            Command::Geo(geo) => {
                check_year_range(geo.start_year, geo.end_year)?;
                if let Some(ref species) = geo.species {
                    if species.trim().is_empty() {
                        return Err("Species must not be empty".to_string());
                    }
                }
            }
            Command::Sra(sra) => {
                check_year_range(sra.start_year, sra.end_year)?;
                check_list("species", sra.species.as_deref())?;
                check_list("sources", sra.sources.as_deref())?;
            }
            Command::Plot(plot) => {
                if !plot.input.is_file() {
                    return Err(format!(
                        "Input table does not exist: {}",
                        plot.input.display()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter directives for the log subscriber.
    ///
    /// `-v` and `-q` win over `RUST_LOG`; a blank `RUST_LOG` is ignored.
    pub fn log_directives(&self, rust_log: Option<&str>) -> String {
        match rust_log.map(str::trim) {
            Some(directives) if !directives.is_empty() && !self.verbose && !self.quiet => {
                directives.to_string()
            }
            _ => self.log_level().to_string().to_lowercase(),
        }
    }
}

fn check_year_range(start: Option<i32>, end: Option<i32>) -> Result<(), String> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(format!("Start year {} is after end year {}", start, end));
        }
    }
    Ok(())
}

fn check_list(name: &str, values: Option<&[String]>) -> Result<(), String> {
    if let Some(values) = values {
        if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
            return Err(format!("--{} must not contain empty entries", name));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            config: None,
            email: None,
            timeout: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
            command: Some(Command::Geo(GeoArgs {
                species: None,
                start_year: None,
                end_year: None,
                output_dir: None,
                no_chart: false,
            })),
        }
    }

    #[test]
    fn test_parse_sra_lists() {
        let args = Args::try_parse_from([
            "ncbicount",
            "sra",
            "--species",
            "Zea mays,Oryza sativa",
            "--sources",
            "genomic",
            "--start-year",
            "2010",
        ])
        .unwrap();

        match args.command {
            Some(Command::Sra(sra)) => {
                assert_eq!(
                    sra.species,
                    Some(vec!["Zea mays".to_string(), "Oryza sativa".to_string()])
                );
                assert_eq!(sra.sources, Some(vec!["genomic".to_string()]));
                assert_eq!(sra.start_year, Some(2010));
                assert_eq!(sra.end_year, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["ncbicount", "geo", "--dry-run", "-v"]).unwrap();
        assert!(args.dry_run);
        assert!(args.verbose);
    }

    #[test]
    fn test_validation_requires_subcommand() {
        let mut args = make_args();
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_inverted_years() {
        let mut args = make_args();
        args.command = Some(Command::Geo(GeoArgs {
            species: None,
            start_year: Some(2023),
            end_year: Some(2022),
            output_dir: None,
            no_chart: false,
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_email() {
        let mut args = make_args();
        args.email = Some("nobody".to_string());
        assert!(args.validate().is_err());

        args.email = Some("nobody@example.org".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_plot_input() {
        let mut args = make_args();
        args.command = Some(Command::Plot(PlotArgs {
            input: PathBuf::from("does/not/exist.tsv"),
            output: None,
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_directives() {
        let mut args = make_args();
        assert_eq!(args.log_directives(None), "info");
        assert_eq!(args.log_directives(Some("  ")), "info");
        assert_eq!(args.log_directives(Some("ncbicount=trace")), "ncbicount=trace");

        args.verbose = true;
        assert_eq!(args.log_directives(Some("ncbicount=trace")), "debug");
    }
}
