//! ncbicount - GEO dataset and SRA library census
//!
//! A CLI tool that queries NCBI E-utilities for per-year counts,
//! ranks dataset categories by total count, and writes TSV tables
//! and SVG charts.
//!
//! Exit codes:
//!   0 - Success (individual failed queries are reported, not fatal)
//!   1 - Runtime error (invalid arguments, config, I/O, etc.)

mod analysis;
mod cli;
mod collector;
mod config;
mod entrez;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use cli::{Args, Command, PlotArgs};
use config::{Config, CONFIG_FILE};
use entrez::{EntrezClient, EntrezQuery};
use models::{CategoryOrder, QueryFailure};
use report::OutputName;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ncbicount v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .ncbicount.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set your contact email, species, categories and years.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` is honoured unless `-v` or `-q` was given.
fn init_logging(args: &Args) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(args.log_directives(rust_log.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command {
        Some(Command::Geo(_)) => run_geo(&config, &args).await,
        Some(Command::Sra(_)) => run_sra(&config, &args).await,
        Some(Command::Plot(ref plot)) => run_plot(plot, args.quiet),
        // validate() rejects a missing subcommand
        None => Ok(()),
    }
}

/// GEO census: collect, rank categories, write tables and the bar chart.
async fn run_geo(config: &Config, args: &Args) -> Result<()> {
    config.validate_geo()?;
    let geo = &config.geo;
    let planned = collector::plan_geo(geo);

    if args.dry_run {
        return handle_dry_run(planned.iter().map(|p| &p.query));
    }

    let start_time = Instant::now();
    println!(
        "🔎 Querying GEO DataSets for {} ({}-{}), {} queries",
        geo.species,
        geo.start_year,
        geo.end_year,
        planned.len()
    );

    let client = make_client(config)?;
    let outcome = collector::collect_geo(&client, &planned, !args.quiet).await;
    info!(
        "Collected {} records, {} failed queries",
        outcome.table.len(),
        outcome.failures.len()
    );
    if outcome.table.is_empty() {
        warn!("No counts were collected; tables will contain headers only");
    }

    let totals = analysis::category_totals(&outcome.table);
    let order = CategoryOrder::from_totals(&totals);
    let ranked = analysis::apply_order(&outcome.table, &order);
    let summary = analysis::yearly_summary(&outcome.table);

    let name = OutputName {
        initials: report::species_initials(&[geo.species.as_str()]),
        kind: "geo",
        start_year: geo.start_year,
        end_year: geo.end_year,
        date: today(),
    };
    let dir = &config.output.dir;

    let mut written = vec![
        save(&name.path_in(dir, "df", "tsv"), &report::ordered_table_to_tsv(&ranked))?,
        save(&name.path_in(dir, "summary", "tsv"), &report::summary_to_tsv(&summary))?,
        save(&name.path_in(dir, "totals", "tsv"), &report::totals_to_tsv(&totals))?,
    ];

    if config.output.charts {
        let heading = format!("Annual Distribution of GEO Dataset Types for {}", geo.species);
        let svg = report::grouped_bar_chart(&summary, &order, &heading);
        written.push(save(&name.path_in(dir, "plot", "svg"), &svg)?);
    }

    println!("\n📊 Category Ranking:");
    if order.is_empty() {
        println!("   (no counts collected)");
    }
    for (rank, total) in totals.iter().enumerate() {
        println!("   {}. {}: {}", rank + 1, total.category, total.total_count);
    }

    print_footer(&outcome.failures, planned.len(), &written, start_time);
    Ok(())
}

/// SRA census: collect library counts per year, species and source.
async fn run_sra(config: &Config, args: &Args) -> Result<()> {
    config.validate_sra()?;
    let sra = &config.sra;
    let planned = collector::plan_sra(sra);

    if args.dry_run {
        return handle_dry_run(planned.iter().map(|p| &p.query));
    }

    let start_time = Instant::now();
    println!(
        "🔎 Querying SRA for {} species x {} sources ({}-{}), {} queries",
        sra.species.len(),
        sra.sources.len(),
        sra.start_year,
        sra.end_year,
        planned.len()
    );

    let client = make_client(config)?;
    let outcome = collector::collect_sra(&client, &planned, !args.quiet).await;

    let name = OutputName {
        initials: report::species_initials(sra.species.as_slice()),
        kind: "sra",
        start_year: sra.start_year,
        end_year: sra.end_year,
        date: today(),
    };
    let dir = &config.output.dir;

    let mut written = vec![save(
        &name.path_in(dir, "df", "tsv"),
        &report::library_table_to_tsv(&outcome.table),
    )?];

    if config.output.charts {
        let svg = report::faceted_scatter(&outcome.table);
        written.push(save(&name.path_in(dir, "plot", "svg"), &svg)?);
    }

    println!("\n📊 Libraries by Source:");
    for (source, total) in analysis::source_totals(&outcome.table) {
        println!("   {}: {}", source, total);
    }

    print_footer(&outcome.failures, planned.len(), &written, start_time);
    Ok(())
}

/// Render a faceted chart from an existing SRA census table.
fn run_plot(plot: &PlotArgs, quiet: bool) -> Result<()> {
    let table = report::read_library_table(&plot.input)?;
    info!("Loaded {} rows from {}", table.len(), plot.input.display());

    if table.is_empty() {
        warn!("Table has no rows with a library count; the chart will be empty");
    }

    let output = plot
        .output
        .clone()
        .unwrap_or_else(|| plot.input.with_extension("svg"));
    let path = save(&output, &report::faceted_scatter(&table))?;

    if !quiet {
        println!("✅ Chart saved to: {}", path);
    }
    Ok(())
}

/// Handle --dry-run: print the queries that would be issued, exit.
fn handle_dry_run<'a>(queries: impl Iterator<Item = &'a EntrezQuery>) -> Result<()> {
    println!("\n🔍 Dry run: no requests will be sent.\n");

    let mut total = 0;
    for query in queries {
        println!("   {}", query);
        total += 1;
    }

    println!("\n   Total: {} queries", total);
    println!("\n✅ Dry run complete.");
    Ok(())
}

fn make_client(config: &Config) -> Result<EntrezClient> {
    if config.entrez.email.is_empty() {
        warn!("No contact email configured; NCBI asks E-utilities users to set one (--email or NCBI_EMAIL)");
    }
    EntrezClient::new(config.entrez.clone())
}

fn save(path: &Path, contents: &str) -> Result<String> {
    report::write_table(path, contents)?;
    debug!("Wrote {}", path.display());
    Ok(path.display().to_string())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_footer(failures: &[QueryFailure], issued: usize, written: &[String], start_time: Instant) {
    if !failures.is_empty() {
        println!("\n⚠️  {} of {} queries failed and were skipped:", failures.len(), issued);
        for failure in failures {
            println!("   - [{}] {}: {}", failure.year, failure.expression, failure.error);
        }
    }

    println!("\n   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Done! Files written:");
    for path in written {
        println!("   📄 {}", path);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e.context(format!("Invalid {}", CONFIG_FILE))),
    }
}
