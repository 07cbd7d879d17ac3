//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ncbicount.toml` files.

use crate::cli::{Args, Command};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".ncbicount.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// E-utilities connection settings.
    #[serde(default)]
    pub entrez: EntrezConfig,

    /// GEO dataset-type census.
    #[serde(default)]
    pub geo: GeoConfig,

    /// SRA library census.
    #[serde(default)]
    pub sra: SraConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// E-utilities connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrezConfig {
    /// Contact address sent with every request.
    #[serde(default)]
    pub email: String,

    /// Tool name sent with every request.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// E-utilities base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            tool: default_tool(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_tool() -> String {
    "ncbicount".to_string()
}

fn default_base_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// A display category and the GEO dataset types rolled up into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTerms {
    pub name: String,
    pub terms: Vec<String>,
}

impl CategoryTerms {
    fn new(name: &str, terms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// GEO census settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Organism matched with `[ORGN]`.
    #[serde(default = "default_geo_species")]
    pub species: String,

    #[serde(default = "default_geo_start_year")]
    pub start_year: i32,

    #[serde(default = "default_geo_end_year")]
    pub end_year: i32,

    /// Categories in collection order.
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryTerms>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            species: default_geo_species(),
            start_year: default_geo_start_year(),
            end_year: default_geo_end_year(),
            categories: default_categories(),
        }
    }
}

fn default_geo_species() -> String {
    "Zea mays".to_string()
}

fn default_geo_start_year() -> i32 {
    2022
}

fn default_geo_end_year() -> i32 {
    2023
}

fn default_categories() -> Vec<CategoryTerms> {
    vec![
        CategoryTerms::new(
            "microarray",
            &[
                "expression profiling by array",
                "expression profiling by genome tiling array",
                "expression profiling by snp array",
                "genome binding/occupancy profiling by array",
                "genome binding/occupancy profiling by genome tiling array",
                "genome binding/occupancy profiling by snp array",
                "genome variation profiling by array",
                "genome variation profiling by genome tiling array",
                "genome variation profiling by snp array",
                "methylation profiling by array",
                "methylation profiling by genome tiling array",
                "methylation profiling by snp array",
                "non coding rna profiling by array",
                "non coding rna profiling by genome tiling array",
                "protein profiling by protein array",
                "snp genotyping by snp array",
            ],
        ),
        CategoryTerms::new(
            "sequencing",
            &[
                "expression profiling by high throughput sequencing",
                "genome binding/occupancy profiling by high throughput sequencing",
                "genome variation profiling by high throughput sequencing",
                "methylation profiling by high throughput sequencing",
                "non coding rna profiling by high throughput sequencing",
            ],
        ),
    ]
}

/// SRA census settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SraConfig {
    #[serde(default = "default_sra_species")]
    pub species: Vec<String>,

    /// Library sources matched with `[SRC]`.
    #[serde(default = "default_sra_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_sra_start_year")]
    pub start_year: i32,

    #[serde(default = "default_sra_end_year")]
    pub end_year: i32,
}

impl Default for SraConfig {
    fn default() -> Self {
        Self {
            species: default_sra_species(),
            sources: default_sra_sources(),
            start_year: default_sra_start_year(),
            end_year: default_sra_end_year(),
        }
    }
}

fn default_sra_species() -> Vec<String> {
    vec!["Arabidopsis thaliana", "Zea mays", "Oryza sativa"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sra_sources() -> Vec<String> {
    vec!["transcriptomic", "genomic"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sra_start_year() -> i32 {
    2008
}

fn default_sra_end_year() -> i32 {
    2023
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for tables and charts (created if missing).
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Render SVG charts alongside the tables.
    #[serde(default = "default_true")]
    pub charts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            charts: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("result")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Look for [`CONFIG_FILE`] inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref email) = args.email {
            self.entrez.email = email.clone();
        }
        if let Some(timeout) = args.timeout {
            self.entrez.timeout_seconds = timeout;
        }

        match &args.command {
            Some(Command::Geo(geo)) => {
                if let Some(ref species) = geo.species {
                    self.geo.species = species.clone();
                }
                if let Some(start) = geo.start_year {
                    self.geo.start_year = start;
                }
                if let Some(end) = geo.end_year {
                    self.geo.end_year = end;
                }
                self.merge_output(geo.output_dir.as_ref(), geo.no_chart);
            }
            Some(Command::Sra(sra)) => {
                if let Some(ref species) = sra.species {
                    self.sra.species = species.clone();
                }
                if let Some(ref sources) = sra.sources {
                    self.sra.sources = sources.clone();
                }
                if let Some(start) = sra.start_year {
                    self.sra.start_year = start;
                }
                if let Some(end) = sra.end_year {
                    self.sra.end_year = end;
                }
                self.merge_output(sra.output_dir.as_ref(), sra.no_chart);
            }
            Some(Command::Plot(_)) | None => {}
        }
    }

    fn merge_output(&mut self, dir: Option<&PathBuf>, no_chart: bool) {
        if let Some(dir) = dir {
            self.output.dir = dir.clone();
        }
        if no_chart {
            self.output.charts = false;
        }
    }

    /// Check the GEO census settings before any query is issued.
    pub fn validate_geo(&self) -> Result<()> {
        let geo = &self.geo;
        validate_years(geo.start_year, geo.end_year)?;
        if geo.species.trim().is_empty() {
            bail!("GEO species must not be empty");
        }
        if geo.categories.is_empty() {
            bail!("At least one GEO category is required");
        }
        for category in &geo.categories {
            if category.name.trim().is_empty() {
                bail!("GEO category names must not be empty");
            }
            if category.terms.is_empty() {
                bail!("GEO category '{}' has no terms", category.name);
            }
        }
        Ok(())
    }

    /// Check the SRA census settings before any query is issued.
    pub fn validate_sra(&self) -> Result<()> {
        let sra = &self.sra;
        validate_years(sra.start_year, sra.end_year)?;
        if sra.species.is_empty() || sra.species.iter().any(|s| s.trim().is_empty()) {
            bail!("SRA species list must be non-empty and contain no blank names");
        }
        if sra.sources.is_empty() || sra.sources.iter().any(|s| s.trim().is_empty()) {
            bail!("SRA source list must be non-empty and contain no blank names");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn validate_years(start: i32, end: i32) -> Result<()> {
    if start > end {
        bail!("Start year {} is after end year {}", start, end);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{GeoArgs, SraArgs};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.geo.species, "Zea mays");
        assert_eq!(config.geo.categories.len(), 2);
        assert_eq!(config.geo.categories[0].name, "microarray");
        assert_eq!(config.geo.categories[0].terms.len(), 16);
        assert_eq!(config.geo.categories[1].terms.len(), 5);
        assert_eq!(config.sra.sources, vec!["transcriptomic", "genomic"]);
        assert_eq!(config.output.dir, PathBuf::from("result"));
        assert!(config.validate_geo().is_ok());
        assert!(config.validate_sra().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[entrez]
email = "someone@example.org"
timeout_seconds = 10

[geo]
species = "Oryza sativa"
start_year = 2015
end_year = 2020

[[geo.categories]]
name = "rnaseq"
terms = ["expression profiling by high throughput sequencing"]

[sra]
species = ["Homo sapiens"]
sources = ["genomic"]

[output]
dir = "out"
charts = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.entrez.email, "someone@example.org");
        assert_eq!(config.entrez.timeout_seconds, 10);
        assert_eq!(config.entrez.tool, "ncbicount");
        assert_eq!(config.geo.species, "Oryza sativa");
        assert_eq!(config.geo.start_year, 2015);
        assert_eq!(config.geo.categories.len(), 1);
        assert_eq!(config.geo.categories[0].name, "rnaseq");
        assert_eq!(config.sra.species, vec!["Homo sapiens"]);
        assert_eq!(config.sra.start_year, 2008);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(!config.output.charts);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[entrez]"));
        assert!(toml_str.contains("[geo]"));
        assert!(toml_str.contains("[[geo.categories]]"));
        assert!(toml_str.contains("[sra]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.geo.categories, Config::default().geo.categories);
    }

    #[test]
    fn test_load_rejects_bad_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[geo]\nspecies = \"Oryza sativa\"\nstart_year = \"oops\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[geo]\nspecies = \"Oryza sativa\"\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.geo.species, "Oryza sativa");
        assert_eq!(config.geo.start_year, 2022);
    }

    #[test]
    fn test_validation_rejects_inverted_years() {
        let mut config = Config::default();
        config.geo.start_year = 2024;
        config.geo.end_year = 2020;
        assert!(config.validate_geo().is_err());

        config.sra.start_year = 2010;
        config.sra.end_year = 2009;
        assert!(config.validate_sra().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_terms() {
        let mut config = Config::default();
        config.geo.categories[1].terms.clear();
        assert!(config.validate_geo().is_err());

        let mut config = Config::default();
        config.sra.sources.clear();
        assert!(config.validate_sra().is_err());
    }

    #[test]
    fn test_merge_geo_args() {
        let mut config = Config::default();
        let mut args = crate::cli::tests::make_args();
        args.email = Some("me@example.org".to_string());
        args.command = Some(Command::Geo(GeoArgs {
            species: Some("Glycine max".to_string()),
            start_year: Some(2010),
            end_year: None,
            output_dir: Some(PathBuf::from("geo_out")),
            no_chart: true,
        }));

        config.merge_with_args(&args);
        assert_eq!(config.entrez.email, "me@example.org");
        assert_eq!(config.geo.species, "Glycine max");
        assert_eq!(config.geo.start_year, 2010);
        assert_eq!(config.geo.end_year, 2023);
        assert_eq!(config.output.dir, PathBuf::from("geo_out"));
        assert!(!config.output.charts);
    }

    #[test]
    fn test_merge_sra_args_keeps_unset_values() {
        let mut config = Config::default();
        let mut args = crate::cli::tests::make_args();
        args.command = Some(Command::Sra(SraArgs {
            species: None,
            sources: Some(vec!["metagenomic".to_string()]),
            start_year: None,
            end_year: Some(2012),
            output_dir: None,
            no_chart: false,
        }));

        config.merge_with_args(&args);
        assert_eq!(config.sra.species.len(), 3);
        assert_eq!(config.sra.sources, vec!["metagenomic"]);
        assert_eq!(config.sra.end_year, 2012);
        assert!(config.output.charts);
    }
}
