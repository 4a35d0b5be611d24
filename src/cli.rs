//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Choice, Field, FilterSelection};
use clap::Parser;
use std::path::PathBuf;

/// SectorLens - filter and chart analytic records
///
/// Fetches sector/topic/region observations from the analytics API,
/// applies the selected filters and writes the dashboard's chart views
/// as a Markdown or JSON report.
///
/// Examples:
///   sectorlens --country India --year 2017
///   sectorlens --topics oil,gas --format json --output dashboard.json
///   sectorlens --input records.json --region Asia --drop-incomplete
///   sectorlens --sector Energy --remote-filter
///   sectorlens --options-only
///   sectorlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the analytics API
    ///
    /// Can also be set via SECTORLENS_API_URL or .sectorlens.toml.
    #[arg(long, value_name = "URL", env = "SECTORLENS_API_URL")]
    pub api_url: Option<String>,

    /// Read records from a local JSON file instead of the API
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Keep only records from this country
    #[arg(long, value_name = "COUNTRY")]
    pub country: Option<String>,

    /// Keep only records from this sector
    #[arg(long, value_name = "SECTOR")]
    pub sector: Option<String>,

    /// Keep only records with this topic
    #[arg(long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Keep only records whose publication year contains this text
    ///
    /// Partial years match too: "201" keeps 2010 through 2019.
    #[arg(long, value_name = "YEAR")]
    pub year: Option<String>,

    /// Keep only records with this end year
    #[arg(long, value_name = "YEAR")]
    pub end_year: Option<String>,

    /// Keep only records from this region
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Keep only records in this PESTLE category
    #[arg(long, value_name = "PESTLE")]
    pub pestle: Option<String>,

    /// Keep only records from this source
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Keep only records whose topic is one of these (comma-separated)
    ///
    /// Example: --topics oil,gas,market
    #[arg(long, value_name = "TOPICS", value_delimiter = ',')]
    pub topics: Vec<String>,

    /// Keep only records where this field is absent (repeatable)
    ///
    /// Selects the "(none)" entry listed by --options-only.
    /// Example: --missing region --missing end-year
    #[arg(long, value_name = "FIELD", value_enum)]
    pub missing: Vec<Field>,

    /// Let the API filter the records instead of filtering locally
    #[arg(long, conflicts_with = "input")]
    pub remote_filter: bool,

    /// Drop records missing the label or value a chart plots
    #[arg(long)]
    pub drop_incomplete: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sectorlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries on transient API failures
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the filter options for every field and exit
    #[arg(long)]
    pub options_only: bool,

    /// Exit with code 2 when no record matches the filters
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Generate a default .sectorlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the filter selection from the filter flags.
    pub fn selection(&self) -> FilterSelection {
        let selection = Field::ALL
            .into_iter()
            .fold(FilterSelection::default(), |selection, field| {
                match self.value_flag(field) {
                    Some(raw) => selection.with(field, Choice::parse(raw)),
                    None => selection,
                }
            });

        self.missing
            .iter()
            .fold(selection, |selection, field| {
                selection.with(*field, Choice::Missing)
            })
            .with_topics(self.topics.iter().map(|t| t.trim().to_string()))
    }

    /// The value flag for `field`, if given.
    fn value_flag(&self, field: Field) -> Option<&String> {
        match field {
            Field::Country => self.country.as_ref(),
            Field::Sector => self.sector.as_ref(),
            Field::Topic => self.topic.as_ref(),
            Field::Year => self.year.as_ref(),
            Field::EndYear => self.end_year.as_ref(),
            Field::Region => self.region.as_ref(),
            Field::Pestle => self.pestle.as_ref(),
            Field::Source => self.source.as_ref(),
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        for field in &self.missing {
            if self.value_flag(*field).is_some_and(|v| !v.is_empty()) {
                return Err(format!(
                    "Cannot both select a value for {} and require it to be missing",
                    field
                ));
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::filter_records;
    use crate::models::Record;

    fn make_args() -> Args {
        Args::parse_from(["sectorlens"])
    }

    #[test]
    fn test_defaults() {
        let args = make_args();
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.topics.is_empty());
        assert!(args.selection().is_empty());
    }

    #[test]
    fn test_selection_from_flags() {
        let args = Args::parse_from([
            "sectorlens",
            "--country",
            "India",
            "--year",
            "2017",
            "--end-year",
            "",
            "--topics",
            "oil, gas",
        ]);

        let selection = args.selection();

        assert_eq!(selection.country, Choice::Value("India".to_string()));
        assert_eq!(selection.year, Choice::Value("2017".to_string()));
        assert_eq!(selection.end_year, Choice::Any);
        assert!(selection.topics.contains("oil"));
        assert!(selection.topics.contains("gas"));
    }

    #[test]
    fn test_missing_flag_selects_absent_values() {
        let args = Args::parse_from([
            "sectorlens",
            "--missing",
            "region",
            "--missing",
            "end-year",
            "--country",
            "India",
        ]);

        let selection = args.selection();
        assert_eq!(selection.region, Choice::Missing);
        assert_eq!(selection.end_year, Choice::Missing);
        assert_eq!(selection.country, Choice::Value("India".to_string()));

        let records = vec![
            Record {
                country: Some("India".to_string()),
                region: Some("Asia".to_string()),
                ..Default::default()
            },
            Record {
                country: Some("India".to_string()),
                ..Default::default()
            },
        ];
        let kept = filter_records(&records, &selection);
        assert_eq!(kept, vec![&records[1]]);
    }

    #[test]
    fn test_validation_missing_conflicts_with_value() {
        let args = Args::parse_from(["sectorlens", "--missing", "region", "--region", "Asia"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_remote_filter_conflicts_with_input() {
        let result = Args::try_parse_from([
            "sectorlens",
            "--input",
            "records.json",
            "--remote-filter",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = Some("ftp://example.com".to_string());
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
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.json"));
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
}
