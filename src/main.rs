//! SectorLens - analytics dashboard engine
//!
//! A CLI tool that loads sector/topic/region observations from the
//! analytics API (or a local JSON file), applies a filter selection and
//! renders the dashboard's chart views as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, unreadable input, etc.)
//!   2 - No record matched the filters and --fail-on-empty was set

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod session;
mod source;
mod store;

use analysis::{extract_all, ViewOptions};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use error::FetchError;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use models::{DashboardReport, Record, ReportMetadata, Vocabulary};
use session::{Channel, LoadOutcome, RequestToken, Session};
use source::{ApiClient, ClientConfig, FileSource, RecordSource};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use store::RecordStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// A fetch in flight: its token, where it went and what came back.
type PendingFetch<'a> = BoxFuture<'a, (RequestToken, String, Result<Vec<Record>, FetchError>)>;

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

    init_logging(&args)?;

    info!("SectorLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sectorlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the API endpoints, retries, and report layout.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level().to_string().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load, filter and render the dashboard. Returns exit code (0 or 2).
async fn run_dashboard(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let options = ViewOptions {
        drop_incomplete: config.views.drop_incomplete,
    };

    let mut session = Session::new(options);
    session.set_selection(args.selection());

    // Step 1: Load the records
    if let Some(ref input) = args.input {
        let source = FileSource::new(input);

        if args.options_only {
            return handle_options_only(&source).await;
        }

        println!("📥 Reading records: {}", source.describe());
        let spinner = fetch_spinner(&args, format!("Reading {}", source.describe()));
        let outcome = session.load(&source).await;
        finish_spinner(spinner);
        log_outcome(Channel::Records, &source.describe(), outcome);
    } else {
        let client = ApiClient::new(ClientConfig::from(&config.api))?;

        if args.options_only {
            return handle_options_only(&client).await;
        }

        println!("📥 Fetching records: {}", client.records_url());
        if args.remote_filter {
            println!("   Filtering server-side: {}", client.filter_url());
        }

        let spinner = fetch_spinner(&args, "Waiting for the analytics API...".to_string());
        fetch_concurrently(&mut session, &client, args.remote_filter).await;
        finish_spinner(spinner);
    }

    if let Some(loaded_at) = session.store().loaded_at() {
        debug!(
            "Snapshot generation {} loaded at {}",
            session.store().generation(),
            loaded_at
        );
    }

    // Step 2: Compute the views
    println!("\n📊 Computing chart views...");

    let views = session.views();
    warn_unknown_choices(&session, &views.vocabularies);

    let duration = start_time.elapsed().as_secs_f64();

    let metadata = ReportMetadata {
        source: session
            .store()
            .origin()
            .map(str::to_string)
            .unwrap_or_else(|| "(nothing loaded)".to_string()),
        generated_at: Utc::now(),
        records_loaded: session.store().records().len(),
        records_matched: views.filtered.len(),
        remote_filter: session.uses_remote_subset(),
        duration_seconds: duration,
    };

    let report = DashboardReport {
        metadata,
        selection: session.selection().clone(),
        views,
        notices: session.notices().to_vec(),
    };

    // Step 3: Generate and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let report_path = output_path(&args, &config);
    std::fs::write(&report_path, &output)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;

    for notice in &report.notices {
        eprintln!("⚠️  {}", notice);
    }

    // Print summary
    if !args.quiet {
        println!("\n📊 Dashboard Summary:");
        println!("   Records loaded: {}", report.metadata.records_loaded);
        println!("   Records matched: {}", report.metadata.records_matched);
        for chart in &report.views.charts {
            println!(
                "   - {}: {} points",
                chart.presentation.title,
                chart.labels.len()
            );
        }
        println!("   Histogram bins: {}", report.views.histogram.len());
        println!("   Duration: {:.1}s", duration);
    }
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        report_path.display()
    );

    if args.fail_on_empty && report.views.filtered.is_empty() {
        eprintln!("\n⛔ No record matched the selected filters. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Run the full load and, when asked, the server-side filtered fetch at the
/// same time, applying each result as it arrives.
async fn fetch_concurrently(session: &mut Session, client: &ApiClient, remote_filter: bool) {
    let mut pending: FuturesUnordered<PendingFetch<'_>> = FuturesUnordered::new();

    let token = session.issue(Channel::Records);
    pending.push(
        async move {
            let result = client.fetch_all().await;
            (token, client.records_url(), result)
        }
        .boxed(),
    );

    if remote_filter {
        let token = session.issue(Channel::Filtered);
        let selection = session.selection().clone();
        pending.push(
            async move {
                let result = client.fetch_filtered(&selection).await;
                (token, client.filter_url(), result)
            }
            .boxed(),
        );
    }

    while let Some((token, origin, result)) = pending.next().await {
        let outcome = session.complete(token, &origin, result);
        log_outcome(token.channel(), &origin, outcome);
    }
}

fn log_outcome(channel: Channel, origin: &str, outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Applied { records } => {
            info!("{:?}: applied {} records from {}", channel, records, origin)
        }
        LoadOutcome::Stale => debug!("{:?}: discarded stale response from {}", channel, origin),
        LoadOutcome::Failed => warn!("{:?}: fetch from {} failed", channel, origin),
    }
}

/// Warn about selected values that no record carries.
fn warn_unknown_choices(session: &Session, vocabularies: &[Vocabulary]) {
    if !session.store().is_loaded() {
        return;
    }

    let selection = session.selection();
    for vocab in vocabularies {
        let selected = selection.choice(vocab.field);
        if selected.is_any() {
            continue;
        }
        if !vocab.choices().any(|choice| &choice == selected) {
            warn!(
                "No record has {} = {}; the filtered views will be empty",
                vocab.field, selected
            );
        }
    }
}

/// Handle --options-only: load the records and print every field's options.
async fn handle_options_only<S: RecordSource>(source: &S) -> Result<i32> {
    println!("🔍 Loading filter options from {}\n", source.describe());

    let mut store = RecordStore::new();
    store
        .load(source)
        .await
        .with_context(|| format!("Failed to load records from {}", source.describe()))?;

    let vocabularies = extract_all(store.records());
    for vocab in &vocabularies {
        debug!("{}: {} choices", vocab.field, vocab.len());
    }
    print!("{}", report::generate_options_listing(&vocabularies));

    println!("\n✅ {} records scanned.", store.records().len());
    Ok(0)
}

/// Resolve the report path; the default name follows the output format.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let mut path = PathBuf::from(&config.general.output);
    if args.output.is_none() {
        path.set_extension(args.format.extension());
    }
    path
}

fn fetch_spinner(args: &Args, message: String) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
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
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
