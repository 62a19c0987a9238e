//! fastqc-aggregate - merge FastQC per-base quality into one table
//!
//! A CLI tool that reads the "Per base sequence quality" module of many
//! FastQC reports and writes one samples-by-position table of mean
//! quality scores.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (no valid reports, unreadable or malformed report, etc.)
//!   2 - Table written, but --fail-on-missing was set and a report had no
//!       per-base quality section

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod scanner;

use anyhow::{bail, Context, Result};
use cli::Args;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
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

    info!("fastqc-aggregate v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_aggregation(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Aggregation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .fastqc-aggregate.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::DEFAULT_CONFIG_FILE);
    println!("   Edit it to set the report root, separator, naming rule, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr, apart from the summary printed on stdout.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
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

/// Run the complete aggregation workflow. Returns exit code (0 or 2).
fn run_aggregation(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    debug!("Effective configuration: {:?}", config);

    let output = PathBuf::from(&config.general.output);

    // Step 1: Collect the reports
    let inputs = resolve_inputs(&args, &config)?;
    info!("{} reports to read", inputs.len());

    if args.dry_run {
        return handle_dry_run(&inputs);
    }

    // Step 2: Extract one quality vector per report
    if !args.quiet {
        println!("🔬 Extracting per-base quality from {} reports...", inputs.len());
    }

    let progress_bar = if args.quiet {
        None
    } else {
        Some(create_progress_bar(inputs.len() as u64))
    };

    let extraction = analysis::extract_all(&inputs, config.report.naming, progress_bar.as_ref());

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }
    let extraction = extraction?;

    for vector in &extraction.vectors {
        debug!("{} <- {}", vector.sample, vector.source.display());
    }
    for path in &extraction.skipped {
        debug!("Skipped {}", path.display());
    }

    // Step 3: Merge into one table
    let table = analysis::aggregate(&extraction.vectors)?;

    for sample in analysis::duplicate_samples(&table) {
        warn!(
            "Sample name '{}' occurs more than once (naming rule: {})",
            sample, config.report.naming
        );
    }
    let partial = analysis::partial_positions(&table);
    if !partial.is_empty() {
        info!(
            "{} positions are missing in some samples: {}",
            partial.len(),
            partial.join(", ")
        );
    }
    for (sample, mean) in analysis::sample_means(&table) {
        match mean {
            Some(m) => debug!("{}: overall mean quality {:.2}", sample, m),
            None => debug!("{}: no mean quality values", sample),
        }
    }

    // Step 4: Write the table
    report::write_report(&table, &output, &config.report)?;

    let duration = start_time.elapsed().as_secs_f64();

    // Print summary
    if !args.quiet {
        println!("\n📊 Aggregation Summary:");
        println!("   Reports read: {}", extraction.total());
        println!("   Samples: {}", table.sample_count());
        println!("   Positions: {}", table.position_count());
        println!("   Empty cells: {}", table.missing_cells());
        if !extraction.skipped.is_empty() {
            println!(
                "   ⚠️  Without per-base quality: {}",
                extraction.skipped.len()
            );
        }
        println!("   Duration: {:.1}s", duration);
        println!("\n✅ Table saved to: {}", output.display());
    }

    // Check --fail-on-missing
    if args.fail_on_missing && !extraction.skipped.is_empty() {
        eprintln!(
            "\n⛔ {} reports had no per-base sequence quality section. Failing (exit code 2).",
            extraction.skipped.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Reports named on the command line, or found under the configured root.
fn resolve_inputs(args: &Args, config: &Config) -> Result<Vec<PathBuf>> {
    if !args.inputs.is_empty() {
        debug!("Using {} reports from the command line", args.inputs.len());
        return Ok(args.inputs.clone());
    }

    let Some(ref root) = config.scanner.root else {
        bail!("No reports given: pass report paths or --root <DIR>");
    };

    info!("Scanning {} for *{}", root, config.scanner.pattern);
    let scan_config = scanner::ScanConfig::from(&config.scanner);
    let report_scanner = scanner::ReportScanner::new(PathBuf::from(root), scan_config);
    report_scanner.scan()
}

/// Handle --dry-run: print the reports that would be read, exit.
fn handle_dry_run(inputs: &[PathBuf]) -> Result<i32> {
    println!("\n🔍 Dry run: no reports are parsed.\n");

    if inputs.is_empty() {
        println!("   No matching reports found.");
    } else {
        println!("   Found {} reports that would be read:\n", inputs.len());
        for path in inputs {
            println!("     📄 {}", path.display());
        }
    }

    println!("\n✅ Dry run complete.");
    Ok(0)
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => debug!("Invalid progress template: {}", e),
    }
    pb
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
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
