//! reclaim - Find duplicate, junk and stale large files worth cleaning up.
//!
//! Usage:
//!   reclaim scan [PATH]         Full scan with all analyses
//!   reclaim quick               Scan the usual clutter locations in home
//!   reclaim duplicates [PATH]   Find duplicate files
//!   reclaim junk [PATH]         Find caches, logs, temp files and build output
//!   reclaim large [PATH]        Find large files and how long since last use
//!   reclaim estimate [PATH]     Estimate the number of files
//!   reclaim rules               List the junk rules
//!   reclaim --help              Show help

mod logging;
mod report;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread::{self, JoinHandle};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use reclaim_analyze::{
    DEFAULT_RULES, LargeFileStats, group_by_category, rules_by_category, total_wasted,
};
use reclaim_core::{JunkCategory, ScanOptions, ScanResult, ScanUpdate};
use reclaim_engine::ScanCoordinator;
use reclaim_scan::estimate_file_count;

use crate::logging::init_logging;
use crate::report::format_size;

#[derive(Parser)]
#[command(
    name = "reclaim",
    version,
    about = "Find duplicate, junk and stale large files that are safe to reclaim",
    long_about = "reclaim walks a directory tree and reports byte-identical duplicates, \
                  junk files (caches, logs, temp files, build output, old installers) and \
                  large files that have not been used for months.\n\n\
                  Nothing is ever deleted; the report lists what could be."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Load scan options from a TOML file (flags override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Do not show the progress line
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full scan: duplicates, junk and large files
    Scan {
        /// Path to scan (defaults to the home directory)
        path: Option<PathBuf>,

        /// Skip duplicate detection
        #[arg(long)]
        skip_duplicates: bool,

        /// Skip junk classification
        #[arg(long)]
        skip_junk: bool,

        /// Skip large file detection
        #[arg(long)]
        skip_large: bool,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Scan Downloads, Library/Caches, Library/Logs, Desktop and Documents
    Quick {
        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Find duplicate files
    Duplicates {
        /// Path to scan (defaults to the home directory)
        path: Option<PathBuf>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Find junk files
    Junk {
        /// Path to scan (defaults to the home directory)
        path: Option<PathBuf>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Find large files
    Large {
        /// Path to scan (defaults to the home directory)
        path: Option<PathBuf>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Estimate the number of files below a path
    Estimate {
        /// Path to sample (defaults to the home directory)
        path: Option<PathBuf>,
    },

    /// List the built-in junk rules in evaluation order
    Rules {
        /// Only show rules of this category
        #[arg(long, value_parser = parse_category)]
        category: Option<JunkCategory>,
    },
}

/// Scan options shared by every scanning subcommand.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Maximum directory depth below the root
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Minimum size for duplicate candidates (e.g., "1KB", "1MB")
    #[arg(long, value_parser = parse_size)]
    min_duplicate_size: Option<u64>,

    /// Minimum size for the large file report (e.g., "100MB", "1GB")
    #[arg(long, value_parser = parse_size)]
    large_size: Option<u64>,

    /// Number of hashing threads (0 = all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Sample the tree first for a steadier traversal progress
    #[arg(long)]
    calibrate: bool,

    /// Number of entries to show per section
    #[arg(short = 'n', long, default_value = "20")]
    top: usize,
}

impl TuningArgs {
    fn apply(&self, options: &mut ScanOptions) {
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        if let Some(size) = self.min_duplicate_size {
            options.min_duplicate_size = size;
        }
        if let Some(size) = self.large_size {
            options.large_file_min_size = size;
        }
        if let Some(threads) = self.threads {
            options.hash_threads = threads;
        }
        options.follow_symlinks |= self.follow_symlinks;
        options.calibrate_progress |= self.calibrate;
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Which sections a subcommand prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
    All,
    Duplicates,
    Junk,
    Large,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let base = load_options(cli.config.as_deref())?;
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .wrap_err("Cannot install Ctrl-C handler")?;

    match cli.command {
        Command::Scan {
            path,
            skip_duplicates,
            skip_junk,
            skip_large,
            tuning,
        } => {
            let mut options = resolve_options(&base, path, &tuning)?;
            options.skip_duplicates |= skip_duplicates;
            options.skip_junk |= skip_junk;
            options.skip_large |= skip_large;
            let result = run_scan(&options, None, !cli.quiet, token)?;
            print_result(&result, Report::All, tuning.top, cli.format)?;
        }
        Command::Quick { tuning } => {
            let home = dirs::home_dir().ok_or_else(|| eyre!("Cannot determine home directory"))?;
            let options = resolve_options(&base, Some(home.clone()), &tuning)?;
            let result = run_scan(&options, Some(&home), !cli.quiet, token)?;
            print_result(&result, Report::All, tuning.top, cli.format)?;
        }
        Command::Duplicates { path, tuning } => {
            let mut options = resolve_options(&base, path, &tuning)?;
            options.skip_junk = true;
            options.skip_large = true;
            let result = run_scan(&options, None, !cli.quiet, token)?;
            print_result(&result, Report::Duplicates, tuning.top, cli.format)?;
        }
        Command::Junk { path, tuning } => {
            let mut options = resolve_options(&base, path, &tuning)?;
            options.skip_duplicates = true;
            options.skip_large = true;
            let result = run_scan(&options, None, !cli.quiet, token)?;
            print_result(&result, Report::Junk, tuning.top, cli.format)?;
        }
        Command::Large { path, tuning } => {
            let mut options = resolve_options(&base, path, &tuning)?;
            options.skip_duplicates = true;
            options.skip_junk = true;
            let result = run_scan(&options, None, !cli.quiet, token)?;
            print_result(&result, Report::Large, tuning.top, cli.format)?;
        }
        Command::Estimate { path } => {
            let root = resolve_root(&base, path)?;
            run_estimate(&root, cli.format)?;
        }
        Command::Rules { category } => {
            run_rules(category, cli.format)?;
        }
    }

    Ok(())
}

/// Read scan options from a TOML file, or start from defaults.
fn load_options(config: Option<&Path>) -> Result<ScanOptions> {
    let Some(path) = config else {
        return Ok(ScanOptions::new(PathBuf::new()));
    };
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Cannot read config file {}", path.display()))?;
    let options: ScanOptions = toml::from_str(&text)
        .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
    info!(path = %path.display(), "loaded config");
    Ok(options)
}

/// Root precedence: command line, config file, home directory.
fn resolve_root(base: &ScanOptions, path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }
    if !base.root.as_os_str().is_empty() {
        return Ok(base.root.clone());
    }
    dirs::home_dir().ok_or_else(|| eyre!("Cannot determine home directory; pass a path"))
}

fn resolve_options(
    base: &ScanOptions,
    path: Option<PathBuf>,
    tuning: &TuningArgs,
) -> Result<ScanOptions> {
    let mut options = base.with_root(resolve_root(base, path)?);
    tuning.apply(&mut options);
    debug!(?options, "effective scan options");
    Ok(options)
}

/// Run the scan pipeline, rendering progress on stderr.
///
/// A quick scan is run when `quick_home` is set.
fn run_scan(
    options: &ScanOptions,
    quick_home: Option<&Path>,
    show_progress: bool,
    token: CancellationToken,
) -> Result<ScanResult> {
    let coordinator = ScanCoordinator::new();
    let renderer = show_progress.then(|| spawn_progress(coordinator.subscribe()));

    match quick_home {
        Some(home) => eprintln!("Quick scanning {}...", home.display()),
        None => eprintln!("Scanning {}...", options.root.display()),
    }
    let result = match quick_home {
        Some(home) => coordinator.quick_scan_with_cancellation(home, options, token),
        None => coordinator.scan_with_cancellation(options, token),
    };

    // Closing the channel stops the renderer.
    drop(coordinator);
    if let Some(handle) = renderer {
        let _ = handle.join();
    }

    result.wrap_err("Scan failed")
}

fn spawn_progress(mut rx: broadcast::Receiver<ScanUpdate>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stderr = io::stderr();
        loop {
            match rx.blocking_recv() {
                Ok(update) => {
                    let _ = write!(
                        stderr,
                        "\r\x1b[2K[{:>5.1}%] {}",
                        update.percent, update.message
                    );
                    let _ = stderr.flush();
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        let _ = writeln!(stderr);
    })
}

fn print_result(
    result: &ScanResult,
    sections: Report,
    top_n: usize,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            report::print_summary(result);
            if matches!(sections, Report::All | Report::Duplicates) {
                report::print_duplicates(&result.duplicates, top_n);
            }
            if matches!(sections, Report::All | Report::Junk) {
                report::print_junk(&result.junk_files, top_n);
            }
            if matches!(sections, Report::All | Report::Large) {
                report::print_large(&result.large_files, top_n);
            }
            if sections == Report::All && result.has_findings() {
                println!();
                println!(
                    " {} paths could be reclaimed ({} in duplicate copies alone)",
                    result.reclaimable_paths().len(),
                    format_size(total_wasted(&result.duplicates))
                );
            }
            println!();
        }
        OutputFormat::Json => {
            let value = match sections {
                Report::All => serde_json::to_value(result)?,
                Report::Duplicates => json!({
                    "files_scanned": result.files_scanned,
                    "total_wasted": total_wasted(&result.duplicates),
                    "groups": result.duplicates,
                }),
                Report::Junk => json!({
                    "files_scanned": result.files_scanned,
                    "categories": group_by_category(&result.junk_files),
                }),
                Report::Large => json!({
                    "files_scanned": result.files_scanned,
                    "stats": LargeFileStats::from_records(&result.large_files),
                    "files": result.large_files,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn run_estimate(root: &Path, format: OutputFormat) -> Result<()> {
    let estimate = estimate_file_count(root);
    match format {
        OutputFormat::Text => println!("~{estimate} files below {}", root.display()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "root": root, "estimate": estimate }))?
        ),
    }
    Ok(())
}

fn run_rules(category: Option<JunkCategory>, format: OutputFormat) -> Result<()> {
    let rules: Vec<_> = match category {
        Some(category) => rules_by_category(category).collect(),
        None => DEFAULT_RULES.iter().collect(),
    };

    match format {
        OutputFormat::Text => {
            for rule in rules {
                println!(
                    " {:<10} {:>2}  {:<38} {}",
                    rule.category.to_string(),
                    rule.weight,
                    rule.pattern,
                    rule.description
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
    }
    Ok(())
}

fn parse_category(s: &str) -> Result<JunkCategory, String> {
    JunkCategory::from_str(&s.to_lowercase()).map_err(|_| format!("unknown category '{s}'"))
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());

    let multiplier: u64 = match &s[digits.len()..] {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        unit => return Err(format!("unknown size unit '{unit}'")),
    };
    let num: f64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{s}'"))?;

    Ok((num * multiplier as f64) as u64)
}
