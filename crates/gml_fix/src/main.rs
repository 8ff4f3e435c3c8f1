//! gml-fix CLI - apply Feather fixes to GML files
//!
//! Usage: gml-fix [OPTIONS] [PATHS]...

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use gml_diagnostics::{DiagnosticCatalog, FixDetail, LineIndex};
use gml_feather::{builtin_catalog, fix_source, load_catalog, FixOptions};
use jwalk::WalkDir;
use memmap2::Mmap;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt::Write as _;
use std::fs::File;
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Applies automatic fixes for GameMaker Feather diagnostics
#[derive(Parser, Debug)]
#[command(name = "gml-fix")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Files or directories to fix
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Diagnostic catalog (JSON array); defaults to the built-in catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine options (JSON object)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Only run these diagnostics (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Skip these diagnostics (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Option<Vec<String>>,

    /// Delete an unmatched vertex_end instead of adding a vertex_begin
    #[arg(long)]
    remove_standalone_vertex_end: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Also list diagnostics that need a manual fix
    #[arg(long)]
    manual: bool,

    /// Show statistics
    #[arg(long)]
    statistics: bool,

    /// Suppress output (exit code only)
    #[arg(short, long)]
    quiet: bool,
}

/// What happened to one file
enum FileOutcome {
    Fixed(Vec<FixDetail>),
    Failed(String),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli)
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();

    let catalog = build_catalog(&cli)?;
    let options = build_options(&cli)?;
    debug!(diagnostics = catalog.len(), "catalog loaded");

    // 1. Discovery
    let discover_start = Instant::now();
    let (paths, mut failures) = discover(&cli.paths);
    let discover_time = discover_start.elapsed();

    if paths.is_empty() && failures == 0 {
        if !cli.quiet {
            println!("{}", "No GML files found (checked extensions: .gml)".yellow());
        }
        return Ok(());
    }

    // 2. Read in parallel
    let read_start = Instant::now();
    let files: Vec<(PathBuf, Option<String>)> = paths
        .into_par_iter()
        .map(|path| {
            let content = read_file_fast(&path);
            (path, content)
        })
        .collect();
    let read_time = read_start.elapsed();

    if !cli.quiet && cli.format == "text" {
        println!("{}", format!("Fixing {} file(s)...", files.len()).cyan().bold());
    }

    // 3. Fix in parallel, one tree per file
    let fix_start = Instant::now();
    let results: Vec<(PathBuf, &str, FileOutcome)> = files
        .par_iter()
        .map(|(path, content)| {
            let Some(content) = content else {
                return (path.clone(), "", FileOutcome::Failed("could not read file as UTF-8".to_string()));
            };
            let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| fix_source(content, &catalog, &options)));
            let outcome = match outcome {
                Ok(Ok(fixed)) => FileOutcome::Fixed(fixed.fixes),
                Ok(Err(e)) => FileOutcome::Failed(e.to_string()),
                Err(_) => FileOutcome::Failed("internal error (panic while fixing)".to_string()),
            };
            (path.clone(), content.as_str(), outcome)
        })
        .collect();
    let fix_time = fix_start.elapsed();

    // 4. Report
    let mut output_buffer = String::with_capacity(16384);
    let mut automatic = 0;
    let mut manual = 0;
    let mut touched = 0;

    for (path, content, outcome) in &results {
        match outcome {
            FileOutcome::Failed(message) => {
                failures += 1;
                if !cli.quiet {
                    eprintln!("{}: {}", path.display().to_string().red(), message);
                }
            }
            FileOutcome::Fixed(fixes) => {
                let lines = LineIndex::new(content);
                let mut any = false;
                for fix in fixes {
                    if fix.automatic {
                        automatic += 1;
                        any = true;
                    } else {
                        manual += 1;
                        if !cli.manual {
                            continue;
                        }
                    }
                    if !cli.quiet {
                        format_fix_buffered(&mut output_buffer, path, fix, &cli.format, &lines);
                    }
                }
                if any {
                    touched += 1;
                }
            }
        }
    }

    if !cli.quiet {
        use std::io::Write;
        let stdout = std::io::stdout();
        let mut handle = std::io::BufWriter::new(stdout.lock());
        let _ = write!(handle, "{}", output_buffer);
    }

    let duration = start.elapsed();

    if !cli.quiet && cli.format == "text" {
        println!();
        if automatic == 0 {
            println!("{}", "No fixes needed!".green().bold());
        } else {
            println!(
                "{}",
                format!("Applied {} fix(es) in {} file(s)", automatic, touched).green().bold()
            );
        }
        if manual > 0 && !cli.manual {
            println!(
                "{}",
                format!("{} diagnostic(s) need a manual fix (run with --manual to list them)", manual).yellow()
            );
        }
    }

    if cli.statistics {
        let file_count = results.len();
        println!(
            "\nProcessed {} files in {:.2}ms ({:.0} files/sec)",
            file_count,
            duration.as_secs_f64() * 1000.0,
            file_count as f64 / duration.as_secs_f64().max(f64::EPSILON),
        );
        println!("  Discovery: {:>8.2}ms", discover_time.as_secs_f64() * 1000.0);
        println!("  Reading:   {:>8.2}ms", read_time.as_secs_f64() * 1000.0);
        println!("  Fixing:    {:>8.2}ms", fix_time.as_secs_f64() * 1000.0);
    }

    if failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn build_catalog(cli: &Cli) -> Result<DiagnosticCatalog> {
    let mut catalog = match &cli.catalog {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            load_catalog(&text).with_context(|| format!("parsing catalog {}", path.display()))?
        }
        None => builtin_catalog(),
    };

    let known: FxHashSet<String> = catalog.iter().map(|d| d.id.clone()).collect();
    for (flag, ids) in [("--select", &cli.select), ("--ignore", &cli.ignore)] {
        for id in ids.iter().flatten() {
            if !known.contains(id) {
                eprintln!("{} Unknown diagnostic id in {}: {}", "warning".yellow().bold(), flag, id);
            }
        }
    }

    if let Some(select) = &cli.select {
        catalog.retain(|d| select.contains(&d.id));
    }
    if let Some(ignore) = &cli.ignore {
        catalog.retain(|d| !ignore.contains(&d.id));
    }
    Ok(catalog)
}

fn build_options(cli: &Cli) -> Result<FixOptions> {
    let mut options = match &cli.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading options {}", path.display()))?;
            FixOptions::from_json(&text).with_context(|| format!("parsing options {}", path.display()))?
        }
        None => FixOptions::default(),
    };
    if cli.remove_standalone_vertex_end {
        options.remove_standalone_vertex_end = true;
    }
    Ok(options)
}

/// Expand the given paths into a sorted list of `.gml` files. Also returns
/// how many of the given paths did not exist.
fn discover(roots: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut files = Vec::new();
    let mut missing = 0;

    for root in roots {
        if root.is_file() {
            files.push(root.clone());
        } else if root.is_dir() {
            for entry in WalkDir::new(root).into_iter().flatten() {
                let path = entry.path();
                if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "gml") {
                    files.push(path);
                }
            }
        } else {
            warn!(path = %root.display(), "path does not exist");
            missing += 1;
        }
    }

    files.sort();
    files.dedup();
    (files, missing)
}

fn format_fix_buffered(buffer: &mut String, path: &Path, fix: &FixDetail, format: &str, lines: &LineIndex) {
    let position = fix.range.map(|range| lines.line_col(range.start));

    if format == "json" {
        let (line, column) = position.unzip();
        let record = serde_json::json!({
            "file": path.display().to_string(),
            "line": line,
            "column": column,
            "fix": fix,
        });
        let _ = writeln!(buffer, "{}", record);
        return;
    }

    let location = match position {
        Some((line, column)) => format!("{}:{}:{}", path.display(), line, column),
        None => path.display().to_string(),
    };
    let status = if fix.automatic { "fixed".green().bold() } else { "manual".yellow().bold() };
    let _ = write!(buffer, "{}: {} [{}]: {}", location.white().bold(), status, fix.id.cyan(), fix.title);
    match (&fix.target, &fix.replacement) {
        (Some(target), Some(replacement)) => {
            let _ = write!(buffer, " ({} -> {})", target, replacement);
        }
        (Some(target), None) => {
            let _ = write!(buffer, " ({})", target);
        }
        _ => {}
    }
    buffer.push('\n');
}

/// Read a file using memory-mapped I/O for better performance.
/// Falls back to regular read for small files (< 4KB).
fn read_file_fast(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let len = file.metadata().ok()?.len() as usize;

    if len < 4096 {
        return std::fs::read_to_string(path).ok();
    }

    // SAFETY: the map is only read, and copied into an owned String right away
    let mmap = unsafe { Mmap::map(&file).ok()? };
    std::str::from_utf8(&mmap).ok().map(str::to_string)
}
