//! # CLI Module
//!
//! Command-line interface for the photo batch ingest tool.
//!
//! ## Usage
//! ```bash
//! # Inspect what a batch run would pick up
//! photo-ingest scan ~/Excavations/2006
//!
//! # Evaluate every record without touching anything
//! photo-ingest run ~/Excavations/2006 --output-dir ~/ingest-out --dry-run
//!
//! # Full processing into a staging area, sources untouched
//! photo-ingest run ~/Excavations/2006 --output-dir ~/ingest-out --staging
//!
//! # The real thing: renames in place, containers in the output directory
//! photo-ingest run ~/Excavations/2006 --output-dir ~/ingest-out
//! ```

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_batch_ingest::core::pipeline::{BatchMode, BatchOutcome, BatchRunner};
use photo_batch_ingest::core::sets::{discover, Discovery, SetStructure};
use photo_batch_ingest::error::Result;
use photo_batch_ingest::events::{BatchEvent, Event, EventChannel, ScanEvent};
use std::path::PathBuf;
use std::thread;

/// Photo Batch Ingest - Archive packaging without surprises
#[derive(Parser, Debug)]
#[command(name = "photo-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover photo sets without processing anything
    Scan {
        /// Root of the source tree
        root: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run a batch: convert, rename, package, audit
    Run {
        /// Root of the source tree
        root: PathBuf,

        /// Directory that receives the containers
        #[arg(long)]
        output_dir: PathBuf,

        /// Evaluate every record but modify nothing
        #[arg(long)]
        dry_run: bool,

        /// Keep every artifact under a staging subdirectory; sources stay untouched
        #[arg(long)]
        staging: bool,

        /// Audit report path (defaults to the local data directory)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            output,
            verbose,
        } => run_scan(root, output, verbose),
        Commands::Run {
            root,
            output_dir,
            dry_run,
            staging,
            report,
            output,
            verbose,
        } => run_batch_command(root, output_dir, dry_run, staging, report, output, verbose),
    }
}

fn run_scan(root: PathBuf, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Photo Batch Ingest").bold().cyan(),
            style("v0.1.0").dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let discovery = discover(&root)?;

    match output {
        OutputFormat::Pretty => print_pretty_discovery(&term, &discovery, verbose),
        OutputFormat::Json => print_json_discovery(&discovery),
        OutputFormat::Minimal => print_minimal_discovery(&discovery),
    }

    Ok(())
}

fn run_batch_command(
    root: PathBuf,
    output_dir: PathBuf,
    dry_run: bool,
    staging: bool,
    report: Option<PathBuf>,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    let (mode, precedence_applied) = BatchMode::from_flags(dry_run, staging);

    // Print header
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Photo Batch Ingest").bold().cyan(),
            style("v0.1.0").dim()
        ))
        .ok();
        if precedence_applied {
            term.write_line(&format!(
                "{} --dry-run wins over --staging; running in Preview mode",
                style("note:").yellow().bold()
            ))
            .ok();
        }
        term.write_line(&format!("  mode: {}", style(mode).cyan())).ok();
        term.write_line("").ok();
    }

    // Default report location
    let report_path = report.unwrap_or_else(|| {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("photo-ingest")
            .join(format!("batch_report_{stamp}.csv"))
    });

    // Build runner
    let runner = BatchRunner::builder(&root, &output_dir)
        .mode(mode)
        .report_path(&report_path)
        .build();
    let work_dir = runner.context().work_dir.clone();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose_clone = verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Scan(ScanEvent::DirectorySkipped { path, message }) => {
                    if let Some(ref pb) = progress_clone {
                        if verbose_clone {
                            pb.println(format!("skipped {}: {message}", path.display()));
                        }
                    }
                }
                Event::Batch(BatchEvent::Started {
                    mode,
                    total_sets,
                    total_records,
                }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total_records as u64);
                        pb.set_message(format!("{mode}, {total_sets} set(s)"));
                    }
                }
                Event::Batch(BatchEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Batch(BatchEvent::RecordFinished { identifier, status }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.inc(1);
                        if verbose_clone {
                            pb.set_message(format!("{identifier}: {status}"));
                        }
                    }
                }
                Event::Batch(BatchEvent::Completed { .. })
                | Event::Batch(BatchEvent::Failed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    // Run the batch
    let outcome = runner.run_with_events(&sender)?;

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    // Output results
    match output {
        OutputFormat::Pretty => print_pretty_outcome(&term, &outcome, &work_dir),
        OutputFormat::Json => print_json_outcome(&outcome),
        OutputFormat::Minimal => println!("{}", outcome.report_path.display()),
    }

    Ok(())
}

fn print_pretty_discovery(term: &Term, discovery: &Discovery, verbose: bool) {
    term.write_line(&format!("{} Discovery Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} photo set(s), {} record(s)",
        style(discovery.sets.len()).cyan(),
        style(discovery.record_count()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} structural defect(s)",
        style(discovery.defects.len()).cyan()
    ))
    .ok();
    if !discovery.scan_errors.is_empty() {
        term.write_line(&format!(
            "  {} director(ies) skipped",
            style(discovery.scan_errors.len()).yellow()
        ))
        .ok();
    }
    term.write_line("").ok();

    if !discovery.sets.is_empty() {
        term.write_line(&format!("{}", style("Sets:").bold().underlined()))
            .ok();
        for set in &discovery.sets {
            let structure = match set.structure {
                SetStructure::Standard => "standard",
                SetStructure::Hierarchical => "hierarchical",
            };
            term.write_line(&format!(
                "  {} [{}] {} record(s), {} image(s)",
                display_path(&set.base_dir),
                structure,
                set.record_count(),
                set.images.len()
            ))
            .ok();
            if verbose {
                term.write_line(&format!(
                    "    {} {}",
                    style("manifest:").dim(),
                    display_path(&set.manifest)
                ))
                .ok();
            }
        }
        term.write_line("").ok();
    }

    if !discovery.defects.is_empty() {
        term.write_line(&format!("{}", style("Defects:").bold().underlined()))
            .ok();
        for defect in &discovery.defects {
            term.write_line(&format!("  {} {}", style("✗").red(), defect)).ok();
        }
        term.write_line("").ok();
    }

    if verbose {
        for error in &discovery.scan_errors {
            term.write_line(&format!("  {} {}", style("skipped:").dim(), error))
                .ok();
        }
    }
}

fn print_json_discovery(discovery: &Discovery) {
    let output = serde_json::json!({
        "sets": discovery.sets,
        "defects": discovery.defects,
        "set_count": discovery.sets.len(),
        "record_count": discovery.record_count(),
        "defect_count": discovery.defects.len(),
        "skipped_directories": discovery.scan_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn print_minimal_discovery(discovery: &Discovery) {
    for set in &discovery.sets {
        println!("{}", set.base_dir.display());
    }
}

fn print_pretty_outcome(term: &Term, outcome: &BatchOutcome, work_dir: &PathBuf) {
    term.write_line("").ok();
    term.write_line(&format!("{} Batch Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} record(s) succeeded in {:.1}s",
        style(outcome.success_count).cyan(),
        outcome.duration_ms as f64 / 1000.0
    ))
    .ok();

    if outcome.error_count > 0 {
        term.write_line(&format!(
            "  {} error(s)",
            style(outcome.error_count).red()
        ))
        .ok();
    }
    if outcome.warning_count > 0 {
        term.write_line(&format!(
            "  {} warning(s)",
            style(outcome.warning_count).yellow()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} {}",
        style("report:").dim(),
        display_path(&outcome.report_path)
    ))
    .ok();

    if outcome.mode.mutates_filesystem() {
        term.write_line(&format!(
            "  {} {}",
            style("containers:").dim(),
            display_path(work_dir)
        ))
        .ok();
    }

    // Reconciliation findings
    if let Some(reconciliation) = &outcome.reconciliation {
        if !reconciliation.is_clean() {
            term.write_line("").ok();
            term.write_line(&format!(
                "{}",
                style("Reconciliation findings:").bold().underlined()
            ))
            .ok();
            for discrepancy in &reconciliation.discrepancies {
                term.write_line(&format!("  {} {}", style("✗").red(), discrepancy))
                    .ok();
            }
            for (container, problem) in &reconciliation.invalid_containers {
                term.write_line(&format!(
                    "  {} {}: {problem}",
                    style("✗").red(),
                    display_path(container)
                ))
                .ok();
            }
            for orphan in &reconciliation.orphaned_intermediates {
                term.write_line(&format!(
                    "  {} orphaned intermediate {}",
                    style("!").yellow(),
                    display_path(orphan)
                ))
                .ok();
            }
        }
    }

    term.write_line("").ok();

    // Footer
    let footer = match outcome.mode {
        BatchMode::Preview => "Preview run: no files were modified.",
        BatchMode::Staged => "Staged run: sources untouched, artifacts are in the staging area.",
        BatchMode::Committed => "Committed run: source directories were modified in place.",
    };
    term.write_line(&format!("{}", style(footer).dim())).ok();
}

fn print_json_outcome(outcome: &BatchOutcome) {
    println!("{}", serde_json::to_string_pretty(outcome).unwrap());
}

fn display_path(path: &PathBuf) -> String {
    if path.starts_with(dirs::home_dir().unwrap_or_default()) {
        format!(
            "~/{}",
            path.strip_prefix(dirs::home_dir().unwrap_or_default())
                .unwrap()
                .display()
        )
    } else {
        path.display().to_string()
    }
}
