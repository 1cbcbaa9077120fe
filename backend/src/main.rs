//! Curate CLI - Build the curated layer from raw CRM/ERP extracts
//!
//! # Main Commands
//!
//! ```bash
//! curate run                        # Replace all six curated tables
//! curate run --json                 # Same, report printed as JSON
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! curate table crm_prd_info         # Curate one table to JSON, no store write
//! curate check                      # Audit an existing curated directory
//! curate tables                     # List tables and their raw extracts
//! ```

use chrono::Local;
use clap::{Parser, Subcommand};
use curate::transform::tables;
use curate::{
    audit, Config, CsvDirStore, CsvSource, FanoutSink, JsonLinesSink, Orchestrator, RunReport,
    Table, TracingSink,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "curate")]
#[command(about = "Cleanse and reconcile raw CRM/ERP extracts into curated tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over all six tables
    Run {
        /// Directory holding source_crm/ and source_erp/
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Directory receiving the curated tables
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append run events as JSON lines to this file
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Skip the quality audit
        #[arg(long)]
        no_checks: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Curate a single table and print it as JSON
    Table {
        /// Table name (e.g. crm_cust_info)
        table: Table,

        /// Directory holding source_crm/ and source_erp/
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Audit the curated tables of an output directory
    Check {
        /// Directory holding the curated tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the tables in processing order
    Tables,
}

fn init_tracing() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            source,
            output,
            events,
            no_checks,
            json,
        } => cmd_run(source, output, events, no_checks, json),

        Commands::Table {
            table,
            source,
            output,
        } => cmd_table(table, source, output.as_deref()),

        Commands::Check { output } => cmd_check(output),

        Commands::Tables => cmd_tables(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Environment configuration with command-line overrides applied.
fn load_config(
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    events: Option<PathBuf>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(dir) = source {
        config = config.with_source_dir(dir);
    }
    if let Some(dir) = output {
        config = config.with_output_dir(dir);
    }
    if let Some(path) = events {
        config = config.with_events_file(path);
    }
    Ok(config)
}

fn cmd_run(
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    events: Option<PathBuf>,
    no_checks: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(source, output, events)?;
    if no_checks {
        config = config.with_quality_checks(false);
    }

    eprintln!("Source: {}", config.source_dir.display());
    eprintln!("Output: {}", config.output_dir.display());

    let mut sink = FanoutSink::new().with(TracingSink);
    if let Some(ref path) = config.events_file {
        sink = sink.with(JsonLinesSink::create(path)?);
        eprintln!("Events: {}", path.display());
    }

    let mut orchestrator = Orchestrator::new(
        CsvSource::new(&config.source_dir),
        CsvDirStore::new(&config.output_dir),
        sink,
    )
    .with_quality_checks(config.quality_checks);

    match orchestrator.run() {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(failure) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&failure.descriptor())?);
            } else {
                let descriptor = failure.descriptor();
                eprintln!(
                    "\nRun {} aborted after {} ms ({} of {} tables replaced)",
                    failure.run_id,
                    failure.duration_ms,
                    failure.completed.len(),
                    Table::ALL.len()
                );
                eprintln!("   Table: {}", descriptor.table);
                eprintln!("   Code: {}", descriptor.code);
                eprintln!("   Severity: {:?}", descriptor.severity);
            }
            Err(failure.into())
        }
    }
}

fn print_report(report: &RunReport) {
    println!("Run {} completed in {} ms\n", report.run_id, report.duration_ms);
    println!("  {:<20} {:>10} {:>10} {:>10} {:>9}", "table", "read", "written", "ms", "findings");
    for t in &report.tables {
        println!(
            "  {:<20} {:>10} {:>10} {:>10} {:>9}",
            t.table.name(),
            t.rows_read,
            t.rows_written,
            t.duration_ms,
            t.findings.len()
        );
    }
    println!("\n  {} rows written, {} quality findings", report.rows_written(), report.findings());
}

fn cmd_table(
    table: Table,
    source: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(source, None, None)?;
    let source = CsvSource::new(&config.source_dir);
    eprintln!("Curating {} from {}", table, source.path_of(table).display());

    let curated = tables::curate(table, &source, Local::now().naive_local())?;
    eprintln!("   Read {} rows, curated {}", curated.rows_read, curated.records.len());

    let json = serde_json::to_string_pretty(&curated.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_check(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(None, output, None)?;
    let store = CsvDirStore::new(&config.output_dir);
    eprintln!("Auditing: {}", store.dir().display());

    let mut total = 0;
    for table in Table::ALL {
        let records = store.load(table)?;
        let findings = audit(&records);
        eprintln!("   {}: {} rows, {} findings", table, records.len(), findings.len());
        for issue in findings.iter().take(5) {
            eprintln!("     - row {} [{}] {}", issue.row, issue.check, issue.message);
        }
        total += findings.len();
    }

    eprintln!("\nResults: {} findings", total);

    if total > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_tables() -> Result<(), Box<dyn std::error::Error>> {
    for table in Table::ALL {
        println!("{:<20} {}", table.name(), table.source_path());
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
