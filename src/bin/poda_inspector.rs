//! CLI for auditing pruning-report photos
//!
//! Accepts PDFs and ZIP archives of PDFs, prints one result block per
//! document and writes the XLSX summary.

use clap::Parser;
use poda_inspector::workbook::DEFAULT_OUTPUT;
use poda_inspector::{run_batch, MatchConfig, Upload};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "poda-inspector", about = "Audit photo evidence in tree-pruning PDF reports")]
struct Args {
    /// PDF or ZIP files to audit
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Path of the XLSX summary
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Maximum horizontal offset between a caption and its image
    #[arg(long, default_value_t = 100.0)]
    tol_x: f32,

    /// Maximum distance from a caption down to its image
    #[arg(long, default_value_t = 400.0)]
    tol_y: f32,

    /// Item codes must start left of this x position
    #[arg(long, default_value_t = 50.0)]
    margin: f32,

    /// Photo captions per inspected item
    #[arg(long, default_value_t = 4)]
    labels_per_item: usize,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = MatchConfig {
        horizontal_tolerance: args.tol_x,
        vertical_tolerance: args.tol_y,
        margin_threshold: args.margin,
        labels_per_item: args.labels_per_item,
    };

    let uploads = match args.inputs.iter().map(Upload::from_path).collect::<Result<Vec<_>, _>>() {
        Ok(uploads) => uploads,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let report = match run_batch(&uploads, &config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    for outcome in &report.outcomes {
        let block = outcome.result_block();
        println!("{}", outcome.file_name());
        println!("{}", block.header);
        println!("{}", block.text());
        println!();
    }

    let workbook = report.workbook();
    if workbook.is_empty() {
        println!("No documents processed, nothing to export");
        return;
    }

    if let Err(e) = workbook.write_to_path(&args.output) {
        eprintln!("Error writing {}: {}", args.output.display(), e);
        process::exit(1);
    }
    println!("Summary written to: {}", args.output.display());
}
