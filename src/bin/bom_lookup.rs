//! CLI tool: extract parts lists from drawings and locate their files

use bom_lookup::{process_documents, DocumentReport, LookupOptions, MatchMode};
use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "bom-lookup")]
#[command(about = "Extract BOM tables from drawing PDFs and find matching files", long_about = None)]
struct Cli {
    /// Drawing PDFs to read
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,

    /// Reference folder holding drawings and 3D models
    #[arg(short, long)]
    folder: Option<PathBuf>,

    /// Filename matching (exact/startswith/contains)
    #[arg(short, long, default_value = "contains")]
    mode: MatchMode,

    /// Only scan the top level of the reference folder
    #[arg(long)]
    no_recursive: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = LookupOptions {
        match_mode: cli.mode,
        recursive: !cli.no_recursive,
        ..LookupOptions::default()
    };

    let reports = match process_documents(&cli.pdfs, cli.folder.as_deref(), &options) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    } else {
        for report in &reports {
            print_report(report, cli.folder.is_some());
        }
    }
}

fn print_report(report: &DocumentReport, with_matches: bool) {
    println!("=== {} ===", report.document.display());

    if let Some(error) = report.outcome.error() {
        println!("  failed: {}", error);
        println!();
        return;
    }

    let rows = report.outcome.rows();
    if rows.is_empty() {
        println!("  (no parts table found)");
        println!();
        return;
    }

    for row in rows {
        println!(
            "  {:<20} {:<30} qty={:<4} {}",
            row.part_number, row.title, row.qty, row.material
        );
        if !with_matches {
            continue;
        }
        if let Some(result) = report.matches.get(&row.part_number) {
            println!("      -> {}", result.status);
            for file in &result.pdf_files {
                println!("         pdf:   {}", file.path.display());
            }
            for file in &result.model_files {
                println!("         model: {}", file.path.display());
            }
        }
    }
    println!();
}
