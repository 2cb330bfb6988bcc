//! pdfjson CLI - structured PDF extraction to JSON

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfjson::{render, Document, ExtractOptions, Extractor, JsonFormat};

#[derive(Parser)]
#[command(name = "pdfjson")]
#[command(version)]
#[command(about = "Extract paragraphs, tables and charts from a PDF into sectioned JSON", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "INPUT_PDF")]
    input: PathBuf,

    /// Output JSON file (defaults to the input path with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Skip the image pass (no chart items)
    #[arg(long)]
    no_images: bool,

    /// Do not consult fallback table readers
    #[arg(long)]
    no_fallback_tables: bool,

    /// Write single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Non-fatal problems stay silent unless `-v` or `RUST_LOG` asks for them.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let options = ExtractOptions::new()
        .with_images(!cli.no_images)
        .with_fallback_tables(!cli.no_fallback_tables);
    let format = if cli.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    log::debug!(
        "Extracting {} to {} ({:?})",
        cli.input.display(),
        output.display(),
        format
    );

    let pb = spinner();
    pb.set_message(format!("Extracting {}...", cli.input.display()));
    let doc = match Extractor::new().with_options(options).extract(&cli.input) {
        Ok(doc) => doc,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    pb.set_message("Writing JSON...");
    let written = render::write_json(&doc, &output, format);
    pb.finish_and_clear();
    written?;

    print_summary(&doc, &output);
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// `report.pdf` -> `report.json`, next to the input.
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("json")
}

fn print_summary(doc: &Document, output: &Path) {
    let (paragraphs, tables, charts) = doc.pages.iter().fold((0, 0, 0), |acc, page| {
        (
            acc.0 + page.paragraph_count(),
            acc.1 + page.table_count(),
            acc.2 + page.chart_count(),
        )
    });

    println!("{} {}", "Saved to".green(), output.display());
    println!("  {} {} pages", "├─".dimmed(), doc.page_count());
    println!("  {} {} paragraphs", "├─".dimmed(), paragraphs);
    println!("  {} {} tables", "├─".dimmed(), tables);
    println!("  {} {} charts", "└─".dimmed(), charts);
}
