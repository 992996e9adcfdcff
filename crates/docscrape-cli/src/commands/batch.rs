//! Batch command - scrape every case listed in a CSV table.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use docscrape_core::batch::{BatchDriver, BatchSummary, CaseProgress, CaseTable, FailureRecord};

use super::{build_pipeline, load_config, FieldArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input CSV with one row per case document
    input: PathBuf,

    /// Directory holding the scanned PDFs
    #[arg(short, long)]
    docs: PathBuf,

    /// Output CSV (defaults to <input>_scraped.csv next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fields to extract
    #[arg(long, value_enum, default_value = "all")]
    field: FieldArg,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Print extracted values as each case finishes
    #[arg(long)]
    print: bool,

    /// Save the cropped cover sheet fields as PNGs in this directory
    #[arg(long)]
    dump_crops: Option<PathBuf>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input table not found: {}", args.input.display());
    }
    let mut table = CaseTable::from_path(&args.input)?;
    let case_column = table.require_column(&config.batch.case_column)?;
    let total = table.case_ids(case_column).len();
    debug!("{} rows, {} cases in {}", table.len(), total, args.input.display());

    let pipeline = build_pipeline(&args.docs, &config, args.dump_crops.as_deref())?;
    let driver = BatchDriver::new(pipeline, config.batch.clone(), args.field.into());

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut errors = 0usize;
    let mut attempts = 0usize;
    let summary = driver.run_with(&mut table, |case| {
        progress.set_message(case.case.to_string());
        let lines = case_lines(case, args.print, &mut errors, &mut attempts);
        progress.suspend(|| {
            for line in &lines {
                println!("{}", line);
            }
        });
        progress.inc(1);
    })?;
    progress.finish_and_clear();

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    table.write_path(&output_path)?;

    if let Some(summary_path) = &args.summary {
        fs::write(summary_path, serde_json::to_string_pretty(&summary)?)?;
    }

    print_summary(&summary, &output_path, start);
    Ok(())
}

/// Console lines for one finished case, updating the running error count.
fn case_lines(
    case: &CaseProgress<'_>,
    print: bool,
    errors: &mut usize,
    attempts: &mut usize,
) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", case.index, case.case)];

    if let Some(outcome) = case.address {
        *attempts += 1;
        lines.push(match outcome {
            Ok(address) if print => format!("  {} address: {}", style("✓").green(), address.compose()),
            Ok(_) => format!("  {} address", style("✓").green()),
            Err(failure) => failure_line(failure, errors),
        });
    }

    if let Some(outcome) = case.demand {
        *attempts += 1;
        lines.push(match outcome {
            Ok(demand) if print => format!(
                "  {} initial demand: {} ({})",
                style("✓").green(),
                demand.amount,
                demand.source
            ),
            Ok(_) => format!("  {} initial demand", style("✓").green()),
            Err(failure) => failure_line(failure, errors),
        });
        if let Some(Ok(demand)) = case.demand {
            for warning in &demand.warnings {
                lines.push(format!("  {} {}", style("ℹ").blue(), warning));
            }
        }
    }

    lines.push(format!("  errors: {}/{}", errors, attempts));
    lines
}

fn failure_line(failure: &FailureRecord, errors: &mut usize) -> String {
    *errors += 1;
    format!("  {} {}: {}", style("✗").red(), failure.field, failure.message)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cases".to_string());
    input.with_file_name(format!("{}_scraped.csv", stem))
}

fn print_summary(summary: &BatchSummary, output_path: &Path, start: Instant) {
    println!();
    println!("{}", style("Batch Summary").bold().underlined());
    println!("  Cases: {}", summary.cases);
    if summary.target.includes_address() {
        println!(
            "  Address: {} passed, {} failed",
            style(summary.address.passed).green(),
            style(summary.address.failed).red()
        );
    }
    if summary.target.includes_demand() {
        println!(
            "  Initial demand: {} passed, {} failed",
            style(summary.demand.passed).green(),
            style(summary.demand.failed).red()
        );
    }
    println!("  Time: {:.2}s", start.elapsed().as_secs_f64());
    println!();
    println!(
        "{} Results written to {}",
        style("✓").green(),
        output_path.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscrape_core::{CaseId, Stage};

    #[test]
    fn test_default_output_path_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/data/cases.csv")),
            PathBuf::from("/data/cases_scraped.csv")
        );
    }

    #[test]
    fn test_case_lines_count_errors() {
        let case = CaseId::new("CGC24000001");
        let failure: Result<_, FailureRecord> = Err(FailureRecord {
            case: case.to_string(),
            field: "address".to_string(),
            stage: Stage::Located,
            message: "failed at located stage: no file".to_string(),
        });
        let progress = CaseProgress {
            index: 3,
            total: 4,
            case: &case,
            address: Some(&failure),
            demand: None,
        };

        let (mut errors, mut attempts) = (1, 4);
        let lines = case_lines(&progress, false, &mut errors, &mut attempts);

        assert_eq!(lines[0], "3: CGC24000001");
        assert!(lines[1].contains("address: failed at located stage"));
        assert_eq!(lines.last().map(String::as_str), Some("  errors: 2/5"));
    }
}
