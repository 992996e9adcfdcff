//! Extract command - scrape one case.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use serde::Serialize;
use tracing::info;

use docscrape_core::{CaseExtractor, CaseFailure, CaseId, ExtractedAddress, ExtractedDemand, Stage};

use super::{build_pipeline, load_config, FieldArg};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Case number (document file names start with it)
    case: String,

    /// Directory holding the case's scanned PDFs
    #[arg(short, long)]
    docs: PathBuf,

    /// Fields to extract
    #[arg(long, value_enum, default_value = "all")]
    field: FieldArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the cropped cover sheet fields as PNGs in this directory
    #[arg(long)]
    dump_crops: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum FieldReport<T> {
    Passed { value: T },
    Failed { stage: Stage, error: String },
}

impl<T> From<Result<T, CaseFailure>> for FieldReport<T> {
    fn from(outcome: Result<T, CaseFailure>) -> Self {
        match outcome {
            Ok(value) => FieldReport::Passed { value },
            Err(failure) => FieldReport::Failed {
                stage: failure.stage,
                error: failure.to_string(),
            },
        }
    }
}

impl<T> FieldReport<T> {
    fn failed(&self) -> bool {
        matches!(self, FieldReport::Failed { .. })
    }
}

#[derive(Serialize)]
struct CaseReport {
    case: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<FieldReport<ExtractedAddress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    demand: Option<FieldReport<ExtractedDemand>>,
}

impl CaseReport {
    fn failures(&self) -> usize {
        self.address.iter().filter(|r| r.failed()).count()
            + self.demand.iter().filter(|r| r.failed()).count()
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&args.docs, &config, args.dump_crops.as_deref())?;

    let case = CaseId::new(args.case);
    let target = docscrape_core::ExtractionTarget::from(args.field);

    let report = CaseReport {
        case: case.to_string(),
        address: target
            .includes_address()
            .then(|| pipeline.extract_address(&case).into()),
        demand: target
            .includes_demand()
            .then(|| pipeline.extract_demand(&case).into()),
    };
    info!("Case {} processed in {:?}", case, start.elapsed());

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => format_text(&report),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &rendered)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", rendered);
    }

    let failures = report.failures();
    if failures > 0 {
        anyhow::bail!("{} field(s) failed for case {}", failures, case);
    }
    Ok(())
}

fn format_text(report: &CaseReport) -> String {
    let mut lines = vec![format!("Case: {}", report.case)];

    match &report.address {
        Some(FieldReport::Passed { value }) => {
            lines.push(format!("Address: {}", value.compose()));
            lines.push(format!("  Street: {}", value.street_address));
            lines.push(format!("  City: {}", value.city));
            lines.push(format!("  State: {}", value.state));
            lines.push(format!("  Zip code: {}", value.zip_code));
        }
        Some(FieldReport::Failed { error, .. }) => lines.push(format!("Address: {}", error)),
        None => {}
    }

    match &report.demand {
        Some(FieldReport::Passed { value }) => {
            lines.push(format!("Initial demand: {} ({})", value.amount, value.source));
            for warning in &value.warnings {
                lines.push(format!("  Warning: {}", warning));
            }
        }
        Some(FieldReport::Failed { error, .. }) => {
            lines.push(format!("Initial demand: {}", error))
        }
        None => {}
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscrape_core::error::ParseError;
    use docscrape_core::DemandSource;
    use rust_decimal::Decimal;

    #[test]
    fn test_text_report_lists_values_and_failures() {
        let report = CaseReport {
            case: "CGC24000001".to_string(),
            address: Some(FieldReport::Failed {
                stage: Stage::Parsed,
                error: "failed at parsed stage: could not find zip code".to_string(),
            }),
            demand: Some(FieldReport::Passed {
                value: ExtractedDemand {
                    amount: Decimal::new(750000, 2),
                    source: DemandSource::Demand,
                    raw: "7,500.00".to_string(),
                    warnings: Vec::new(),
                },
            }),
        };

        let text = format_text(&report);
        assert!(text.contains("Case: CGC24000001"));
        assert!(text.contains("Address: failed at parsed stage"));
        assert!(text.contains("Initial demand: 7500.00 (DEMAND)"));
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn test_failure_serializes_with_stage() {
        let report: FieldReport<ExtractedDemand> =
            Err(CaseFailure::new(Stage::Parsed, ParseError::DemandNotFound)).into();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "parsed");
    }
}
