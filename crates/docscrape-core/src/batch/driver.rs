//! Sequential batch extraction over a case table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::table::CaseTable;
use crate::error::Result;
use crate::models::case::{CaseId, ExtractedAddress, ExtractedDemand};
use crate::models::config::BatchConfig;
use crate::pipeline::{CaseExtractor, CaseFailure, Stage};

pub const ADDRESS_COLUMN: &str = "address";
pub const ADDRESS_STATUS_COLUMN: &str = "automated address";
pub const ADDRESS_ERROR_COLUMN: &str = "automated address error";
pub const DEMAND_AMOUNT_COLUMN: &str = "initial demand amount";
pub const DEMAND_SOURCE_COLUMN: &str = "initial demand source";
pub const DEMAND_WARNING_COLUMN: &str = "initial demand warning";
pub const DEMAND_STATUS_COLUMN: &str = "automated initial demand";
pub const DEMAND_ERROR_COLUMN: &str = "automated initial demand error";

const PASSED: &str = "passed";
const FAILED: &str = "failed";

/// Which fields a batch run extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTarget {
    Address,
    Demand,
    All,
}

impl ExtractionTarget {
    pub fn includes_address(&self) -> bool {
        matches!(self, ExtractionTarget::Address | ExtractionTarget::All)
    }

    pub fn includes_demand(&self) -> bool {
        matches!(self, ExtractionTarget::Demand | ExtractionTarget::All)
    }
}

/// A failed field extraction for one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub case: String,
    pub field: String,
    pub stage: Stage,
    pub message: String,
}

impl FailureRecord {
    fn new(case: &CaseId, field: &str, failure: &CaseFailure) -> Self {
        Self {
            case: case.to_string(),
            field: field.to_string(),
            stage: failure.stage,
            message: failure.to_string(),
        }
    }
}

/// Pass and fail counts for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTally {
    pub passed: usize,
    pub failed: usize,
}

impl FieldTally {
    fn record<T, E>(&mut self, outcome: &std::result::Result<T, E>) {
        match outcome {
            Ok(_) => self.passed += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// What a batch run did, suitable for a JSON report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub target: ExtractionTarget,
    pub cases: usize,
    pub address: FieldTally,
    pub demand: FieldTally,
    pub failures: Vec<FailureRecord>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.address.failed + self.demand.failed
    }
}

/// Progress report handed to the observer after each case.
#[derive(Debug)]
pub struct CaseProgress<'a> {
    /// 1-based position among unique cases.
    pub index: usize,
    pub total: usize,
    pub case: &'a CaseId,
    pub address: Option<&'a std::result::Result<ExtractedAddress, FailureRecord>>,
    pub demand: Option<&'a std::result::Result<ExtractedDemand, FailureRecord>>,
}

/// Runs an extractor over every case in a table and annotates its rows.
///
/// Cases run one at a time in order of first appearance. A failing case is
/// recorded on its rows and the run moves on.
pub struct BatchDriver<E> {
    extractor: E,
    columns: BatchConfig,
    target: ExtractionTarget,
}

impl<E: CaseExtractor> BatchDriver<E> {
    pub fn new(extractor: E, columns: BatchConfig, target: ExtractionTarget) -> Self {
        Self {
            extractor,
            columns,
            target,
        }
    }

    pub fn run(&self, table: &mut CaseTable) -> Result<BatchSummary> {
        self.run_with(table, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_case` after each case.
    pub fn run_with<F>(&self, table: &mut CaseTable, mut on_case: F) -> Result<BatchSummary>
    where
        F: FnMut(&CaseProgress<'_>),
    {
        let started_at = Utc::now();
        let case_column = table.require_column(&self.columns.case_column)?;
        let document_column = table.require_column(&self.columns.document_column)?;
        self.ensure_columns(table);

        let cases = table.group_by_case(case_column);
        let total = cases.len();
        info!("Processing {} cases ({:?})", total, self.target);

        let mut summary = BatchSummary {
            started_at,
            finished_at: started_at,
            target: self.target,
            cases: total,
            address: FieldTally::default(),
            demand: FieldTally::default(),
            failures: Vec::new(),
        };

        for (position, group) in cases.iter().enumerate() {
            let case = &group.case;
            let address = self.target.includes_address().then(|| {
                let outcome = self
                    .extractor
                    .extract_address(case)
                    .map_err(|failure| FailureRecord::new(case, "address", &failure));
                let rows =
                    table.rows_labelled(&group.rows, document_column, &self.columns.cover_sheet_label);
                write_address(table, &rows, &outcome);
                summary.address.record(&outcome);
                outcome
            });

            let demand = self.target.includes_demand().then(|| {
                let outcome = self
                    .extractor
                    .extract_demand(case)
                    .map_err(|failure| FailureRecord::new(case, "initial demand", &failure));
                let rows =
                    table.rows_labelled(&group.rows, document_column, &self.columns.complaint_label);
                write_demand(table, &rows, &outcome);
                summary.demand.record(&outcome);
                outcome
            });

            for failure in address
                .iter()
                .filter_map(|o| o.as_ref().err())
                .chain(demand.iter().filter_map(|o| o.as_ref().err()))
            {
                warn!("{}: {}", failure.case, failure.message);
                summary.failures.push(failure.clone());
            }

            on_case(&CaseProgress {
                index: position + 1,
                total,
                case,
                address: address.as_ref(),
                demand: demand.as_ref(),
            });
        }

        summary.finished_at = Utc::now();
        info!(
            "Batch finished: {} cases, {} failures",
            summary.cases,
            summary.failed()
        );
        Ok(summary)
    }

    fn ensure_columns(&self, table: &mut CaseTable) {
        if self.target.includes_address() {
            for name in [ADDRESS_COLUMN, ADDRESS_STATUS_COLUMN, ADDRESS_ERROR_COLUMN] {
                table.ensure_column(name);
            }
        }
        if self.target.includes_demand() {
            for name in [
                DEMAND_AMOUNT_COLUMN,
                DEMAND_SOURCE_COLUMN,
                DEMAND_WARNING_COLUMN,
                DEMAND_STATUS_COLUMN,
                DEMAND_ERROR_COLUMN,
            ] {
                table.ensure_column(name);
            }
        }
    }
}

fn write_address(
    table: &mut CaseTable,
    rows: &[usize],
    outcome: &std::result::Result<ExtractedAddress, FailureRecord>,
) {
    let value = table.ensure_column(ADDRESS_COLUMN);
    let status = table.ensure_column(ADDRESS_STATUS_COLUMN);
    let error = table.ensure_column(ADDRESS_ERROR_COLUMN);
    for &row in rows {
        match outcome {
            Ok(address) => {
                table.set(row, value, address.compose());
                table.set(row, status, PASSED);
                table.set(row, error, "");
            }
            Err(failure) => {
                table.set(row, status, FAILED);
                table.set(row, error, failure.message.as_str());
            }
        }
    }
}

fn write_demand(
    table: &mut CaseTable,
    rows: &[usize],
    outcome: &std::result::Result<ExtractedDemand, FailureRecord>,
) {
    let amount = table.ensure_column(DEMAND_AMOUNT_COLUMN);
    let source = table.ensure_column(DEMAND_SOURCE_COLUMN);
    let warning = table.ensure_column(DEMAND_WARNING_COLUMN);
    let status = table.ensure_column(DEMAND_STATUS_COLUMN);
    let error = table.ensure_column(DEMAND_ERROR_COLUMN);
    for &row in rows {
        match outcome {
            Ok(demand) => {
                let warnings: Vec<String> = demand.warnings.iter().map(|w| w.to_string()).collect();
                table.set(row, amount, demand.amount.to_string());
                table.set(row, source, demand.source.label());
                table.set(row, warning, warnings.join("; "));
                table.set(row, status, PASSED);
                table.set(row, error, "");
            }
            Err(failure) => {
                table.set(row, status, FAILED);
                table.set(row, error, failure.message.as_str());
            }
        }
    }
}
