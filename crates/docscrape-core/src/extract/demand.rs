//! Initial demand parsing from the complaint's opening pages.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::patterns::{DAMAGES_OF, DEMAND_AMOUNT, PRAYER_AMOUNT};
use crate::error::ParseError;
use crate::models::case::{DemandSource, DemandWarning, ExtractedDemand};

/// Default soft ceiling for limited civil filings, in cents.
const DEFAULT_SOFT_CEILING_CENTS: i64 = 25_000_00;

/// Matches demand phrasings and normalizes the amount.
#[derive(Debug, Clone)]
pub struct DemandParser {
    soft_ceiling: Decimal,
}

impl DemandParser {
    pub fn new(soft_ceiling: Decimal) -> Self {
        Self { soft_ceiling }
    }

    fn pattern(source: DemandSource) -> &'static Regex {
        match source {
            DemandSource::PrayerAmount => &PRAYER_AMOUNT,
            DemandSource::Demand => &DEMAND_AMOUNT,
            DemandSource::PlaintiffPrays => &DAMAGES_OF,
        }
    }

    /// Search page 1 for the prayer amount and demand phrasings and page 2 for
    /// damages. The first match in priority order wins.
    pub fn parse(&self, page1: &str, page2: &str) -> Result<ExtractedDemand, ParseError> {
        let matches: Vec<(DemandSource, &str)> = DemandSource::PRIORITY
            .iter()
            .flat_map(|&source| {
                let text = if source.page() == 1 { page1 } else { page2 };
                Self::pattern(source)
                    .captures_iter(text)
                    .filter_map(|caps| caps.get(1))
                    .map(move |m| (source, m.as_str()))
                    .collect::<Vec<_>>()
            })
            .collect();

        let (source, raw) = *matches.first().ok_or(ParseError::DemandNotFound)?;

        let mut warnings = Vec::new();
        if matches.len() > 1 {
            warn!(
                "Found {} instances of initial demand, keeping {} ({})",
                matches.len(),
                raw,
                source
            );
            warnings.push(DemandWarning::MultipleMatches {
                count: matches.len(),
            });
        }

        let amount = normalize_amount(raw)?;
        if amount > self.soft_ceiling {
            warn!(
                "Detected initial demand {} is greater than {}, is this expected?",
                amount, self.soft_ceiling
            );
            warnings.push(DemandWarning::ExceedsCeiling {
                amount,
                ceiling: self.soft_ceiling,
            });
        }

        debug!("Found initial demand {} on page {} as {}", amount, source.page(), source);
        Ok(ExtractedDemand {
            amount,
            source,
            raw: raw.to_string(),
            warnings,
        })
    }
}

impl Default for DemandParser {
    fn default() -> Self {
        Self::new(Decimal::new(DEFAULT_SOFT_CEILING_CENTS, 2))
    }
}

/// Drop every separator and read the last two digits as cents.
pub fn normalize_amount(raw: &str) -> Result<Decimal, ParseError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let cents: i64 = digits.parse().map_err(|_| ParseError::DemandNotFound)?;
    Ok(Decimal::new(cents, 2))
}

/// Parse with the default soft ceiling.
pub fn parse_demand(page1: &str, page2: &str) -> Result<ExtractedDemand, ParseError> {
    DemandParser::default().parse(page1, page2)
}
