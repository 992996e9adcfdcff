//! Pipeline stages and per-case failures.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ScrapeError;

/// Stages a case moves through, in order.
///
/// Demand extraction skips `Boxed` and `Cropped` since it reads whole pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Located,
    Rasterized,
    Boxed,
    Cropped,
    Recognized,
    Parsed,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Located => "located",
            Stage::Rasterized => "rasterized",
            Stage::Boxed => "boxed",
            Stage::Cropped => "cropped",
            Stage::Recognized => "recognized",
            Stage::Parsed => "parsed",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A case's pipeline stopped while entering `stage`.
#[derive(Debug, Error)]
#[error("failed at {stage} stage: {error}")]
pub struct CaseFailure {
    pub stage: Stage,
    #[source]
    pub error: ScrapeError,
}

impl CaseFailure {
    pub fn new(stage: Stage, error: impl Into<ScrapeError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn test_failure_message_names_stage() {
        let failure = CaseFailure::new(Stage::Parsed, ParseError::DemandNotFound);
        assert_eq!(
            failure.to_string(),
            "failed at parsed stage: could not find initial demand on first or second page"
        );
    }
}
