//! Initial demand pipeline over the complaint.

use image::DynamicImage;
use tracing::{debug, info};

use super::{CaseFailure, CasePipeline, Stage};
use crate::error::ScrapeError;
use crate::extract::DemandParser;
use crate::files::{resolve, DocumentKind};
use crate::models::case::{CaseId, ExtractedDemand};
use crate::ocr::TextRecognizer;
use crate::pdf::{PageRange, PageRasterizer};

enum DemandState {
    Start,
    Located(std::path::PathBuf),
    Rasterized(Vec<DynamicImage>),
    /// Page 1 text and the text of every later page.
    Recognized { first: String, rest: String },
    Parsed(ExtractedDemand),
    Done(ExtractedDemand),
}

impl DemandState {
    fn next_stage(&self) -> Stage {
        match self {
            DemandState::Start => Stage::Located,
            DemandState::Located(_) => Stage::Rasterized,
            DemandState::Rasterized(_) => Stage::Recognized,
            DemandState::Recognized { .. } => Stage::Parsed,
            DemandState::Parsed(_) | DemandState::Done(_) => Stage::Done,
        }
    }

    fn advance<R, D, T>(
        self,
        pipeline: &CasePipeline<R, D, T>,
        case: &CaseId,
    ) -> Result<DemandState, ScrapeError>
    where
        R: PageRasterizer,
        T: TextRecognizer,
    {
        let layout = &pipeline.template.complaint;
        let next = match self {
            DemandState::Start => {
                DemandState::Located(resolve(case, DocumentKind::Complaint, &pipeline.docs_dir)?)
            }
            DemandState::Located(path) => DemandState::Rasterized(pipeline.rasterizer.rasterize(
                &path,
                PageRange::between(1, layout.demand_pages),
                pipeline.raster.dpi,
            )?),
            DemandState::Rasterized(pages) => {
                let mut texts = Vec::with_capacity(pages.len());
                for (index, page) in pages.iter().enumerate() {
                    let text = pipeline.recognizer.recognize(page, &pipeline.recognition)?;
                    debug!("Complaint page {}: {} characters", index + 1, text.len());
                    texts.push(text);
                }
                let mut texts = texts.into_iter();
                DemandState::Recognized {
                    first: texts.next().unwrap_or_default(),
                    rest: texts.collect::<Vec<_>>().join("\n"),
                }
            }
            DemandState::Recognized { first, rest } => DemandState::Parsed(
                DemandParser::new(layout.soft_ceiling).parse(&first, &rest)?,
            ),
            DemandState::Parsed(demand) | DemandState::Done(demand) => DemandState::Done(demand),
        };
        Ok(next)
    }
}

pub(super) fn run<R, D, T>(
    pipeline: &CasePipeline<R, D, T>,
    case: &CaseId,
) -> Result<ExtractedDemand, CaseFailure>
where
    R: PageRasterizer,
    T: TextRecognizer,
{
    let mut state = DemandState::Start;
    loop {
        let entering = state.next_stage();
        state = match state
            .advance(pipeline, case)
            .map_err(|error| CaseFailure::new(entering, error))?
        {
            DemandState::Done(demand) => {
                info!(
                    "Extracted initial demand for {}: {} ({})",
                    case, demand.amount, demand.source
                );
                return Ok(demand);
            }
            other => {
                debug!("Case {} entered {} stage", case, entering);
                other
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, PdfError};
    use crate::layout::ContourBoxDetector;
    use crate::models::case::DemandSource;
    use crate::models::config::ScrapeConfig;
    use crate::pipeline::fakes::{BlankPages, ScriptedText};
    use crate::pipeline::CaseExtractor;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn pipeline_with(
        pages: u32,
        texts: &[&str],
    ) -> (tempfile::TempDir, CasePipeline<BlankPages, ContourBoxDetector, ScriptedText>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cgc24000002_complaint.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(
            dir.path().join("cgc24000002_summons_on_complaint.pdf"),
            b"%PDF-1.4",
        )
        .unwrap();

        let pipeline = CasePipeline::new(
            dir.path(),
            &ScrapeConfig::default(),
            BlankPages {
                pages,
                width: 40,
                height: 40,
            },
            ContourBoxDetector::new(),
            ScriptedText::new(texts),
        )
        .unwrap();
        (dir, pipeline)
    }

    #[test]
    fn test_demand_from_second_page() {
        let (_dir, pipeline) = pipeline_with(
            5,
            &["COMPLAINT", "10. Plaintiff prays ... damages of: $4,321.00"],
        );

        let demand = pipeline
            .extract_demand(&CaseId::new("CGC24000002"))
            .unwrap();
        assert_eq!(demand.amount, Decimal::new(432100, 2));
        assert_eq!(demand.source, DemandSource::PlaintiffPrays);
    }

    #[test]
    fn test_single_page_complaint_fails_at_rasterized() {
        let (_dir, pipeline) = pipeline_with(1, &["DEMAND: $100.00"]);

        let failure = pipeline
            .extract_demand(&CaseId::new("CGC24000002"))
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Rasterized);
        assert!(matches!(
            failure.error,
            ScrapeError::Pdf(PdfError::InsufficientPages {
                required: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_no_demand_fails_at_parsed() {
        let (_dir, pipeline) = pipeline_with(2, &["nothing", "still nothing"]);

        let failure = pipeline
            .extract_demand(&CaseId::new("CGC24000002"))
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Parsed);
        assert!(matches!(
            failure.error,
            ScrapeError::Parse(ParseError::DemandNotFound)
        ));
    }

    #[test]
    fn test_recognition_failure_fails_at_recognized() {
        let (_dir, pipeline) = pipeline_with(2, &["only one page of text"]);

        let failure = pipeline
            .extract_demand(&CaseId::new("CGC24000002"))
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Recognized);
    }
}
