//! Address pipeline over the civil case cover sheet.

use image::{imageops, DynamicImage, GrayImage};
use tracing::{debug, info};

use super::{CaseFailure, CasePipeline, Stage};
use crate::error::{PdfError, ScrapeError};
use crate::extract::parse_address;
use crate::files::{resolve, DocumentKind};
use crate::layout::{crop, rule_for, select, select_state_zip, BoxDetector, CroppedField};
use crate::models::case::{BoundingBox, CaseId, ExtractedAddress, FieldKind};
use crate::models::config::CoverSheetLayout;
use crate::ocr::TextRecognizer;
use crate::pdf::{PageRange, PageRasterizer};

/// One box per address field, in working-area coordinates.
#[derive(Debug, Clone, Copy)]
struct FieldBoxes {
    street: BoundingBox,
    city: BoundingBox,
    state: BoundingBox,
    zip: BoundingBox,
}

impl FieldBoxes {
    fn get(&self, field: FieldKind) -> BoundingBox {
        match field {
            FieldKind::StreetAddress => self.street,
            FieldKind::City => self.city,
            FieldKind::State => self.state,
            FieldKind::Zip => self.zip,
        }
    }
}

/// Raw text per field, in `FieldKind::ALL` order.
type FieldTexts = [String; 4];

enum AddressState {
    Start,
    Located(std::path::PathBuf),
    Rasterized(GrayImage),
    Boxed { area: GrayImage, boxes: FieldBoxes },
    Cropped(Vec<CroppedField>),
    Recognized(FieldTexts),
    Parsed(ExtractedAddress),
    Done(ExtractedAddress),
}

impl AddressState {
    /// Stage the next transition enters.
    fn next_stage(&self) -> Stage {
        match self {
            AddressState::Start => Stage::Located,
            AddressState::Located(_) => Stage::Rasterized,
            AddressState::Rasterized(_) => Stage::Boxed,
            AddressState::Boxed { .. } => Stage::Cropped,
            AddressState::Cropped(_) => Stage::Recognized,
            AddressState::Recognized(_) => Stage::Parsed,
            AddressState::Parsed(_) | AddressState::Done(_) => Stage::Done,
        }
    }

    fn advance<R, D, T>(
        self,
        pipeline: &CasePipeline<R, D, T>,
        case: &CaseId,
    ) -> Result<AddressState, ScrapeError>
    where
        R: PageRasterizer,
        D: BoxDetector,
        T: TextRecognizer,
    {
        let layout = &pipeline.template.cover_sheet;
        let next = match self {
            AddressState::Start => AddressState::Located(resolve(
                case,
                DocumentKind::CivilCaseCoverSheet,
                &pipeline.docs_dir,
            )?),
            AddressState::Located(path) => {
                let mut pages = pipeline.rasterizer.rasterize(
                    &path,
                    PageRange::starting_at(layout.address_first_page),
                    pipeline.raster.dpi,
                )?;
                let last = pages.pop().ok_or(PdfError::NoPages)?;
                AddressState::Rasterized(working_area(&last.to_luma8(), layout))
            }
            AddressState::Rasterized(area) => {
                let boxes = locate_fields(pipeline, &area, layout)?;
                AddressState::Boxed { area, boxes }
            }
            AddressState::Boxed { area, boxes } => {
                let area = DynamicImage::ImageLuma8(area);
                let crops: Vec<CroppedField> = FieldKind::ALL
                    .iter()
                    .map(|&field| crop(&area, field, boxes.get(field), layout.padding(field)))
                    .collect();
                for field_crop in &crops {
                    pipeline.dump_crop(case, field_crop);
                }
                AddressState::Cropped(crops)
            }
            AddressState::Cropped(crops) => {
                let mut texts: FieldTexts = Default::default();
                for (slot, field_crop) in texts.iter_mut().zip(&crops) {
                    *slot = pipeline
                        .recognizer
                        .recognize(&field_crop.image, &pipeline.recognition)?;
                    debug!("OCR {}: {:?}", field_crop.field, slot);
                }
                AddressState::Recognized(texts)
            }
            AddressState::Recognized([street, city, state, zip]) => {
                AddressState::Parsed(parse_address(&street, &city, &state, &zip)?)
            }
            AddressState::Parsed(address) | AddressState::Done(address) => {
                AddressState::Done(address)
            }
        };
        Ok(next)
    }
}

/// Rows `[top_crop, height * fraction)` of the address page.
fn working_area(page: &GrayImage, layout: &CoverSheetLayout) -> GrayImage {
    let (width, height) = page.dimensions();
    let bottom = ((height as f32 * layout.working_height_fraction) as u32).min(height);
    let top = layout.top_crop.min(bottom);
    imageops::crop_imm(page, 0, top, width, bottom - top).to_image()
}

fn locate_fields<R, D, T>(
    pipeline: &CasePipeline<R, D, T>,
    area: &GrayImage,
    layout: &CoverSheetLayout,
) -> Result<FieldBoxes, ScrapeError>
where
    D: BoxDetector,
{
    let locator = &pipeline.locator;

    // The street box is searched right of the reason box, then moved back.
    let left = layout.street_search_left.min(area.width());
    let right_side = imageops::crop_imm(area, left, 0, area.width() - left, area.height()).to_image();
    let street_profile = layout.profile(FieldKind::StreetAddress);
    let found = locator.locate(&right_side, FieldKind::StreetAddress, street_profile)?;
    let street = select(
        FieldKind::StreetAddress,
        &found.boxes,
        rule_for(FieldKind::StreetAddress),
    )?
    .translate(left, 0);

    let found = locator.locate(area, FieldKind::City, layout.profile(FieldKind::City))?;
    let city = select(FieldKind::City, &found.boxes, rule_for(FieldKind::City))?;

    let found = locator.locate(area, FieldKind::State, layout.profile(FieldKind::State))?;
    let pair = select_state_zip(&found.boxes, layout.state_zip_window)?;

    Ok(FieldBoxes {
        street,
        city,
        state: pair.state,
        zip: pair.zip,
    })
}

pub(super) fn run<R, D, T>(
    pipeline: &CasePipeline<R, D, T>,
    case: &CaseId,
) -> Result<ExtractedAddress, CaseFailure>
where
    R: PageRasterizer,
    D: BoxDetector,
    T: TextRecognizer,
{
    let mut state = AddressState::Start;
    loop {
        let entering = state.next_stage();
        state = match state
            .advance(pipeline, case)
            .map_err(|error| CaseFailure::new(entering, error))?
        {
            AddressState::Done(address) => {
                info!("Extracted address for {}: {}", case, address.compose());
                return Ok(address);
            }
            other => {
                debug!("Case {} entered {} stage", case, entering);
                other
            }
        };
    }
}
