//! Case-level data models: identifiers, boxes, and extracted fields.

use std::fmt;
use std::hash::{Hash, Hasher};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Case number used to locate files and key result rows.
///
/// Matching folds ASCII case only, in both `eq` and `key`; the supplied
/// spelling is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// The identifier as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased key used for file and row matching.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for CaseId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for CaseId {}

impl Hash for CaseId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address fields printed on the cover sheet's address page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    StreetAddress,
    City,
    State,
    Zip,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::StreetAddress,
        FieldKind::City,
        FieldKind::State,
        FieldKind::Zip,
    ];
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::StreetAddress => "street address",
            FieldKind::City => "city",
            FieldKind::State => "state",
            FieldKind::Zip => "zip code",
        };
        f.write_str(name)
    }
}

/// Axis-aligned box in pixel coordinates: (left, top, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return f32::INFINITY;
        }
        self.width as f32 / self.height as f32
    }

    /// Move the box by a non-negative offset.
    pub fn translate(&self, dx: u32, dy: u32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// Intersection area divided by the smaller box's area.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f32 {
        let x1 = self.left.max(other.left);
        let y1 = self.top.max(other.top);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }
        let inter = ((x2 - x1) as u64 * (y2 - y1) as u64) as f32;
        let smaller = (self.width as u64 * self.height as u64)
            .min(other.width as u64 * other.height as u64)
            .max(1) as f32;
        inter / smaller
    }
}

/// Normalized mailing address from the cover sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedAddress {
    /// Street line, starting at the building number.
    pub street_address: String,
    pub city: String,
    pub state: String,
    /// `DDDDD` or `DDDDD-DDDD`.
    pub zip_code: String,
}

impl ExtractedAddress {
    /// Single-line form used in the output table.
    pub fn compose(&self) -> String {
        format!(
            "{}, {} {} {}",
            self.street_address, self.city, self.state, self.zip_code
        )
    }
}

/// Which complaint phrasing the demand was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandSource {
    #[serde(rename = "PRAYER AMOUNT")]
    PrayerAmount,
    #[serde(rename = "DEMAND")]
    Demand,
    #[serde(rename = "plaintiff-prays-damages")]
    PlaintiffPrays,
}

impl DemandSource {
    /// Priority order used when several phrasings match.
    pub const PRIORITY: [DemandSource; 3] = [
        DemandSource::PrayerAmount,
        DemandSource::Demand,
        DemandSource::PlaintiffPrays,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DemandSource::PrayerAmount => "PRAYER AMOUNT",
            DemandSource::Demand => "DEMAND",
            DemandSource::PlaintiffPrays => "plaintiff-prays-damages",
        }
    }

    /// Complaint page (1-indexed) the phrasing is searched on.
    pub fn page(&self) -> u32 {
        match self {
            DemandSource::PrayerAmount | DemandSource::Demand => 1,
            DemandSource::PlaintiffPrays => 2,
        }
    }
}

impl fmt::Display for DemandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Non-fatal observations attached to an extracted demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandWarning {
    /// Amount is above the template's soft ceiling.
    ExceedsCeiling { amount: Decimal, ceiling: Decimal },
    /// More than one phrasing matched; the first in priority order was kept.
    MultipleMatches { count: usize },
}

impl fmt::Display for DemandWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandWarning::ExceedsCeiling { amount, ceiling } => write!(
                f,
                "detected initial demand {} is greater than {}, is this expected?",
                amount, ceiling
            ),
            DemandWarning::MultipleMatches { count } => {
                write!(f, "found {} instances of initial demand", count)
            }
        }
    }
}

/// Initial monetary demand from the complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDemand {
    /// Amount with exactly two fractional digits.
    pub amount: Decimal,
    /// Phrasing the amount was matched under.
    pub source: DemandSource,
    /// Raw matched digit run, before punctuation stripping.
    pub raw: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DemandWarning>,
}

impl ExtractedDemand {
    /// Whether the amount tripped the soft ceiling.
    pub fn is_suspicious(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, DemandWarning::ExceedsCeiling { .. }))
    }
}
