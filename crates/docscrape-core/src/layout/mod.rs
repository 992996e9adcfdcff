//! Form box location: detection, rotation sweep, disambiguation and cropping.

mod crop;
mod detector;
mod disambiguate;
mod locator;

pub use crop::{crop, CroppedField};
pub use detector::ContourBoxDetector;
pub use disambiguate::{rule_for, select, select_state_zip, SelectionRule, StateZipBoxes};
pub use locator::{rotate_page, rotation_angles, sweep_rotations, BoxLocator, RotationAttempt};

use image::GrayImage;

use crate::models::case::BoundingBox;
use crate::models::config::DetectionProfile;

/// Finds rectangular form cells matching a detection profile.
///
/// Implementations are deterministic for a given image and profile, and
/// return boxes in the coordinate space of `image`.
pub trait BoxDetector {
    fn detect(&self, image: &GrayImage, profile: &DetectionProfile) -> Vec<BoundingBox>;
}

impl<T: BoxDetector + ?Sized> BoxDetector for &T {
    fn detect(&self, image: &GrayImage, profile: &DetectionProfile) -> Vec<BoundingBox> {
        (**self).detect(image, profile)
    }
}

impl<T: BoxDetector + ?Sized> BoxDetector for Box<T> {
    fn detect(&self, image: &GrayImage, profile: &DetectionProfile) -> Vec<BoundingBox> {
        (**self).detect(image, profile)
    }
}
