//! Box location with a bounded rotation sweep.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::{debug, info, trace};

use super::BoxDetector;
use crate::error::LocateError;
use crate::models::case::{BoundingBox, FieldKind};
use crate::models::config::{DetectionProfile, RotationSweep};

/// Boxes found at a given correction angle.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationAttempt {
    /// Counter-clockwise correction in degrees, 0 for the unrotated page.
    pub angle_deg: f32,
    pub boxes: Vec<BoundingBox>,
}

/// Non-zero correction angles in sweep order: `step, -step, 2*step, -2*step, ...`
/// while the magnitude stays below `max_deg`.
pub fn rotation_angles(sweep: RotationSweep) -> impl Iterator<Item = f32> {
    let step = sweep.step_deg;
    let max = sweep.max_deg;
    (1u32..)
        .map(move |k| k as f32 * step)
        .take_while(move |magnitude| step > 0.0 && *magnitude < max - step * 1e-3)
        .flat_map(|magnitude| [magnitude, -magnitude])
}

/// Run `attempt` at 0 degrees, then over the sweep, until it yields at least
/// `required` boxes.
///
/// On exhaustion returns the largest box count seen.
pub fn sweep_rotations<F>(
    sweep: RotationSweep,
    required: usize,
    mut attempt: F,
) -> Result<RotationAttempt, usize>
where
    F: FnMut(f32) -> Vec<BoundingBox>,
{
    let boxes = attempt(0.0);
    if boxes.len() >= required {
        return Ok(RotationAttempt {
            angle_deg: 0.0,
            boxes,
        });
    }

    let mut best = boxes.len();
    for angle in rotation_angles(sweep) {
        let boxes = attempt(angle);
        trace!("{} boxes at {:.1} degrees", boxes.len(), angle);
        if boxes.len() >= required {
            return Ok(RotationAttempt {
                angle_deg: angle,
                boxes,
            });
        }
        best = best.max(boxes.len());
    }
    Err(best)
}

/// Rotate counter-clockwise about the center, keeping the page size and
/// filling uncovered corners with white.
pub fn rotate_page(image: &GrayImage, angle_deg: f32) -> GrayImage {
    rotate_about_center(
        image,
        -angle_deg.to_radians(),
        Interpolation::Bilinear,
        Luma([255u8]),
    )
}

/// Locates field boxes, trying small rotations when the page is skewed.
pub struct BoxLocator<D> {
    detector: D,
    sweep: RotationSweep,
}

impl<D: BoxDetector> BoxLocator<D> {
    pub fn new(detector: D, sweep: RotationSweep) -> Self {
        Self { detector, sweep }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Find at least `profile.required_boxes` candidates for `field`.
    ///
    /// Box coordinates are in the frame of the rotated image they were found
    /// in. At sub-degree angles these stay close enough to crop the
    /// unrotated page.
    pub fn locate(
        &self,
        image: &GrayImage,
        field: FieldKind,
        profile: &DetectionProfile,
    ) -> Result<RotationAttempt, LocateError> {
        let required = profile.required_boxes;
        let mut rotating = false;
        let result = sweep_rotations(self.sweep, required, |angle| {
            if angle == 0.0 {
                return self.detector.detect(image, profile);
            }
            if !rotating {
                debug!("Could not find {} box, testing rotations", field);
                rotating = true;
            }
            self.detector.detect(&rotate_page(image, angle), profile)
        });

        match result {
            Ok(attempt) => {
                if attempt.angle_deg != 0.0 {
                    info!(
                        "Detected {} box after rotating {:.1} degrees",
                        field, attempt.angle_deg
                    );
                }
                Ok(attempt)
            }
            Err(found) => Err(LocateError::BoxNotFound {
                field,
                found,
                required,
                max_angle: self.sweep.max_deg,
            }),
        }
    }
}
