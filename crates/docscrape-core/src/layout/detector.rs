//! Ruling-line box detector built on imageproc.

use image::imageops::FilterType;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use tracing::{debug, trace};

use super::BoxDetector;
use crate::models::case::BoundingBox;
use crate::models::config::DetectionProfile;

const FOREGROUND: u8 = 255;

/// Detects form cells as the interiors of closed ruling-line frames.
///
/// For each scaling factor the image is resized, binarized with Otsu's level,
/// reduced to long horizontal and vertical runs, dilated, and searched for hole
/// contours. Hole bounding rectangles that fit the profile's size ranges, and
/// whose row holds an accepted number of such cells, are returned in source
/// coordinates. Long runs break up once a scan is skewed, which makes the
/// detector sensitive to tenths of a degree.
pub struct ContourBoxDetector {
    /// Shortest ruling-line run kept, as a fraction of the smallest accepted box side.
    line_fraction: f32,
    /// Overlap above which boxes found at different scales are merged.
    merge_overlap: f32,
}

impl ContourBoxDetector {
    pub fn new() -> Self {
        Self {
            line_fraction: 0.5,
            merge_overlap: 0.8,
        }
    }

    /// Set the shortest kept line run as a fraction of the smallest box side.
    pub fn with_line_fraction(mut self, fraction: f32) -> Self {
        self.line_fraction = fraction;
        self
    }

    fn detect_at_scale(
        &self,
        image: &GrayImage,
        profile: &DetectionProfile,
        scale: f32,
    ) -> Vec<BoundingBox> {
        let scaled = resize(image, scale);
        let binary = binarize(&scaled);

        let min_h_run = ((profile.width_range.min as f32 * scale * self.line_fraction) as u32).max(2);
        let min_v_run = ((profile.height_range.min as f32 * scale * self.line_fraction) as u32).max(2);
        let mut mask = ruling_lines(&binary, min_h_run, min_v_run);
        if profile.dilation_iterations > 0 {
            mask = dilate(&mask, Norm::LInf, profile.dilation_iterations);
        }

        let contours: Vec<Contour<u32>> = find_contours(&mask);
        let accepted: Vec<BoundingBox> = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Hole && !c.points.is_empty())
            .map(contour_rect)
            .map(|rect| unscale(&rect, scale))
            .filter(|rect| fits(profile, rect))
            .collect();

        let groups = row_group_sizes(&accepted);
        accepted
            .into_iter()
            .zip(groups)
            .filter(|(rect, size)| {
                let keep = profile.group_size_range.contains(*size);
                if !keep {
                    trace!("Dropping {:?}: row group of {}", rect, size);
                }
                keep
            })
            .map(|(rect, _)| rect)
            .collect()
    }
}

impl Default for ContourBoxDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxDetector for ContourBoxDetector {
    fn detect(&self, image: &GrayImage, profile: &DetectionProfile) -> Vec<BoundingBox> {
        let mut boxes: Vec<BoundingBox> = Vec::new();

        for &scale in &profile.scaling_factors {
            for rect in self.detect_at_scale(image, profile, scale) {
                if boxes
                    .iter()
                    .all(|existing| existing.overlap_ratio(&rect) < self.merge_overlap)
                {
                    boxes.push(rect);
                }
            }
        }

        boxes.sort_by_key(|b| (b.top, b.left));
        debug!(
            "Detected {} boxes in {}x{} image",
            boxes.len(),
            image.width(),
            image.height()
        );
        boxes
    }
}

fn resize(image: &GrayImage, scale: f32) -> GrayImage {
    if (scale - 1.0).abs() < f32::EPSILON {
        return image.clone();
    }
    let width = ((image.width() as f32 * scale).round() as u32).max(1);
    let height = ((image.height() as f32 * scale).round() as u32).max(1);
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Dark pixels become foreground. A uniform image has no foreground.
fn binarize(image: &GrayImage) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if min >= max {
        return GrayImage::new(image.width(), image.height());
    }

    let level = otsu_level(image);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] <= level {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Keep foreground pixels lying on a horizontal run of at least `min_h`
/// or a vertical run of at least `min_v`.
fn ruling_lines(binary: &GrayImage, min_h: u32, min_v: u32) -> GrayImage {
    let (width, height) = binary.dimensions();
    let mut lines = GrayImage::new(width, height);
    let is_set = |x: u32, y: u32| binary.get_pixel(x, y)[0] == FOREGROUND;

    for y in 0..height {
        let mut start = 0;
        for x in 0..=width {
            if x < width && is_set(x, y) {
                continue;
            }
            if x - start >= min_h {
                for rx in start..x {
                    lines.put_pixel(rx, y, Luma([FOREGROUND]));
                }
            }
            start = x + 1;
        }
    }

    for x in 0..width {
        let mut start = 0;
        for y in 0..=height {
            if y < height && is_set(x, y) {
                continue;
            }
            if y - start >= min_v {
                for ry in start..y {
                    lines.put_pixel(x, ry, Luma([FOREGROUND]));
                }
            }
            start = y + 1;
        }
    }

    lines
}

fn contour_rect(contour: &Contour<u32>) -> BoundingBox {
    let (min_x, min_y, max_x, max_y) = contour.points.iter().fold(
        (u32::MAX, u32::MAX, 0, 0),
        |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
    );
    BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

fn unscale(rect: &BoundingBox, scale: f32) -> BoundingBox {
    let f = |v: u32| (v as f32 / scale).round() as u32;
    BoundingBox::new(f(rect.left), f(rect.top), f(rect.width), f(rect.height))
}

fn fits(profile: &DetectionProfile, rect: &BoundingBox) -> bool {
    profile.width_range.contains(rect.width)
        && profile.height_range.contains(rect.height)
        && profile.ratio_range.contains(rect.aspect_ratio())
}

/// Number of boxes sharing each box's row, where a row is a chain of boxes
/// whose vertical spans overlap by at least half the shorter height.
fn row_group_sizes(boxes: &[BoundingBox]) -> Vec<usize> {
    let n = boxes.len();
    let mut group: Vec<usize> = (0..n).collect();

    fn root(group: &mut [usize], mut i: usize) -> usize {
        while group[i] != i {
            group[i] = group[group[i]];
            i = group[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&boxes[i], &boxes[j]);
            let overlap = a.bottom().min(b.bottom()).saturating_sub(a.top.max(b.top));
            if overlap * 2 >= a.height.min(b.height) {
                let (ri, rj) = (root(&mut group, i), root(&mut group, j));
                group[ri] = rj;
            }
        }
    }

    let roots: Vec<usize> = (0..n).map(|i| root(&mut group, i)).collect();
    roots
        .iter()
        .map(|r| roots.iter().filter(|other| *other == r).count())
        .collect()
}
