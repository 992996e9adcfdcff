//! Padded field crops.

use image::{DynamicImage, GenericImageView};

use crate::models::case::{BoundingBox, FieldKind};
use crate::models::config::Padding;

/// A field's pixels, ready for recognition.
#[derive(Debug, Clone)]
pub struct CroppedField {
    pub field: FieldKind,
    /// Detected box before padding.
    pub source: BoundingBox,
    /// Region actually cut out, after padding and clamping.
    pub region: BoundingBox,
    pub image: DynamicImage,
}

/// Cut `bbox` grown by `padding` out of `image`, clamped to the image bounds.
pub fn crop(
    image: &DynamicImage,
    field: FieldKind,
    bbox: BoundingBox,
    padding: Padding,
) -> CroppedField {
    let (width, height) = image.dimensions();

    let left = bbox.left.saturating_sub(padding.left).min(width);
    let top = bbox.top.saturating_sub(padding.top).min(height);
    let right = bbox.right().saturating_add(padding.right).min(width);
    let bottom = bbox.bottom().saturating_add(padding.bottom).min(height);

    let region = BoundingBox::new(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    );

    CroppedField {
        field,
        source: bbox,
        region,
        image: image.crop_imm(region.left, region.top, region.width, region.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;

    fn page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 300, Luma([255])))
    }

    #[test]
    fn test_padding_grows_region() {
        let field = crop(
            &page(),
            FieldKind::Zip,
            BoundingBox::new(100, 100, 50, 20),
            Padding {
                top: 10,
                bottom: 40,
                left: 10,
                right: 10,
            },
        );

        assert_eq!(field.region, BoundingBox::new(90, 90, 70, 70));
        assert_eq!(field.image.dimensions(), (70, 70));
        assert_eq!(field.source, BoundingBox::new(100, 100, 50, 20));
    }

    #[test]
    fn test_region_is_clamped_to_image() {
        let field = crop(
            &page(),
            FieldKind::StreetAddress,
            BoundingBox::new(10, 280, 380, 15),
            Padding::uniform(30),
        );

        assert_eq!(field.region, BoundingBox::new(0, 250, 400, 50));
        assert_eq!(field.image.dimensions(), (400, 50));
    }
}
