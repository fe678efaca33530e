use crate::error::{ClassifierError, ClassifierResult};
use crate::task::packet::NormalizedRect;

/// Rectangle in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Pre-processing applied to an input image before classification.
///
/// `rotation_degrees` is applied clockwise to the image, or to the region of
/// interest when one is set, and must be a multiple of 90.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageProcessingOptions {
    pub region_of_interest: Option<RectF>,
    pub rotation_degrees: i32,
}

impl ImageProcessingOptions {
    pub fn with_region_of_interest(mut self, roi: RectF) -> Self {
        self.region_of_interest = Some(roi);
        self
    }

    pub fn with_rotation_degrees(mut self, rotation_degrees: i32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        if let Some(roi) = &self.region_of_interest {
            if roi.left >= roi.right || roi.top >= roi.bottom {
                return Err(ClassifierError::InvalidArgument(format!(
                    "Expected RectF with left < right and top < bottom, got {:?}",
                    roi
                )));
            }
            let in_unit_range = [roi.left, roi.top, roi.right, roi.bottom]
                .iter()
                .all(|v| (0.0..=1.0).contains(v));
            if !in_unit_range {
                return Err(ClassifierError::InvalidArgument(format!(
                    "Expected RectF values to be in [0,1], got {:?}",
                    roi
                )));
            }
        }
        if self.rotation_degrees % 90 != 0 {
            return Err(ClassifierError::InvalidArgument(format!(
                "Expected rotation to be a multiple of 90°, got {}",
                self.rotation_degrees
            )));
        }
        Ok(())
    }

    pub fn to_normalized_rect(&self) -> ClassifierResult<NormalizedRect> {
        self.validate()?;
        let rotation = -(self.rotation_degrees as f32).to_radians();
        let rect = match &self.region_of_interest {
            Some(roi) => NormalizedRect {
                x_center: (roi.left + roi.right) / 2.0,
                y_center: (roi.top + roi.bottom) / 2.0,
                width: roi.right - roi.left,
                height: roi.bottom - roi.top,
                rotation,
            },
            None => NormalizedRect {
                rotation,
                ..NormalizedRect::default()
            },
        };
        Ok(rect)
    }
}
