//! Conversion between absolute corner boxes and normalized center boxes.
//!
//! VOC records store `(xmin, ymin, xmax, ymax)` in pixels while YOLO records
//! store `(x_center, y_center, width, height)` divided by the image size. The
//! forward direction is exact floating-point arithmetic; the inverse produces
//! integer pixel corners using a single [`RoundingRule`].

use clap::ValueEnum;

use crate::error::{Error, Result};

/// Absolute corner coordinates in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Center coordinates and size, each normalized by the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel corners recovered from a [`CenterBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

/// How fractional pixel coordinates become integers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RoundingRule {
    /// Truncate toward zero, like an integer cast
    #[default]
    Truncate,
    /// Round half away from zero
    Nearest,
}

impl RoundingRule {
    pub fn apply(self, value: f64) -> i64 {
        match self {
            RoundingRule::Truncate => value.trunc() as i64,
            RoundingRule::Nearest => value.round() as i64,
        }
    }
}

impl CornerBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// `[x, y, width, height]` as used by COCO.
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.width(), self.height()]
    }
}

impl From<PixelBox> for CornerBox {
    fn from(b: PixelBox) -> Self {
        CornerBox::new(b.xmin as f64, b.ymin as f64, b.xmax as f64, b.ymax as f64)
    }
}

fn check_image_size(image_width: u32, image_height: u32) -> Result<()> {
    if image_width == 0 {
        return Err(Error::InvalidField {
            field: "size.width".to_string(),
            value: image_width.to_string(),
        });
    }
    if image_height == 0 {
        return Err(Error::InvalidField {
            field: "size.height".to_string(),
            value: image_height.to_string(),
        });
    }
    Ok(())
}

fn check_unit(field: &str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::OutOfBounds {
            field: field.to_string(),
            value,
        })
    }
}

// Slack for normalized values read back from six-decimal text.
const TEXT_EPSILON: f64 = 1e-6;

fn check_corner(field: &str, value: f64, slack: f64) -> Result<()> {
    if value >= -slack && value <= 1.0 + slack {
        Ok(())
    } else {
        Err(Error::OutOfBounds {
            field: field.to_string(),
            value,
        })
    }
}

/// Convert absolute corners to a normalized center box.
///
/// Every corner must lie inside the image and every output in `[0, 1]`. A box
/// reaching outside the image (or with `xmax < xmin`) is reported as
/// [`Error::OutOfBounds`] naming the offending value, never clamped.
pub fn to_normalized_center(
    bbox: &CornerBox,
    image_width: u32,
    image_height: u32,
) -> Result<CenterBox> {
    check_image_size(image_width, image_height)?;
    let w = image_width as f64;
    let h = image_height as f64;

    check_corner("xmin", bbox.xmin / w, 0.0)?;
    check_corner("ymin", bbox.ymin / h, 0.0)?;
    check_corner("xmax", bbox.xmax / w, 0.0)?;
    check_corner("ymax", bbox.ymax / h, 0.0)?;

    Ok(CenterBox {
        x_center: check_unit("x_center", (bbox.xmin + bbox.xmax) / 2.0 / w)?,
        y_center: check_unit("y_center", (bbox.ymin + bbox.ymax) / 2.0 / h)?,
        width: check_unit("width", (bbox.xmax - bbox.xmin) / w)?,
        height: check_unit("height", (bbox.ymax - bbox.ymin) / h)?,
    })
}

/// Convert a normalized center box back to integer pixel corners.
///
/// The recovered corners must lie inside the image, up to the precision of
/// the six-decimal label text.
pub fn to_absolute_corners(
    bbox: &CenterBox,
    image_width: u32,
    image_height: u32,
    rounding: RoundingRule,
) -> Result<PixelBox> {
    check_image_size(image_width, image_height)?;
    let x_center = check_unit("x_center", bbox.x_center)?;
    let y_center = check_unit("y_center", bbox.y_center)?;
    let width = check_unit("width", bbox.width)?;
    let height = check_unit("height", bbox.height)?;

    let (xmin, xmax) = (x_center - width / 2.0, x_center + width / 2.0);
    let (ymin, ymax) = (y_center - height / 2.0, y_center + height / 2.0);
    check_corner("xmin", xmin, TEXT_EPSILON)?;
    check_corner("ymin", ymin, TEXT_EPSILON)?;
    check_corner("xmax", xmax, TEXT_EPSILON)?;
    check_corner("ymax", ymax, TEXT_EPSILON)?;

    let w = image_width as f64;
    let h = image_height as f64;
    Ok(PixelBox {
        xmin: rounding.apply(xmin * w).clamp(0, image_width as i64),
        ymin: rounding.apply(ymin * h).clamp(0, image_height as i64),
        xmax: rounding.apply(xmax * w).clamp(0, image_width as i64),
        ymax: rounding.apply(ymax * h).clamp(0, image_height as i64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_forward_transform() {
        let center =
            to_normalized_center(&CornerBox::new(100.0, 50.0, 300.0, 200.0), 500, 375).unwrap();
        assert_abs_diff_eq!(center.x_center, 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(center.y_center, 125.0 / 375.0, epsilon = 1e-12);
        assert_abs_diff_eq!(center.width, 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(center.height, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_box_outside_image_is_rejected() {
        let err = to_normalized_center(&CornerBox::new(400.0, 0.0, 600.0, 10.0), 500, 375)
            .unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { ref field, value } if field == "xmax" && value > 1.0));

        let err = to_normalized_center(&CornerBox::new(-10.0, 0.0, 10.0, 10.0), 500, 375)
            .unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { ref field, .. } if field == "xmin"));

        let err =
            to_normalized_center(&CornerBox::new(10.0, 0.0, 5.0, 10.0), 500, 375).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { ref field, .. } if field == "width"));
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        let err = to_normalized_center(&CornerBox::new(0.0, 0.0, 1.0, 1.0), 0, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));
    }

    #[test]
    fn test_inverse_rejects_unnormalized_input() {
        let center = CenterBox {
            x_center: 1.5,
            y_center: 0.5,
            width: 0.1,
            height: 0.1,
        };
        assert!(to_absolute_corners(&center, 100, 100, RoundingRule::Truncate).is_err());
    }

    #[test]
    fn test_inverse_rejects_box_leaving_image() {
        let center = CenterBox {
            x_center: 0.9,
            y_center: 0.5,
            width: 0.4,
            height: 0.2,
        };
        let err = to_absolute_corners(&center, 100, 100, RoundingRule::Truncate).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { ref field, .. } if field == "xmax"));

        let center = CenterBox {
            x_center: 0.5,
            y_center: 0.05,
            width: 0.2,
            height: 0.2,
        };
        let err = to_absolute_corners(&center, 100, 100, RoundingRule::Nearest).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { ref field, .. } if field == "ymin"));
    }

    #[test]
    fn test_inverse_tolerates_text_precision_at_edges() {
        // (6, 2, 7, 3) on a 7x3 image, as written to a label file.
        let center = CenterBox {
            x_center: 0.928571,
            y_center: 0.833333,
            width: 0.142858,
            height: 0.333333,
        };
        let back = to_absolute_corners(&center, 7, 3, RoundingRule::Nearest).unwrap();
        assert_eq!(back.xmax, 7);
        assert_eq!(back.ymax, 3);
    }

    #[test]
    fn test_rounding_rules() {
        assert_eq!(RoundingRule::Truncate.apply(49.999875), 49);
        assert_eq!(RoundingRule::Nearest.apply(49.999875), 50);
        assert_eq!(RoundingRule::Truncate.apply(-0.4), 0);
        assert_eq!(RoundingRule::Nearest.apply(2.5), 3);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let sizes = [(1u32, 1u32), (7, 3), (500, 375), (640, 480), (1920, 1080)];
        for &(w, h) in &sizes {
            let boxes = [
                (0, 0, w, h),
                (0, 0, 1, 1),
                (w / 3, h / 4, w / 2 + 1, h / 2 + 1),
                (w.saturating_sub(1), h.saturating_sub(1), w, h),
            ];
            for &(xmin, ymin, xmax, ymax) in &boxes {
                if xmin >= xmax || ymin >= ymax {
                    continue;
                }
                let corners = CornerBox::new(xmin as f64, ymin as f64, xmax as f64, ymax as f64);
                let center = to_normalized_center(&corners, w, h).unwrap();
                // Emulate the fixed-point text representation.
                let center = CenterBox {
                    x_center: format!("{:.6}", center.x_center).parse().unwrap(),
                    y_center: format!("{:.6}", center.y_center).parse().unwrap(),
                    width: format!("{:.6}", center.width).parse().unwrap(),
                    height: format!("{:.6}", center.height).parse().unwrap(),
                };
                for rule in [RoundingRule::Truncate, RoundingRule::Nearest] {
                    let back = to_absolute_corners(&center, w, h, rule).unwrap();
                    assert!((back.xmin - xmin as i64).abs() <= 1, "{:?} {:?}", corners, back);
                    assert!((back.ymin - ymin as i64).abs() <= 1, "{:?} {:?}", corners, back);
                    assert!((back.xmax - xmax as i64).abs() <= 1, "{:?} {:?}", corners, back);
                    assert!((back.ymax - ymax as i64).abs() <= 1, "{:?} {:?}", corners, back);
                }
            }
        }
    }
}
