//! Flat YOLO label files: `class_id x_center y_center width height` per line.

use log::warn;
use std::fmt::Write;

use crate::bbox::CenterBox;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class_id: usize,
    pub bbox: CenterBox,
}

fn parse_field(text: &str, line: usize, field: &str) -> Result<f64> {
    text.parse().map_err(|_| {
        Error::parse(format!(
            "line {}: invalid {} '{}'",
            line, field, text
        ))
    })
}

/// Class ids are integers, but older exports wrote them as `0.000000`.
fn parse_class_id(text: &str, line: usize) -> Result<usize> {
    if let Ok(id) = text.parse::<usize>() {
        return Ok(id);
    }
    let value = parse_field(text, line, "class id")?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(Error::parse(format!("line {}: invalid class id '{}'", line, text)));
    }
    Ok(value as usize)
}

/// Parse a label file. Blank lines are skipped; fields beyond the fifth are
/// ignored.
pub fn parse_yolo_labels(content: &str) -> Result<Vec<YoloLabel>> {
    let mut labels = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let number = index + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 5 {
            return Err(Error::parse(format!(
                "line {}: expected 5 fields, found {}",
                number,
                fields.len()
            )));
        }
        if fields.len() > 5 {
            warn!(
                "line {}: ignoring {} extra fields",
                number,
                fields.len() - 5
            );
        }

        labels.push(YoloLabel {
            class_id: parse_class_id(fields[0], number)?,
            bbox: CenterBox {
                x_center: parse_field(fields[1], number, "x_center")?,
                y_center: parse_field(fields[2], number, "y_center")?,
                width: parse_field(fields[3], number, "width")?,
                height: parse_field(fields[4], number, "height")?,
            },
        });
    }

    Ok(labels)
}

pub fn format_yolo_label(label: &YoloLabel) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        label.class_id,
        label.bbox.x_center,
        label.bbox.y_center,
        label.bbox.width,
        label.bbox.height
    )
}

/// Format labels one per line. No labels gives an empty string.
pub fn format_yolo_labels(labels: &[YoloLabel]) -> String {
    let mut yolo_data = String::with_capacity(labels.len() * 48);
    for label in labels {
        // Writing into a String cannot fail.
        let _ = writeln!(yolo_data, "{}", format_yolo_label(label));
    }
    yolo_data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fixed_point() {
        let label = YoloLabel {
            class_id: 3,
            bbox: CenterBox {
                x_center: 0.4,
                y_center: 125.0 / 375.0,
                width: 0.4,
                height: 0.00000001,
            },
        };
        assert_eq!(
            format_yolo_labels(&[label]),
            "3 0.400000 0.333333 0.400000 0.000000\n"
        );
        assert_eq!(format_yolo_labels(&[]), "");
    }

    #[test]
    fn test_parse_lines() {
        let labels =
            parse_yolo_labels("0 0.5 0.5 0.2 0.2\n\n1.000000 0.1 0.2 0.3 0.4 0.99\n").unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].class_id, 0);
        assert_eq!(labels[1].class_id, 1);
        assert_eq!(labels[1].bbox.height, 0.4);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_yolo_labels("0 0.5 0.5 0.2"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_yolo_labels("-1 0.5 0.5 0.2 0.2"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_yolo_labels("0.5 0.5 0.5 0.2 0.2"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_yolo_labels("0 x 0.5 0.2 0.2"),
            Err(Error::Parse { .. })
        ));
    }
}
