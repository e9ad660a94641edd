use crate::bbox::{to_absolute_corners, to_normalized_center, CornerBox, RoundingRule};
use crate::category::CategoryTable;
use crate::error::{Error, Result};
use crate::voc::{VocAnnotation, VocObject, DEFAULT_DEPTH, DEFAULT_POSE};
use crate::yolo::{format_yolo_labels, YoloLabel};

/// Result of converting one VOC record.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloConversion {
    pub labels: Vec<YoloLabel>,
    pub skipped_difficult: usize,
}

/// What a YOLO to VOC conversion needs to know about the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub folder: String,
    pub file_name: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Convert the objects of a VOC record to YOLO labels.
///
/// Difficult objects are dropped before their class is looked up. Any other
/// object whose class is not in `categories` fails the conversion.
pub fn voc_to_yolo(annotation: &VocAnnotation, categories: &CategoryTable) -> Result<YoloConversion> {
    let mut labels = Vec::with_capacity(annotation.objects.len());
    let mut skipped_difficult = 0;

    for (index, object) in annotation.objects.iter().enumerate() {
        if object.is_difficult() {
            skipped_difficult += 1;
            continue;
        }
        let class_id = categories.index(&object.name)?;
        let bbox = to_normalized_center(&object.bndbox, annotation.width, annotation.height)
            .map_err(|e| match e {
                Error::OutOfBounds { field, value } => Error::OutOfBounds {
                    field: format!("object[{}].{}", index, field),
                    value,
                },
                other => other,
            })?;
        labels.push(YoloLabel { class_id, bbox });
    }

    Ok(YoloConversion {
        labels,
        skipped_difficult,
    })
}

/// Convert a VOC record straight to label file content.
pub fn convert_to_yolo_format(
    annotation: &VocAnnotation,
    categories: &CategoryTable,
) -> Result<String> {
    voc_to_yolo(annotation, categories).map(|c| format_yolo_labels(&c.labels))
}

/// Build a VOC record from YOLO labels.
///
/// The flat format carries no difficulty, pose or truncation, so every object
/// gets `difficult = 0`, `pose = Unspecified` and `truncated = 0`.
pub fn yolo_to_voc(
    labels: &[YoloLabel],
    categories: &CategoryTable,
    image: &ImageInfo,
    rounding: RoundingRule,
) -> Result<VocAnnotation> {
    let objects = labels
        .iter()
        .map(|label| {
            let name = categories.name(label.class_id)?.to_string();
            let corners = to_absolute_corners(&label.bbox, image.width, image.height, rounding)?;
            Ok(VocObject {
                name,
                pose: DEFAULT_POSE.to_string(),
                truncated: 0,
                difficult: 0,
                bndbox: CornerBox::from(corners),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VocAnnotation {
        folder: Some(image.folder.clone()),
        filename: Some(image.file_name.clone()),
        path: Some(image.path.clone()),
        width: image.width,
        height: image.height,
        depth: DEFAULT_DEPTH,
        objects,
    })
}
