//! COCO format data structures and utilities
//!
//! This module provides the COCO detection index written by the VOC to COCO
//! converter: `images`, `annotations` and `categories`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::category::CategoryTable;
use crate::error::Result;
use crate::voc::VocAnnotation;

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub supercategory: String,
    pub id: usize,
    pub name: String,
}

/// COCO image information. The id is the file stem, which need not be numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub file_name: String,
    pub height: u32,
    pub width: u32,
    pub id: String,
}

/// COCO annotation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub area: f64,
    pub iscrowd: u32,
    pub image_id: String,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub category_id: usize,
    pub id: u64,
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoFile {
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

/// Monotonic bounding-box id source, starting at 0. Ids are never reused.
#[derive(Debug, Default)]
pub struct BoxIdCounter {
    next: u64,
}

impl BoxIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// COCO category list for a table. Ids are 1-based.
pub fn categories_from_table(table: &CategoryTable) -> Vec<Category> {
    table
        .names()
        .iter()
        .enumerate()
        .map(|(index, name)| Category {
            supercategory: name.clone(),
            id: index + 1,
            name: name.clone(),
        })
        .collect()
}

/// Boxes of one image, converted but not yet numbered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImage {
    pub image: Image,
    pub boxes: Vec<PendingBox>,
    pub skipped_difficult: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingBox {
    pub category_id: usize,
    pub bbox: [f64; 4],
}

/// Convert one VOC record into a pending COCO image. Difficult objects are
/// dropped; unknown classes fail.
pub fn pending_image(
    file_name: &str,
    image_id: &str,
    annotation: &VocAnnotation,
    table: &CategoryTable,
) -> Result<PendingImage> {
    let mut boxes = Vec::with_capacity(annotation.objects.len());
    let mut skipped_difficult = 0;
    for object in &annotation.objects {
        if object.is_difficult() {
            skipped_difficult += 1;
            continue;
        }
        boxes.push(PendingBox {
            category_id: table.index(&object.name)? + 1,
            bbox: object.bndbox.to_xywh(),
        });
    }

    Ok(PendingImage {
        image: Image {
            file_name: file_name.to_string(),
            height: annotation.height,
            width: annotation.width,
            id: image_id.to_string(),
        },
        boxes,
        skipped_difficult,
    })
}

/// What the `area` field of an annotation holds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AreaMode {
    /// Area of the whole image, as earlier exports of this converter wrote it
    #[default]
    Image,
    /// Area of the bounding box
    Box,
}

/// Writer for COCO format datasets
pub struct CocoWriter {
    area_mode: AreaMode,
    categories: Vec<Category>,
    images: Vec<Image>,
    annotations: Vec<Annotation>,
}

impl CocoWriter {
    pub fn new(table: &CategoryTable, area_mode: AreaMode) -> Self {
        Self {
            area_mode,
            categories: categories_from_table(table),
            images: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Add an image and number its boxes from `counter`.
    pub fn add_image(&mut self, pending: PendingImage, counter: &mut BoxIdCounter) {
        let image_id = pending.image.id.clone();
        let image_area = pending.image.width as f64 * pending.image.height as f64;
        for b in pending.boxes {
            let area = match self.area_mode {
                AreaMode::Image => image_area,
                AreaMode::Box => b.bbox[2] * b.bbox[3],
            };
            self.annotations.push(Annotation {
                area,
                iscrowd: 0,
                image_id: image_id.clone(),
                bbox: b.bbox,
                category_id: b.category_id,
                id: counter.next_id(),
            });
        }
        self.images.push(pending.image);
    }

    pub fn build(self) -> CocoFile {
        CocoFile {
            images: self.images,
            annotations: self.annotations,
            categories: self.categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::CornerBox;
    use crate::voc::VocObject;

    fn voc(objects: Vec<(&str, u32)>) -> VocAnnotation {
        VocAnnotation {
            folder: None,
            filename: None,
            path: None,
            width: 500,
            height: 375,
            depth: 3,
            objects: objects
                .into_iter()
                .map(|(name, difficult)| VocObject {
                    name: name.to_string(),
                    pose: "Unspecified".to_string(),
                    truncated: 0,
                    difficult,
                    bndbox: CornerBox::new(10.0, 20.0, 110.0, 70.0),
                })
                .collect(),
        }
    }

    #[test]
    fn test_ids_are_monotonic_across_images() {
        let table = CategoryTable::from_names(["cat", "dog"]).unwrap();
        let mut writer = CocoWriter::new(&table, AreaMode::Box);
        let mut counter = BoxIdCounter::new();

        let first = pending_image("a.jpg", "a", &voc(vec![("dog", 0), ("cat", 1)]), &table).unwrap();
        assert_eq!(first.skipped_difficult, 1);
        writer.add_image(first, &mut counter);
        let second = pending_image("b.jpg", "b", &voc(vec![("cat", 0), ("dog", 0)]), &table).unwrap();
        writer.add_image(second, &mut counter);

        let coco = writer.build();
        let ids: Vec<u64> = coco.annotations.iter().map(|a| a.id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(coco.annotations[0].category_id, 2);
        assert_eq!(coco.annotations[0].bbox, [10.0, 20.0, 100.0, 50.0]);
        assert_eq!(coco.annotations[0].area, 5000.0);
        assert_eq!(coco.annotations[1].image_id, "b");
        assert_eq!(coco.categories[0].id, 1);
        assert_eq!(coco.categories[1].supercategory, "dog");
        assert_eq!(counter.peek(), 3);
    }

    #[test]
    fn test_unknown_category() {
        let table = CategoryTable::from_names(["cat"]).unwrap();
        assert!(pending_image("a.jpg", "a", &voc(vec![("dog", 0)]), &table).is_err());
    }

    #[test]
    fn test_json_layout() {
        let table = CategoryTable::from_names(["cat"]).unwrap();
        let mut writer = CocoWriter::new(&table, AreaMode::default());
        let mut counter = BoxIdCounter::new();
        writer.add_image(
            pending_image("000001.jpg", "000001", &voc(vec![("cat", 0)]), &table).unwrap(),
            &mut counter,
        );
        let value = serde_json::to_value(writer.build()).unwrap();
        assert_eq!(value["images"][0]["id"], "000001");
        assert_eq!(value["images"][0]["file_name"], "000001.jpg");
        assert_eq!(value["annotations"][0]["image_id"], "000001");
        assert_eq!(value["annotations"][0]["iscrowd"], 0);
        assert_eq!(value["annotations"][0]["area"], 500.0 * 375.0);
        assert_eq!(value["categories"][0]["name"], "cat");
    }
}
