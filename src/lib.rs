//! Pascal VOC / YOLO / COCO annotation converters
//!
//! This library converts object-detection labels between the VOC XML
//! convention (absolute pixel corners) and the YOLO text convention
//! (normalized centers), exports VOC splits to COCO JSON, and draws either
//! format on its images.

pub mod bbox;
pub mod category;
pub mod coco;
pub mod coco_dataset;
pub mod config;
pub mod conversion;
pub mod error;
pub mod io;
pub mod pairing;
pub mod record;
pub mod types;
pub mod utils;
pub mod visualize;
pub mod voc;
pub mod voc_dataset;
pub mod yolo;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use bbox::{to_absolute_corners, to_normalized_center, CenterBox, CornerBox, PixelBox, RoundingRule};
pub use category::CategoryTable;
pub use error::{Error, Result};
pub use record::{parse_xml, render_xml, AnnotationTree, Node, Record};
pub use types::{ImagePair, OutputDirs, ProcessingStats};
pub use voc::{VocAnnotation, VocObject};
pub use yolo::YoloLabel;

pub use coco_dataset::process_coco_dataset;
pub use voc_dataset::process_yolo_dataset;
pub use yolo_dataset::{process_voc_dataset, process_voclike};
