use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::error::{Result, ResultExt};
use crate::record::{parse_xml_reader, render_xml, AnnotationTree};
use crate::types::OutputDirs;
use crate::utils::{create_output_directory, write_new_file};
use crate::voc::VocAnnotation;
use crate::yolo::{format_yolo_labels, parse_yolo_labels, YoloLabel};

/// Set up `images/` and `labels/` below a YOLO-style dataset root
pub fn setup_output_directories(dst: &Path) -> Result<OutputDirs> {
    let images_dir = create_output_directory(&dst.join("images"))?;
    let labels_dir = create_output_directory(&dst.join("labels"))?;
    Ok(OutputDirs {
        images_dir,
        labels_dir,
    })
}

/// Read and parse an XML file into a generic tree, streaming from disk
pub fn read_annotation_tree(path: &Path) -> Result<AnnotationTree> {
    let file = File::open(path).at_path(path)?;
    parse_xml_reader(BufReader::new(file)).at_path(path)
}

/// Read a VOC XML file and extract the typed record
pub fn read_voc_annotation(path: &Path) -> Result<VocAnnotation> {
    let tree = read_annotation_tree(path)?;
    VocAnnotation::from_tree(&tree).at_path(path)
}

pub fn read_yolo_labels(path: &Path) -> Result<Vec<YoloLabel>> {
    let content = fs::read_to_string(path).at_path(path)?;
    parse_yolo_labels(&content).at_path(path)
}

pub fn write_yolo_labels(path: &Path, labels: &[YoloLabel]) -> Result<()> {
    write_new_file(path, format_yolo_labels(labels).as_bytes())
}

pub fn write_voc_annotation(path: &Path, annotation: &VocAnnotation) -> Result<()> {
    let xml = render_xml(&annotation.to_tree()).at_path(path)?;
    write_new_file(path, xml.as_bytes())
}
