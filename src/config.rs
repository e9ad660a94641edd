use clap::Parser;
use std::path::PathBuf;

use crate::bbox::RoundingRule;
use crate::coco::AreaMode;
use crate::pairing::DatasetSplit;

/// Convert Pascal VOC detection splits to a YOLO dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Voc2YoloArgs {
    /// Root of the Pascal VOC dataset (containing VOCdevkit/)
    #[arg(short = 's', long = "src")]
    pub src: PathBuf,

    /// Root of the YOLO dataset to create
    #[arg(short = 'd', long = "dst")]
    pub dst: PathBuf,

    /// Splits to convert, e.g. trainval-2007 test-2007
    #[arg(short = 'l', long = "list", num_args = 1.., required = true, value_parser = parse_split)]
    pub list: Vec<DatasetSplit>,

    /// Classes file, one name per whitespace-delimited token
    #[arg(long = "classes", default_value = "voc.names")]
    pub classes: PathBuf,

    /// Worker threads for per-image processing (0 = one per core)
    #[arg(long = "workers", default_value_t = 0)]
    pub workers: usize,
}

/// Convert VOC-like XML labels to YOLO labels.
///
/// SOURCE may be a single XML file or a directory holding images and XML files
/// side by side.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct VoclikeArgs {
    /// VOC-like XML file, or flat directory of images and XML files
    pub source: PathBuf,

    /// Classes file
    pub classes: PathBuf,

    /// Output root; required for a directory source
    #[arg(long = "dst")]
    pub dst: Option<PathBuf>,

    /// Worker threads for per-image processing (0 = one per core)
    #[arg(long = "workers", default_value_t = 0)]
    pub workers: usize,
}

/// Convert a YOLO dataset (images/ and labels/) to a flat VOC-like directory.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Yolo2VoclikeArgs {
    /// YOLO dataset root containing images/ and labels/
    pub src: PathBuf,

    /// Classes file
    pub classes: PathBuf,

    /// VOC-like output directory
    pub dst: PathBuf,

    /// Rounding applied when recovering pixel corners
    #[arg(long = "rounding", value_enum, default_value = "truncate")]
    pub rounding: RoundingRule,

    /// Worker threads for per-image processing (0 = one per core)
    #[arg(long = "workers", default_value_t = 0)]
    pub workers: usize,
}

/// Convert Pascal VOC detection splits to COCO-style annotations.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Voc2CocoArgs {
    /// Root of the Pascal VOC dataset (containing VOCdevkit/)
    #[arg(short = 'v', long = "voc")]
    pub voc: PathBuf,

    /// Root of the COCO-style dataset to create
    #[arg(short = 'c', long = "coco")]
    pub coco: PathBuf,

    /// Splits to convert, e.g. train-2007 val-2012
    #[arg(short = 'l', long = "list", num_args = 1.., required = true, value_parser = parse_split)]
    pub list: Vec<DatasetSplit>,

    /// Classes file
    #[arg(long = "classes", default_value = "voc.names")]
    pub classes: PathBuf,

    /// Value written to each annotation's `area`
    #[arg(long = "area", value_enum, default_value = "image")]
    pub area: AreaMode,

    /// Worker threads for per-image processing (0 = one per core)
    #[arg(long = "workers", default_value_t = 0)]
    pub workers: usize,
}

/// Draw VOC-like boxes on their images.
///
/// IMAGE and LABEL are either both files or both directories.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ShowVoclikeArgs {
    /// Image file or directory
    pub image: PathBuf,

    /// VOC-like XML file or directory
    pub label: PathBuf,

    /// Directory to save annotated images
    #[arg(long = "dst")]
    pub dst: Option<PathBuf>,

    /// TrueType font used to draw class names
    #[arg(long = "font")]
    pub font: Option<PathBuf>,
}

/// Draw YOLO-like boxes on their images.
///
/// IMAGE and LABEL are either both files or both directories.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ShowYololikeArgs {
    /// Image file or directory
    pub image: PathBuf,

    /// YOLO label file or directory
    pub label: PathBuf,

    /// Directory to save annotated images
    #[arg(long = "dst")]
    pub dst: Option<PathBuf>,

    /// TrueType font used to draw class labels
    #[arg(long = "font")]
    pub font: Option<PathBuf>,

    /// Classes file; class names are drawn instead of ids
    #[arg(long = "classes")]
    pub classes: Option<PathBuf>,

    /// Rounding applied when recovering pixel corners
    #[arg(long = "rounding", value_enum, default_value = "truncate")]
    pub rounding: RoundingRule,
}

/// Collect the class names used by a tree of VOC-like XML files.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct FindClassesArgs {
    /// VOC-like data root
    pub label: PathBuf,

    /// Directory receiving classes.txt
    #[arg(long = "dst", default_value = "./output")]
    pub dst: PathBuf,
}

// Parse and validate an <image_set>-<year> split
fn parse_split(s: &str) -> Result<DatasetSplit, String> {
    s.parse()
}
