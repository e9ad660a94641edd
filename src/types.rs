use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// Supported image formats
pub const IMG_FORMATS: &[&str] = &[
    "bmp", "dng", "jpeg", "jpg", "mpo", "png", "tif", "tiff", "webp", "pfm",
];

pub const VOC_LABEL_EXT: &str = "xml";
pub const YOLO_LABEL_EXT: &str = "txt";

// Precomputed HashSet of image extensions for fast lookup
pub static IMAGE_EXTENSIONS_SET: OnceLock<HashSet<String>> = OnceLock::new();

/// Get the image extensions set
pub fn get_image_extensions_set() -> &'static HashSet<String> {
    IMAGE_EXTENSIONS_SET.get_or_init(|| IMG_FORMATS.iter().map(|ext| ext.to_lowercase()).collect())
}

/// Whether `path` has one of the supported image extensions (case-insensitive)
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| get_image_extensions_set().contains(&ext.to_lowercase()))
}

// An image and the label file describing it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImagePair {
    pub image: PathBuf,
    pub label: PathBuf,
}

// Output directories of a YOLO-style dataset
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub pairs_processed: usize,
    pub labels_written: usize,
    pub objects_written: usize,
    pub skipped_difficult: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pair(&mut self, objects_written: usize, skipped_difficult: usize) {
        self.pairs_processed += 1;
        self.labels_written += 1;
        self.objects_written += objects_written;
        self.skipped_difficult += skipped_difficult;
    }

    pub fn merge(mut self, other: ProcessingStats) -> Self {
        self.pairs_processed += other.pairs_processed;
        self.labels_written += other.labels_written;
        self.objects_written += other.objects_written;
        self.skipped_difficult += other.skipped_difficult;
        self
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Pairs processed: {}", self.pairs_processed);
        log::info!("Label files written: {}", self.labels_written);
        log::info!("Objects written: {}", self.objects_written);
        if self.skipped_difficult > 0 {
            log::info!("Skipped (difficult): {}", self.skipped_difficult);
        }
    }
}
