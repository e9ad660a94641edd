//! COCO dataset processing module
//!
//! Converts Pascal VOC splits into COCO-style detection indexes, one
//! `instances_<set><year>.json` per split.

use log::info;
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::category::CategoryTable;
use crate::coco::{pending_image, AreaMode, BoxIdCounter, CocoFile, CocoWriter, PendingImage};
use crate::config::Voc2CocoArgs;
use crate::error::{Result, ResultExt};
use crate::io::read_voc_annotation;
use crate::pairing::{DatasetSplit, VocDevkit};
use crate::types::{ImagePair, ProcessingStats};
use crate::utils::{
    copy_new_file, create_io_thread_pool, create_new_file, create_output_directory,
    create_progress_bar, file_name_str, file_stem_str,
};

/// Struct to hold the paths to the output directories for one COCO split
#[derive(Debug)]
pub struct CocoOutputDirs {
    pub annotations_dir: PathBuf,
    pub images_dir: PathBuf,
}

/// Set up the directory structure for COCO dataset output
pub fn setup_coco_output_directories(dst: &Path, split: &DatasetSplit) -> Result<CocoOutputDirs> {
    let images_dir = create_output_directory(&dst.join("images").join(split.to_string()))?;
    let annotations_dir = create_output_directory(&dst.join("annotations"))?;
    Ok(CocoOutputDirs {
        annotations_dir,
        images_dir,
    })
}

/// Convert one pair and copy its image. Box ids are assigned later.
fn process_pair(
    pair: &ImagePair,
    categories: &CategoryTable,
    images_dir: &Path,
) -> Result<PendingImage> {
    let annotation = read_voc_annotation(&pair.label)?;
    let file_name = file_name_str(&pair.image)?;
    let pending = pending_image(file_name, file_stem_str(&pair.image)?, &annotation, categories)
        .at_path(&pair.label)?;

    copy_new_file(&pair.image, &images_dir.join(file_name))?;
    Ok(pending)
}

/// Build the COCO index of a list of pairs.
///
/// Pairs are converted in parallel, then numbered in pair order from
/// `counter`, so the ids do not depend on the number of workers.
pub fn build_coco_file(
    pairs: &[ImagePair],
    categories: &CategoryTable,
    area_mode: AreaMode,
    images_dir: &Path,
    counter: &mut BoxIdCounter,
    stats: &mut ProcessingStats,
) -> Result<CocoFile> {
    let pb = create_progress_bar(pairs.len() as u64, "COCO");
    let pending: Vec<PendingImage> = pairs
        .par_iter()
        .map(|pair| {
            let result = process_pair(pair, categories, images_dir);
            pb.inc(1);
            result
        })
        .collect::<Result<_>>()?;
    pb.finish_with_message("done");

    let mut writer = CocoWriter::new(categories, area_mode);
    for image in pending {
        stats.record_pair(image.boxes.len(), image.skipped_difficult);
        writer.add_image(image, counter);
    }
    Ok(writer.build())
}

/// Serialize a COCO index to a new file.
pub fn write_coco_file(path: &Path, coco: &CocoFile) -> Result<()> {
    let mut writer = create_new_file(path)?;
    serde_json::to_writer(&mut writer, coco).at_path(path)?;
    writer.flush().at_path(path)
}

/// Main COCO dataset processing pipeline
pub fn process_coco_dataset(args: &Voc2CocoArgs) -> Result<ProcessingStats> {
    let categories = CategoryTable::load(&args.classes)?;
    info!("Loaded {} categories from {}", categories.len(), args.classes.display());

    let devkit = VocDevkit::new(&args.voc)?;
    let pool = create_io_thread_pool(args.workers)?;
    let mut stats = ProcessingStats::new();

    for split in &args.list {
        info!("Process Pascal VOC {} {}", split.image_set, split.year);
        let pairs = devkit.pairs(split)?;
        let output_dirs = setup_coco_output_directories(&args.coco, split)?;

        // Every split numbers its boxes from zero.
        let mut counter = BoxIdCounter::new();
        let coco = pool.install(|| {
            build_coco_file(
                &pairs,
                &categories,
                args.area,
                &output_dirs.images_dir,
                &mut counter,
                &mut stats,
            )
        })?;

        let annotation_path = output_dirs
            .annotations_dir
            .join(format!("instances_{}.json", split));
        write_coco_file(&annotation_path, &coco)?;
        info!(
            "Save to {} ({} images, {} boxes)",
            annotation_path.display(),
            coco.images.len(),
            coco.annotations.len()
        );
    }

    Ok(stats)
}
