//! Walkers producing YOLO-style datasets from VOC-style records.

use indicatif::ProgressBar;
use log::info;
use rayon::prelude::*;
use std::path::Path;

use crate::category::CategoryTable;
use crate::config::{Voc2YoloArgs, VoclikeArgs};
use crate::conversion::{voc_to_yolo, YoloConversion};
use crate::error::{Error, Result, ResultExt};
use crate::io::{read_voc_annotation, setup_output_directories, write_yolo_labels};
use crate::pairing::{pair_images_with_labels, VocDevkit};
use crate::types::{ImagePair, OutputDirs, ProcessingStats, VOC_LABEL_EXT, YOLO_LABEL_EXT};
use crate::utils::{
    copy_new_file, create_io_thread_pool, create_progress_bar, file_name_str, file_stem_str,
    undo_on_error,
};
use crate::yolo::format_yolo_labels;

/// Convert one image/XML pair: write `<stem>.txt` and copy the image.
///
/// The record is fully converted before anything is written, so a bad record
/// leaves no output behind. The label is written first and removed again if
/// the image cannot be copied.
pub fn process_pair(
    pair: &ImagePair,
    categories: &CategoryTable,
    output_dirs: &OutputDirs,
) -> Result<ProcessingStats> {
    let annotation = read_voc_annotation(&pair.label)?;
    let conversion = voc_to_yolo(&annotation, categories).at_path(&pair.label)?;

    let image_output_path = output_dirs.images_dir.join(file_name_str(&pair.image)?);
    let label_output_path = output_dirs
        .labels_dir
        .join(format!("{}.{}", file_stem_str(&pair.image)?, YOLO_LABEL_EXT));

    write_yolo_labels(&label_output_path, &conversion.labels)?;
    undo_on_error(&label_output_path, copy_new_file(&pair.image, &image_output_path))?;

    let mut stats = ProcessingStats::new();
    stats.record_pair(conversion.labels.len(), conversion.skipped_difficult);
    Ok(stats)
}

/// Process pairs in parallel, stopping the run at the first error.
pub fn process_pairs_in_parallel(
    pairs: &[ImagePair],
    categories: &CategoryTable,
    output_dirs: &OutputDirs,
    pb: &ProgressBar,
) -> Result<ProcessingStats> {
    pairs
        .par_iter()
        .map(|pair| {
            let stats = process_pair(pair, categories, output_dirs);
            pb.inc(1);
            stats
        })
        .try_reduce(ProcessingStats::new, |a, b| Ok(a.merge(b)))
}

/// Convert the requested Pascal VOC splits into `dst/images` and `dst/labels`.
pub fn process_voc_dataset(args: &Voc2YoloArgs) -> Result<ProcessingStats> {
    let categories = CategoryTable::load(&args.classes)?;
    info!("Loaded {} categories from {}", categories.len(), args.classes.display());

    let devkit = VocDevkit::new(&args.src)?;
    let output_dirs = setup_output_directories(&args.dst)?;
    let pool = create_io_thread_pool(args.workers)?;

    let mut total = ProcessingStats::new();
    for split in &args.list {
        info!("Process Pascal VOC{} {}", split.year, split.image_set);
        let pairs = devkit.pairs(split)?;
        let pb = create_progress_bar(pairs.len() as u64, &split.to_string());
        let stats =
            pool.install(|| process_pairs_in_parallel(&pairs, &categories, &output_dirs, &pb))?;
        pb.finish_with_message("done");
        total = total.merge(stats);
    }

    Ok(total)
}

/// Convert a single VOC-like XML file.
pub fn convert_voclike_file(xml_path: &Path, categories: &CategoryTable) -> Result<YoloConversion> {
    let annotation = read_voc_annotation(xml_path)?;
    voc_to_yolo(&annotation, categories).at_path(xml_path)
}

/// Convert a flat directory of images and XML files sharing stems.
pub fn process_voclike_directory(
    source: &Path,
    categories: &CategoryTable,
    dst: &Path,
    workers: usize,
) -> Result<ProcessingStats> {
    let pairs = pair_images_with_labels(source, source, VOC_LABEL_EXT)?;
    info!("Found {} image/label pairs in {}", pairs.len(), source.display());

    let output_dirs = setup_output_directories(dst)?;
    let pool = create_io_thread_pool(workers)?;
    let pb = create_progress_bar(pairs.len() as u64, "VOC-like");
    let stats = pool.install(|| process_pairs_in_parallel(&pairs, categories, &output_dirs, &pb))?;
    pb.finish_with_message("done");
    Ok(stats)
}

/// Result of the `voclike2yolo` tool: converted content for a single file, or
/// statistics for a directory.
#[derive(Debug)]
pub enum VoclikeOutcome {
    Printed(String),
    Written(ProcessingStats),
}

pub fn process_voclike(args: &VoclikeArgs) -> Result<VoclikeOutcome> {
    let categories = CategoryTable::load(&args.classes)?;

    if args.source.is_file() {
        let conversion = convert_voclike_file(&args.source, &categories)?;
        if let Some(dst) = &args.dst {
            let labels_dir = setup_output_directories(dst)?.labels_dir;
            let label_path =
                labels_dir.join(format!("{}.{}", file_stem_str(&args.source)?, YOLO_LABEL_EXT));
            write_yolo_labels(&label_path, &conversion.labels)?;
            let mut stats = ProcessingStats::new();
            stats.record_pair(conversion.labels.len(), conversion.skipped_difficult);
            return Ok(VoclikeOutcome::Written(stats));
        }
        return Ok(VoclikeOutcome::Printed(format_yolo_labels(&conversion.labels)));
    }

    if args.source.is_dir() {
        let dst = args.dst.as_ref().ok_or_else(|| {
            Error::config("--dst is required when the source is a directory")
        })?;
        return process_voclike_directory(&args.source, &categories, dst, args.workers)
            .map(VoclikeOutcome::Written);
    }

    Err(Error::config(format!(
        "source does not exist: {}",
        args.source.display()
    )))
}
