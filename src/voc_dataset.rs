//! Walker producing a flat VOC-like directory from a YOLO dataset.

use indicatif::ProgressBar;
use log::info;
use rayon::prelude::*;
use std::path::Path;

use crate::bbox::RoundingRule;
use crate::category::CategoryTable;
use crate::config::Yolo2VoclikeArgs;
use crate::conversion::{yolo_to_voc, ImageInfo};
use crate::error::{Error, Result, ResultExt};
use crate::io::{read_yolo_labels, write_voc_annotation};
use crate::pairing::pair_labels_with_images;
use crate::types::{ImagePair, ProcessingStats, VOC_LABEL_EXT, YOLO_LABEL_EXT};
use crate::utils::{
    copy_new_file, create_io_thread_pool, create_output_directory, create_progress_bar,
    file_name_str, file_stem_str, undo_on_error,
};

/// List the label/image pairs of a YOLO dataset root with `images/` and
/// `labels/` subdirectories. Labels without an image are skipped.
pub fn load_yolo_dataset(root: &Path) -> Result<Vec<ImagePair>> {
    let images_dir = root.join("images");
    let labels_dir = root.join("labels");
    for dir in [root, images_dir.as_path(), labels_dir.as_path()] {
        if !dir.is_dir() {
            return Err(Error::config(format!(
                "not a directory: {}",
                dir.display()
            )));
        }
    }
    pair_labels_with_images(&labels_dir, &images_dir, YOLO_LABEL_EXT)
}

/// Context shared by every pair of one run.
pub struct VocOutput<'a> {
    pub dst: &'a Path,
    pub folder: &'a str,
    pub categories: &'a CategoryTable,
    pub rounding: RoundingRule,
}

/// Convert one pair: write a new `<stem>.xml` and copy the image next to it.
/// Nothing is left behind when either file already exists.
pub fn process_pair(pair: &ImagePair, output: &VocOutput) -> Result<ProcessingStats> {
    let labels = read_yolo_labels(&pair.label)?;
    let (width, height) = image::image_dimensions(&pair.image).at_path(&pair.image)?;

    let file_name = file_name_str(&pair.image)?;
    let image = ImageInfo {
        folder: output.folder.to_string(),
        file_name: file_name.to_string(),
        path: pair.image.to_string_lossy().into_owned(),
        width,
        height,
    };
    let annotation =
        yolo_to_voc(&labels, output.categories, &image, output.rounding).at_path(&pair.label)?;

    let image_output_path = output.dst.join(file_name);
    let label_output_path = output
        .dst
        .join(format!("{}.{}", file_stem_str(&pair.label)?, VOC_LABEL_EXT));

    write_voc_annotation(&label_output_path, &annotation)?;
    undo_on_error(&label_output_path, copy_new_file(&pair.image, &image_output_path))?;

    let mut stats = ProcessingStats::new();
    stats.record_pair(annotation.objects.len(), 0);
    Ok(stats)
}

pub fn process_pairs_in_parallel(
    pairs: &[ImagePair],
    output: &VocOutput,
    pb: &ProgressBar,
) -> Result<ProcessingStats> {
    pairs
        .par_iter()
        .map(|pair| {
            let stats = process_pair(pair, output);
            pb.inc(1);
            stats
        })
        .try_reduce(ProcessingStats::new, |a, b| Ok(a.merge(b)))
}

/// Convert a YOLO dataset into a flat VOC-like directory. The classes file is
/// copied into the destination as well.
pub fn process_yolo_dataset(args: &Yolo2VoclikeArgs) -> Result<ProcessingStats> {
    let categories = CategoryTable::load(&args.classes)?;
    let pairs = load_yolo_dataset(&args.src)?;
    info!("Found {} label/image pairs in {}", pairs.len(), args.src.display());

    let dst = create_output_directory(&args.dst)?;
    copy_new_file(&args.classes, &dst.join(file_name_str(&args.classes)?))?;

    let folder = dst
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let output = VocOutput {
        dst: &dst,
        folder: &folder,
        categories: &categories,
        rounding: args.rounding,
    };

    let pool = create_io_thread_pool(args.workers)?;
    let pb = create_progress_bar(pairs.len() as u64, "YOLO");
    let stats = pool.install(|| process_pairs_in_parallel(&pairs, &output, &pb))?;
    pb.finish_with_message("done");

    info!("Save to {}", dst.display());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::fs;

    fn fixture(dir: &Path) -> (ImagePair, CategoryTable) {
        let image = dir.join("a.png");
        RgbImage::new(100, 50).save(&image).unwrap();
        let label = dir.join("a.txt");
        fs::write(&label, "0 0.500000 0.500000 0.250000 0.500000\n").unwrap();
        let categories = CategoryTable::from_names(["cat"]).unwrap();
        (ImagePair { image, label }, categories)
    }

    #[test]
    fn test_process_pair_writes_annotation_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let (pair, categories) = fixture(dir.path());
        let dst = create_output_directory(&dir.path().join("out")).unwrap();
        let output = VocOutput {
            dst: &dst,
            folder: "out",
            categories: &categories,
            rounding: RoundingRule::Truncate,
        };

        let stats = process_pair(&pair, &output).unwrap();
        assert_eq!(stats.objects_written, 1);
        let xml = fs::read_to_string(dst.join("a.xml")).unwrap();
        assert!(xml.contains("<xmin>37</xmin>"));
        assert!(xml.contains("<ymax>37</ymax>"));
        assert!(dst.join("a.png").is_file());
    }

    #[test]
    fn test_existing_annotation_leaves_no_image_behind() {
        let dir = tempfile::tempdir().unwrap();
        let (pair, categories) = fixture(dir.path());
        let dst = create_output_directory(&dir.path().join("out")).unwrap();
        fs::write(dst.join("a.xml"), "<annotation/>").unwrap();
        let output = VocOutput {
            dst: &dst,
            folder: "out",
            categories: &categories,
            rounding: RoundingRule::Truncate,
        };

        let err = process_pair(&pair, &output).unwrap_err();
        assert!(matches!(err, Error::DestinationConflict { .. }));
        assert!(!dst.join("a.png").exists());
        assert_eq!(fs::read_to_string(dst.join("a.xml")).unwrap(), "<annotation/>");
    }

    #[test]
    fn test_existing_image_removes_new_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let (pair, categories) = fixture(dir.path());
        let dst = create_output_directory(&dir.path().join("out")).unwrap();
        fs::write(dst.join("a.png"), b"old").unwrap();
        let output = VocOutput {
            dst: &dst,
            folder: "out",
            categories: &categories,
            rounding: RoundingRule::Truncate,
        };

        assert!(matches!(
            process_pair(&pair, &output),
            Err(Error::DestinationConflict { .. })
        ));
        assert!(!dst.join("a.xml").exists());
        assert_eq!(fs::read(dst.join("a.png")).unwrap(), b"old");
    }
}
