//! Pairing image files with label files by file stem.

use glob::{glob, Pattern};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result, ResultExt};
use crate::types::{is_image_file, ImagePair};
use crate::utils::file_stem_str;

/// List the regular files directly inside `dir` accepted by `filter`, sorted.
pub fn list_files(dir: &Path, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::config(format!("invalid directory name: {}", dir.display())))?;
    let pattern = format!("{}/*", Pattern::escape(dir_str));
    let mut files: Vec<PathBuf> = glob(&pattern)
        .map_err(|e| Error::config(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file() && filter(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn index_by_stem(files: Vec<PathBuf>) -> Result<HashMap<String, PathBuf>> {
    let mut by_stem = HashMap::with_capacity(files.len());
    for path in files {
        let stem = file_stem_str(&path)?.to_string();
        // Files are sorted, so the first one wins for a repeated stem.
        by_stem.entry(stem).or_insert(path);
    }
    Ok(by_stem)
}

/// Scan `primary_dir` for files accepted by `is_primary` and match each with
/// a file of the same stem in `counterpart_dir` accepted by `is_counterpart`.
/// Files without a counterpart are skipped. Pairs come back as
/// `(primary, counterpart)` in primary file name order.
pub fn pair_by_stem(
    primary_dir: &Path,
    is_primary: impl Fn(&Path) -> bool,
    counterpart_dir: &Path,
    is_counterpart: impl Fn(&Path) -> bool,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let primaries = list_files(primary_dir, is_primary)?;
    let counterparts = index_by_stem(list_files(counterpart_dir, is_counterpart)?)?;

    let mut pairs = Vec::with_capacity(primaries.len());
    for primary in primaries {
        match counterparts.get(file_stem_str(&primary)?) {
            Some(counterpart) => pairs.push((primary, counterpart.clone())),
            None => debug!("No counterpart for {}, skipping", primary.display()),
        }
    }
    Ok(pairs)
}

/// Pair every image in `images_dir` with `<stem>.<label_ext>` in `labels_dir`.
pub fn pair_images_with_labels(
    images_dir: &Path,
    labels_dir: &Path,
    label_ext: &str,
) -> Result<Vec<ImagePair>> {
    let pairs = pair_by_stem(images_dir, is_image_file, labels_dir, |p| {
        has_extension(p, label_ext)
    })?;
    Ok(pairs
        .into_iter()
        .map(|(image, label)| ImagePair { image, label })
        .collect())
}

/// Pair every `*.<label_ext>` file in `labels_dir` with an image of the same
/// stem in `images_dir`.
pub fn pair_labels_with_images(
    labels_dir: &Path,
    images_dir: &Path,
    label_ext: &str,
) -> Result<Vec<ImagePair>> {
    let pairs = pair_by_stem(
        labels_dir,
        |p| has_extension(p, label_ext),
        images_dir,
        is_image_file,
    )?;
    Ok(pairs
        .into_iter()
        .map(|(label, image)| ImagePair { image, label })
        .collect())
}

/// Resolve viewer-style arguments: two files give one pair (both must exist),
/// two directories are scanned for pairs.
pub fn resolve_pairs(image: &Path, label: &Path, label_ext: &str) -> Result<Vec<ImagePair>> {
    if image.is_file() || label.is_file() {
        for path in [image, label] {
            if !path.is_file() {
                return Err(Error::MissingPair {
                    path: path.to_path_buf(),
                });
            }
        }
        return Ok(vec![ImagePair {
            image: image.to_path_buf(),
            label: label.to_path_buf(),
        }]);
    }
    if image.is_dir() && label.is_dir() {
        return pair_images_with_labels(image, label, label_ext);
    }
    Err(Error::config(format!(
        "image and label must both be files or both be directories: {}, {}",
        image.display(),
        label.display()
    )))
}

/// An `<image_set>-<year>` selection of the Pascal VOC devkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSplit {
    pub image_set: String,
    pub year: String,
}

pub const SUPPORTED_SPLITS: &[&str] = &[
    "train-2007",
    "val-2007",
    "test-2007",
    "trainval-2007",
    "train-2012",
    "val-2012",
    "trainval-2012",
];

impl FromStr for DatasetSplit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if !SUPPORTED_SPLITS.contains(&s) {
            return Err(format!(
                "unsupported split '{}', expected one of: {}",
                s,
                SUPPORTED_SPLITS.join(", ")
            ));
        }
        let (image_set, year) = s
            .split_once('-')
            .ok_or_else(|| format!("expected <image_set>-<year>, got '{}'", s))?;
        Ok(Self {
            image_set: image_set.to_string(),
            year: year.to_string(),
        })
    }
}

impl fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.image_set, self.year)
    }
}

/// A Pascal VOC devkit checkout: `<root>/VOCdevkit/VOC<year>/...`.
#[derive(Debug, Clone)]
pub struct VocDevkit {
    root: PathBuf,
}

impl VocDevkit {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::config(format!(
                "VOC root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Directory of one year, accepting both `<root>/VOCdevkit/VOC<year>` and
    /// `<root>/VOC<year>`.
    pub fn year_dir(&self, year: &str) -> PathBuf {
        let name = format!("VOC{}", year);
        let nested = self.root.join("VOCdevkit").join(&name);
        if nested.is_dir() {
            nested
        } else {
            self.root.join(name)
        }
    }

    /// List the image ids of a split.
    pub fn image_ids(&self, split: &DatasetSplit) -> Result<Vec<String>> {
        let list_path = self
            .year_dir(&split.year)
            .join("ImageSets/Main")
            .join(format!("{}.txt", split.image_set));
        if !list_path.is_file() {
            return Err(Error::config(format!(
                "split list does not exist: {}",
                list_path.display()
            )));
        }
        let content = fs::read_to_string(&list_path).at_path(&list_path)?;
        Ok(content
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect())
    }

    /// Pair every listed id with its image and annotation. The list is
    /// explicit, so a missing file is an error rather than a skip.
    pub fn pairs(&self, split: &DatasetSplit) -> Result<Vec<ImagePair>> {
        let year_dir = self.year_dir(&split.year);
        let images_dir = year_dir.join("JPEGImages");
        let annotations_dir = year_dir.join("Annotations");

        self.image_ids(split)?
            .into_iter()
            .map(|id| {
                let image = images_dir.join(format!("{}.jpg", id));
                let label = annotations_dir.join(format!("{}.xml", id));
                for path in [&image, &label] {
                    if !path.is_file() {
                        return Err(Error::MissingPair { path: path.clone() });
                    }
                }
                Ok(ImagePair { image, label })
            })
            .collect()
    }
}
