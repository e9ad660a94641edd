use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Create a thread pool for per-pair processing. Zero keeps rayon's default
/// size.
pub fn create_io_thread_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::config(format!("failed to build thread pool: {}", e)))
}

/// Create an output directory (and its parents) if needed. Existing
/// directories are kept; files inside them are never replaced.
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if path.exists() && !path.is_dir() {
        return Err(Error::config(format!(
            "{} exists and is not a directory",
            path.display()
        )));
    }
    fs::create_dir_all(path).at_path(path)?;
    Ok(path.to_path_buf())
}

/// Open a new file for writing, failing if anything already exists at `path`.
pub fn create_new_file(path: &Path) -> Result<BufWriter<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::DestinationConflict {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::from(e).at(path)),
    }
}

/// Write `content` to a new file at `path`.
pub fn write_new_file(path: &Path, content: &[u8]) -> Result<()> {
    let mut writer = create_new_file(path)?;
    writer.write_all(content).at_path(path)?;
    writer.flush().at_path(path)
}

/// Copy `src` to a new file at `dst` without overwriting.
pub fn copy_new_file(src: &Path, dst: &Path) -> Result<u64> {
    let mut reader = BufReader::new(File::open(src).at_path(src)?);
    let mut writer = create_new_file(dst)?;
    let bytes = io::copy(&mut reader, &mut writer).at_path(dst)?;
    writer.flush().at_path(dst)?;
    debug!("Copied {} -> {}", src.display(), dst.display());
    Ok(bytes)
}

/// Remove the file at `written` when the step that followed it failed, so a
/// failed pair leaves no half-written output behind.
pub fn undo_on_error<T>(written: &Path, next: Result<T>) -> Result<T> {
    if next.is_err() {
        if let Err(e) = fs::remove_file(written) {
            warn!("Failed to remove {}: {}", written.display(), e);
        }
    }
    next
}

/// File name of `path` as UTF-8, or a configuration error naming the path.
pub fn file_name_str(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::config(format!("invalid file name: {}", path.display())))
}

/// File stem of `path` as UTF-8, or a configuration error naming the path.
pub fn file_stem_str(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::config(format!("invalid file name: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_new_file_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        write_new_file(&path, b"first").unwrap();
        let err = write_new_file(&path, b"second").unwrap_err();
        assert!(matches!(err, Error::DestinationConflict { ref path } if path.ends_with("a.txt")));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_copy_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, [1u8, 2, 3]).unwrap();
        assert_eq!(copy_new_file(&src, &dst).unwrap(), 3);
        assert!(copy_new_file(&src, &dst).is_err());
        assert_eq!(fs::read(&dst).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_undo_on_error_removes_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let written = dir.path().join("label.txt");
        write_new_file(&written, b"0 0.5 0.5 0.1 0.1\n").unwrap();
        assert_eq!(undo_on_error(&written, Ok(3)).unwrap(), 3);
        assert!(written.exists());

        let failed: Result<()> = Err(Error::config("copy failed"));
        assert!(undo_on_error(&written, failed).is_err());
        assert!(!written.exists());
    }

    #[test]
    fn test_create_output_directory_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/labels");
        create_output_directory(&out).unwrap();
        fs::write(out.join("keep.txt"), "x").unwrap();
        create_output_directory(&out).unwrap();
        assert!(out.join("keep.txt").exists());
    }
}
