//! The category table: an immutable, ordered list of class names where a
//! class id is its zero-based position.

use jwalk::WalkDir;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result, ResultExt};
use crate::io::read_annotation_tree;
use crate::record::{AnnotationTree, Record};
use crate::utils::create_new_file;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl CategoryTable {
    /// Build a table from names in id order. Names must be unique.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut ids = HashMap::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            if ids.insert(name.clone(), id).is_some() {
                return Err(Error::config(format!("duplicate category name '{}'", name)));
            }
        }
        Ok(Self { names, ids })
    }

    /// Parse a classes file: whitespace-delimited names, order defines ids.
    pub fn parse(content: &str) -> Result<Self> {
        let table = Self::from_names(content.split_whitespace())?;
        if table.is_empty() {
            return Err(Error::config("classes file contains no category names"));
        }
        Ok(table)
    }

    /// Load a classes file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::config(format!(
                "classes file does not exist: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).at_path(path)?;
        Self::parse(&content).at_path(path)
    }

    pub fn index(&self, name: &str) -> Result<usize> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownCategory {
                name: name.to_string(),
            })
    }

    pub fn name(&self, id: usize) -> Result<&str> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                id,
                len: self.names.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Collect every object name used by the VOC XML files below `root`,
/// sorted and deduplicated. Only `object.name` is read, so files without
/// sizes or boxes still contribute their classes.
pub fn discover_categories(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(Error::config(format!(
            "label root is not a directory: {}",
            root.display()
        )));
    }

    info!("Retrieval {}", root.display());
    let mut xml_paths = Vec::new();
    for entry in WalkDir::new(root).skip_hidden(false) {
        let entry = entry
            .map_err(|e| Error::config(format!("failed to walk {}: {}", root.display(), e)))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            xml_paths.push(path);
        }
    }
    info!("Found {} XML files.", xml_paths.len());

    let per_file: Vec<Vec<String>> = xml_paths
        .par_iter()
        .map(|path| {
            let names = object_names(&read_annotation_tree(path)?).at_path(path)?;
            debug!("{}: {} objects", path.display(), names.len());
            Ok(names)
        })
        .collect::<Result<_>>()?;

    let names: BTreeSet<String> = per_file.into_iter().flatten().collect();
    Ok(names.into_iter().collect())
}

fn object_names(tree: &AnnotationTree) -> Result<Vec<String>> {
    if tree.tag != "annotation" {
        return Err(Error::missing_field("annotation"));
    }
    tree.body
        .get_all("object")
        .iter()
        .enumerate()
        .map(|(index, object)| {
            object
                .get("name")
                .and_then(Record::text)
                .map(str::to_string)
                .ok_or_else(|| Error::missing_field(format!("object[{}].name", index)))
        })
        .collect()
}

/// Write names one per line to `path`, refusing to overwrite.
pub fn write_categories(path: &Path, names: &[String]) -> Result<()> {
    let mut file = create_new_file(path)?;
    for name in names {
        writeln!(file, "{}", name).at_path(path)?;
    }
    file.flush().at_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_symmetry() {
        let table = CategoryTable::from_names(["cat", "dog"]).unwrap();
        assert_eq!(table.index("dog").unwrap(), 1);
        assert_eq!(table.name(1).unwrap(), "dog");
        assert!(matches!(
            table.index("bird"),
            Err(Error::UnknownCategory { ref name }) if name == "bird"
        ));
        assert!(matches!(
            table.name(2),
            Err(Error::IndexOutOfRange { id: 2, len: 2 })
        ));
    }

    #[test]
    fn test_parse_any_whitespace() {
        let table = CategoryTable::parse("person car\nbicycle\n\n  dog\n").unwrap();
        assert_eq!(table.names(), ["person", "car", "bicycle", "dog"]);
        assert_eq!(table.index("dog").unwrap(), 3);
    }

    #[test]
    fn test_duplicates_and_empty_are_rejected() {
        assert!(matches!(
            CategoryTable::parse("cat dog cat"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(CategoryTable::parse(" \n"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_discover_reads_only_object_names() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join("one.xml"),
            "<annotation><object><name>dog</name></object><object><name>cat</name></object></annotation>",
        )
        .unwrap();
        fs::write(
            nested.join("two.xml"),
            "<annotation><size><width>10</width></size><object><name>dog</name><bndbox><xmin>1</xmin></bndbox></object></annotation>",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "bird").unwrap();

        assert_eq!(discover_categories(dir.path()).unwrap(), ["cat", "dog"]);
    }

    #[test]
    fn test_discover_nameless_object_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xml");
        fs::write(&path, "<annotation><object><pose>Left</pose></object></annotation>").unwrap();
        let err = discover_categories(dir.path()).unwrap_err();
        assert!(matches!(err.kind(), Error::MissingField { field } if field == "object[0].name"));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_unreadable_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("a.xml"), "<annotation/>").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the directory anyway.
        let readable = fs::read_dir(&locked).is_ok();
        let result = discover_categories(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
