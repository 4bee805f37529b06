// src/output/writer.rs
// =============================================================================
// The output tree for one crawl session.
//
// OutputTree owns two things:
// - the root directory every markdown file is written under
// - the written-path set: relative paths already written this session
//
// A path is written at most once per session. A second page that normalizes
// to the same path is ignored, even if its content differs. Files left over
// from an earlier run are overwritten, never merged.
// =============================================================================

use crate::error::CrawlError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct OutputTree {
    root: PathBuf,
    written: HashSet<String>,
    // Same paths as `written`, in the order they hit the disk
    order: Vec<String>,
}

impl OutputTree {
    // Creates the root directory (and its parents) and an empty written set.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, CrawlError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| CrawlError::Io {
            path: root.clone(),
            source,
        })?;

        Ok(Self {
            root,
            written: HashSet::new(),
            order: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, relative: &str) -> bool {
        self.written.contains(relative)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    // Writes `contents` to `root/relative` unless that path was already
    // written this session.
    //
    // Returns the full path when a file was written, None for a duplicate.
    pub fn write_once(
        &mut self,
        relative: &str,
        contents: &str,
    ) -> Result<Option<PathBuf>, CrawlError> {
        if self.contains(relative) {
            return Ok(None);
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CrawlError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&path, contents).map_err(|source| CrawlError::Io {
            path: path.clone(),
            source,
        })?;

        self.written.insert(relative.to_string());
        self.order.push(relative.to_string());
        Ok(Some(path))
    }

    // Relative paths in write order.
    pub fn into_written(self) -> Vec<String> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_root_with_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("docs/tanstack/start");

        let tree = OutputTree::create(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(tree.root(), root.as_path());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_writes_nested_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = OutputTree::create(tmp.path()).unwrap();

        let written = tree
            .write_once("framework/react/overview.md", "# Overview")
            .unwrap();

        let expected = tmp.path().join("framework/react/overview.md");
        assert_eq!(written, Some(expected.clone()));
        assert_eq!(fs::read_to_string(expected).unwrap(), "# Overview");
        assert!(tree.contains("framework/react/overview.md"));
    }

    #[test]
    fn test_second_write_to_same_path_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = OutputTree::create(tmp.path()).unwrap();

        tree.write_once("index.md", "first").unwrap();
        let second = tree.write_once("index.md", "second").unwrap();

        assert_eq!(second, None);
        assert_eq!(tree.len(), 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("index.md")).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_overwrites_file_from_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("index.md"), "stale content from last run").unwrap();

        let mut tree = OutputTree::create(tmp.path()).unwrap();
        tree.write_once("index.md", "fresh").unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join("index.md")).unwrap(),
            "fresh"
        );
    }

    #[test]
    fn test_into_written_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = OutputTree::create(tmp.path()).unwrap();

        tree.write_once("b.md", "b").unwrap();
        tree.write_once("a.md", "a").unwrap();
        tree.write_once("b.md", "again").unwrap();

        assert_eq!(tree.into_written(), vec!["b.md".to_string(), "a.md".to_string()]);
    }
}
