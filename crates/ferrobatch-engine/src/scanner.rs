//! Enumeration of regular files under a source folder

use chrono::{DateTime, Local};
use ferrobatch_types::{Candidate, Error, NamePattern, Result};
use std::fs::Metadata;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Walks a source folder and collects matching regular files
///
/// Symbolic links are never followed. Any error while walking, including an
/// unreadable sub-folder, aborts the scan with [`Error::Scan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCatalogScanner {
    follow_links: bool,
}

impl FileCatalogScanner {
    /// Create a scanner that does not follow symbolic links
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root`, descending into sub-folders when `recurse` is set
    ///
    /// Only files whose bare name matches `pattern` are returned, sorted by path.
    pub fn scan(&self, root: &Path, recurse: bool, pattern: &NamePattern) -> Result<Vec<Candidate>> {
        let metadata = std::fs::metadata(root).map_err(|e| Error::scan(root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(Error::scan(root, "not a directory"));
        }

        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name();
        if !recurse {
            walker = walker.max_depth(1);
        }

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| Error::scan(root, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !pattern.is_match(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| Error::scan(entry.path(), e.to_string()))?;
            let creation_time = creation_time(&metadata, entry.path())
                .map_err(|e| Error::scan(entry.path(), e.to_string()))?;
            candidates.push(Candidate::new(entry.into_path(), creation_time));
        }

        debug!(
            "Scanned {}: {} matching file(s)",
            root.display(),
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Birth time of the file, or its modification time where the platform has none
fn creation_time(metadata: &Metadata, path: &Path) -> io::Result<DateTime<Local>> {
    let time = match metadata.created() {
        Ok(time) => time,
        Err(error) => {
            debug!(
                "No creation time for {} ({}), using modification time",
                path.display(),
                error
            );
            metadata.modified()?
        }
    };
    Ok(DateTime::<Local>::from(time))
}
