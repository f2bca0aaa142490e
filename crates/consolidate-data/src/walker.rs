//! Discovery of transaction files in the `<year>/<month>/<day>/<file>` tree.
//!
//! Siblings are visited in lexicographic file-name order at every level so
//! that the consolidated row order is reproducible across filesystems.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

const MONTH_DEPTH: usize = 1;
const DAY_DEPTH: usize = 2;
const FILE_DEPTH: usize = 3;

/// A file found under a day directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayFile {
    pub path: PathBuf,
    /// Name of the enclosing day directory.
    pub day: String,
}

/// Lazily enumerate every non-directory entry at `root/<month>/<day>/`.
///
/// Non-directories at the month and day levels are ignored. A `root` that
/// is not a directory yields nothing.
pub fn walk_day_files(root: &Path) -> impl Iterator<Item = DayFile> {
    let walker = if root.is_dir() {
        info!("Accessing Year: {}", root.display());
        Some(
            WalkDir::new(root)
                .min_depth(MONTH_DEPTH)
                .max_depth(FILE_DEPTH)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter(),
        )
    } else {
        warn!("Root is not a directory: {}", root.display());
        None
    };

    walker
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Error walking transaction tree: {}", e);
                None
            }
        })
        .filter_map(classify_entry)
}

fn classify_entry(entry: DirEntry) -> Option<DayFile> {
    let is_dir = entry.file_type().is_dir();
    match entry.depth() {
        MONTH_DEPTH if is_dir => {
            info!("  Accessing Month: {}", entry.file_name().to_string_lossy());
            None
        }
        DAY_DEPTH if is_dir => {
            info!("    Accessing Day: {}", entry.file_name().to_string_lossy());
            None
        }
        FILE_DEPTH if !is_dir => {
            let day = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some(DayFile {
                path: entry.into_path(),
                day,
            })
        }
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
