//! Glob-based file enumeration.

use std::path::{Path, PathBuf};

use glob::Pattern;

/// Lazily enumerate files under `dir` matching `pattern`.
///
/// `pattern` is a file-name glob such as `appmanifest_*.acf`. With
/// `recursive` the whole subtree is walked; otherwise only direct children
/// match. Special characters in `dir` itself are escaped, so the directory
/// path is always taken literally.
///
/// Enumeration is pull-based: entries are produced as the returned iterator
/// is advanced, and unreadable entries are skipped rather than reported. A
/// nonexistent directory yields an empty sequence.
pub fn enumerate_files(
    dir: &Path,
    pattern: &str,
    recursive: bool,
) -> impl Iterator<Item = PathBuf> {
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let full = if recursive {
        format!("{escaped}/**/{pattern}")
    } else {
        format!("{escaped}/{pattern}")
    };

    glob::glob(&full)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
}
