use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::patterns::{normalize_path, ExclusionRules};
use crate::sniffer::TypeSniffer;
use crate::tokenizer::TokenCounter;
use crate::types::FileRecord;

/// Directory names that are never descended into.
pub const IGNORED_DIRS: &[&str] = &[".git", "__pycache__"];

/// Collects every qualifying text file under `root` (or `root` itself when
/// it names a file).
///
/// Files are visited depth-first in file-name order. Decode failures are
/// logged and skipped. A root that does not exist is returned as
/// [`Error::PathNotFound`] for the caller to record.
pub fn collect(
    root: &Path,
    rules: &ExclusionRules,
    sniffer: &dyn TypeSniffer,
    counter: Option<&TokenCounter>,
) -> Result<Vec<FileRecord>> {
    let root = if root == Path::new(".") {
        current_dir()?
    } else {
        root.to_path_buf()
    };

    if root.is_dir() {
        Ok(collect_dir(&root, rules, sniffer, counter))
    } else if root.is_file() {
        let cwd = current_dir()?;
        let absolute = if root.is_absolute() {
            root.clone()
        } else {
            cwd.join(&root)
        };
        let relative = pathdiff::diff_paths(&absolute, &cwd).unwrap_or_else(|| root.clone());

        Ok(read_candidate(&root, &relative, rules, sniffer, counter)
            .into_iter()
            .collect())
    } else {
        warn!("Path {} does not exist.", root.display());
        Err(Error::PathNotFound(root))
    }
}

fn collect_dir(
    root: &Path,
    rules: &ExclusionRules,
    sniffer: &dyn TypeSniffer,
    counter: Option<&TokenCounter>,
) -> Vec<FileRecord> {
    let mut records = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| should_descend(e, root, rules));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !is_file_candidate(&entry) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        if let Some(record) = read_candidate(entry.path(), relative, rules, sniffer, counter) {
            records.push(record);
        }
    }

    records
}

fn should_descend(entry: &DirEntry, root: &Path, rules: &ExclusionRules) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }

    let name = entry.file_name().to_string_lossy();
    if IGNORED_DIRS.contains(&&*name) {
        return false;
    }

    match entry.path().strip_prefix(root) {
        Ok(relative) if rules.matches_pattern(relative, true) => {
            debug!("Pruning directory {}", relative.display());
            false
        }
        _ => true,
    }
}

// Regular files and links that do not point at a directory.
fn is_file_candidate(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
}

fn read_candidate(
    path: &Path,
    relative: &Path,
    rules: &ExclusionRules,
    sniffer: &dyn TypeSniffer,
    counter: Option<&TokenCounter>,
) -> Option<FileRecord> {
    if rules.is_excluded(relative) {
        debug!("Excluded by rule: {}", relative.display());
        return None;
    }

    if sniffer.is_skipped(path) {
        debug!("Skipped by file type: {}", relative.display());
        return None;
    }

    let content = match read_text(path) {
        Ok(content) => content,
        Err(Error::Decode(_)) => {
            warn!("Unable to read file {} in utf-8 encoding.", path.display());
            return None;
        }
        Err(e) => {
            warn!("{e}");
            return None;
        }
    };

    let record = FileRecord::new(normalize_path(relative), content);
    Some(match counter {
        Some(counter) => {
            let count = counter.count_tokens(&record.content);
            record.with_token_count(count)
        }
        None => record,
    })
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| Error::Decode(path.to_path_buf()))
}

fn current_dir() -> Result<PathBuf> {
    env::current_dir().map_err(|source| Error::Io {
        path: PathBuf::from("."),
        source,
    })
}
