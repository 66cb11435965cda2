use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::git_processor::GitProcessor;
use crate::output::{assemble, write_shards, AssembleOptions, Documentation};
use crate::patterns::{load_gitignore_patterns, ExclusionRules};
use crate::sniffer::{FileCommandSniffer, TypeSniffer};
use crate::tokenizer::{TokenCounter, DEFAULT_MODEL};
use crate::types::FileRecord;
use crate::url_processor::UrlProcessor;
use crate::walker;

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub repo: Option<String>,
    pub doc: Option<String>,
    pub paths: Vec<PathBuf>,
    pub count_tokens: bool,
    pub ignore_extensions: Vec<String>,
    pub split: Option<usize>,
    pub output_dir: PathBuf,
    pub clone_dir: PathBuf,
    pub tokenizer_model: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            repo: None,
            doc: None,
            paths: vec![PathBuf::from(".")],
            count_tokens: false,
            ignore_extensions: Vec::new(),
            split: None,
            output_dir: PathBuf::from("."),
            clone_dir: PathBuf::from("."),
            tokenizer_model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub label: String,
    pub shards: Vec<PathBuf>,
    pub files: usize,
    pub total_tokens: Option<usize>,
    /// Per-path problems that did not stop the run.
    pub errors: Vec<Error>,
}

/// Runs the whole pipeline: obtain the root, walk it, count tokens, write
/// shards. Only repository/doc retrieval and output writing fail the run.
pub fn run(options: &RunOptions) -> Result<RunReport> {
    run_with_sniffer(options, &FileCommandSniffer::new())
}

pub fn run_with_sniffer(options: &RunOptions, sniffer: &dyn TypeSniffer) -> Result<RunReport> {
    // Subtrees of a clone share the clone's top-level ignore file.
    let (label, roots, ignore_root) = match &options.repo {
        Some(url) => {
            let repo_path = GitProcessor::new(&options.clone_dir).process_repo(url)?;
            let roots = repo_subpaths(&repo_path, &options.paths);
            (label_for(&repo_path), roots, Some(repo_path))
        }
        None => {
            let roots = if options.paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                options.paths.clone()
            };
            (label_for(&roots[0]), roots, None)
        }
    };

    let doc = match &options.doc {
        Some(url) => Some(Documentation {
            url: url.clone(),
            text: UrlProcessor::new().scrape(url)?,
        }),
        None => None,
    };

    let counter = if options.count_tokens {
        Some(TokenCounter::new(&options.tokenizer_model)?)
    } else {
        None
    };

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Scanning files...");

    let mut records: Vec<FileRecord> = Vec::new();
    let mut errors = Vec::new();

    for root in &roots {
        let patterns = if root.is_dir() {
            let ignore_dir = ignore_root.as_deref().unwrap_or(root.as_path());
            load_gitignore_patterns(ignore_dir).unwrap_or_else(|e| {
                warn!("Ignoring unreadable .gitignore: {e}");
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let rules = ExclusionRules::new(&patterns, &options.ignore_extensions);

        match walker::collect(root, &rules, sniffer, counter.as_ref()) {
            Ok(found) => {
                debug!("{} files selected under {}", found.len(), root.display());
                records.extend(found);
            }
            Err(e) => errors.push(e),
        }
    }

    pb.finish_and_clear();

    let assemble_options = AssembleOptions {
        label: label.clone(),
        doc,
        split: options.split,
    };
    let shards = assemble(&assemble_options, &records);
    let written = write_shards(&options.output_dir, &shards)?;

    let total_tokens = counter.as_ref().map(|_| {
        records
            .iter()
            .map(|r| r.token_count.unwrap_or_default())
            .sum::<usize>()
    });

    Ok(RunReport {
        label,
        shards: written,
        files: records.len(),
        total_tokens,
        errors,
    })
}

// Positional paths select subtrees of a cloned repository; the default `.`
// means the whole clone.
fn repo_subpaths(repo_path: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    let subpaths: Vec<PathBuf> = paths
        .iter()
        .filter(|p| p.as_path() != Path::new("."))
        .map(|p| repo_path.join(p))
        .collect();

    if subpaths.is_empty() {
        vec![repo_path.to_path_buf()]
    } else {
        subpaths
    }
}

/// Base name of the absolute form of `path`.
fn label_for(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    });

    absolute
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_subpaths_default_is_whole_clone() {
        let repo = Path::new("/clones/tool");
        assert_eq!(
            repo_subpaths(repo, &[PathBuf::from(".")]),
            vec![PathBuf::from("/clones/tool")]
        );
        assert_eq!(
            repo_subpaths(repo, &[PathBuf::from("src"), PathBuf::from("README.md")]),
            vec![
                PathBuf::from("/clones/tool/src"),
                PathBuf::from("/clones/tool/README.md")
            ]
        );
    }

    #[test]
    fn test_label_for_directory() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let project = dir.path().join("my-project");
        fs::create_dir(&project)?;
        assert_eq!(label_for(&project), "my-project");
        assert_eq!(label_for(&project.join("missing.txt")), "missing.txt");
        Ok(())
    }
}
