use std::path::{Path, PathBuf};

use git2::{build::RepoBuilder, FetchOptions};
use tracing::info;
use url::Url;

use crate::error::{Error, Result};

/// Materializes remote repositories as working trees under a clone root.
pub struct GitProcessor {
    clone_root: PathBuf,
}

impl GitProcessor {
    pub fn new(clone_root: impl Into<PathBuf>) -> Self {
        Self {
            clone_root: clone_root.into(),
        }
    }

    /// Returns the local working tree for `url`, cloning it (shallowly, for
    /// remote transports) unless a directory of the same name already
    /// exists, in which case that copy is reused untouched.
    pub fn process_repo(&self, url: &str) -> Result<PathBuf> {
        let repo_name = repo_name_from_url(url);
        let clone_path = self.clone_root.join(&repo_name);

        if clone_path.exists() {
            info!("Repo already exists, reusing {}", clone_path.display());
            return Ok(clone_path);
        }

        info!("Cloning {url} into {}", clone_path.display());

        let mut fetch_options = FetchOptions::new();
        if !is_local_source(url) {
            fetch_options.depth(1);
        }

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, &clone_path)
            .map_err(|source| Error::Clone {
                url: url.to_string(),
                source,
            })?;

        Ok(clone_path)
    }
}

/// The last path segment of a repository URL without a trailing `.git`.
/// Handles scp-style (`git@host:owner/name.git`) and plain paths too.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');

    let from_url = Url::parse(trimmed).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
    });

    let last = from_url.unwrap_or_else(|| {
        trimmed
            .rsplit(['/', ':', '\\'])
            .next()
            .unwrap_or_default()
            .to_string()
    });

    let name = last.strip_suffix(".git").unwrap_or(&last);
    if name.is_empty() {
        "repo".to_string()
    } else {
        name.to_string()
    }
}

// libgit2's local transport cannot do shallow fetches.
fn is_local_source(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).exists()
}
