use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::FileRecord;

/// Scraped documentation prepended to the first shard.
#[derive(Debug, Clone)]
pub struct Documentation {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Repository or root name used in the banner and the file names.
    pub label: String,
    pub doc: Option<Documentation>,
    /// Maximum characters of file blocks per shard; `None` means one shard.
    pub split: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub filename: String,
    pub content: String,
    /// Characters in `content`, banner and documentation included.
    pub char_count: usize,
}

pub fn render_record(record: &FileRecord) -> String {
    match record.token_count {
        Some(tokens) => format!(
            "\n'''###--- {} {} tokens ---###\n{}\n'''\n",
            record.relative_path, tokens, record.content
        ),
        None => format!(
            "\n'''###--- {} ---###\n{}\n'''\n",
            record.relative_path, record.content
        ),
    }
}

pub fn banner(label: &str) -> String {
    format!("*GitHub Repository {label}*\n")
}

pub fn shard_filename(label: &str, index: usize) -> String {
    if index <= 1 {
        format!("{label}.txt")
    } else {
        format!("{label}_part{index}.txt")
    }
}

/// Concatenates the records into one or more shards. A record is never
/// split; the one that would overflow the threshold opens the next shard.
///
/// The threshold is measured against the whole shard, banner (and, for the
/// first shard, documentation) included. A record that does not fit next to
/// the first shard's header closes that shard with no file blocks; later
/// shards always take the record that opened them.
pub fn assemble(options: &AssembleOptions, records: &[FileRecord]) -> Vec<Shard> {
    let banner = banner(&options.label);
    let banner_len = banner.chars().count();
    let mut shards = Vec::new();

    let mut buffer = String::new();
    if let Some(doc) = &options.doc {
        buffer.push_str(&format!("Documentation: {}\n\n{}\n\n", doc.url, doc.text));
    }
    buffer.push_str(&banner);

    let mut char_count = buffer.chars().count();
    let mut records_in_shard = 0;

    for record in records {
        let block = render_record(record);
        let block_len = block.chars().count();

        if let Some(limit) = options.split {
            let can_close = records_in_shard > 0 || shards.is_empty();
            if can_close && char_count + block_len > limit {
                shards.push(Shard {
                    filename: shard_filename(&options.label, shards.len() + 1),
                    content: std::mem::replace(&mut buffer, banner.clone()),
                    char_count,
                });
                char_count = banner_len;
                records_in_shard = 0;
            }
        }

        buffer.push_str(&block);
        char_count += block_len;
        records_in_shard += 1;
    }

    shards.push(Shard {
        filename: shard_filename(&options.label, shards.len() + 1),
        content: buffer,
        char_count,
    });

    shards
}

/// Writes every shard into `dir` (created if needed), returning the
/// written paths in order.
pub fn write_shards(dir: &Path, shards: &[Shard]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(shards.len());
    for shard in shards {
        let path = dir.join(&shard.filename);
        fs::write(&path, &shard.content).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {} ({} chars)", path.display(), shard.char_count);
        written.push(path);
    }
    Ok(written)
}
