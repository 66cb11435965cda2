use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("unable to read file {0} in utf-8 encoding")]
    Decode(PathBuf),

    #[error("IO error accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clone '{url}': {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to fetch '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
