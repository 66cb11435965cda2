pub mod analyzer;
pub mod config;
pub mod error;
pub mod git_processor;
pub mod output;
pub mod patterns;
pub mod sniffer;
pub mod tokenizer;
pub mod types;
pub mod url_processor;
pub mod walker;

pub use analyzer::{run, run_with_sniffer, RunOptions, RunReport};
pub use config::{get_config_path, load_config, Config};
pub use error::{Error, Result};
pub use git_processor::GitProcessor;
pub use output::{assemble, render_record, write_shards, AssembleOptions, Documentation, Shard};
pub use patterns::{is_ignored, load_gitignore_patterns, ExclusionRules, IGNORED_EXTENSIONS};
pub use sniffer::{FileCommandSniffer, TypeSniffer};
pub use tokenizer::TokenCounter;
pub use types::FileRecord;
pub use url_processor::UrlProcessor;
