use std::path::PathBuf;

use clap::{ArgAction, Parser};

use repo2text::{Config, RunOptions};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "repo2text",
    about = "Convert GitHub repositories and documentation to text files",
    version
)]
pub struct Cli {
    /// Git repository URL to clone (or reuse) before converting
    #[arg(short, long, value_name = "URL")]
    pub repo: Option<String>,

    /// Documentation URL whose text is prepended to the output
    #[arg(short, long, value_name = "URL")]
    pub doc: Option<String>,

    /// Include token counts in file headers
    #[arg(short, long)]
    pub token: bool,

    /// File extensions to ignore, e.g. .log .tmp
    #[arg(short, long, num_args = 1.., value_name = "EXT")]
    pub ignore_extensions: Vec<String>,

    /// Start a new output file once this many characters are written
    #[arg(short, long, value_name = "CHARS")]
    pub split: Option<usize>,

    /// Directory the text files are written to
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Directory repositories are cloned into
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub clone_dir: PathBuf,

    /// tiktoken model used for --token
    #[arg(long)]
    pub model: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the config file location and exit
    #[arg(long)]
    pub config_path: bool,

    /// Files or directories to include ('.' for the current directory)
    #[arg(value_name = "FILES", default_value = ".")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Merges the flags over the user config; flags win.
    pub fn into_run_options(self, config: &Config) -> RunOptions {
        let mut ignore_extensions = config.ignore_extensions.clone();
        ignore_extensions.extend(self.ignore_extensions);

        RunOptions {
            repo: self.repo,
            doc: self.doc,
            paths: self.files,
            count_tokens: self.token,
            ignore_extensions,
            split: self.split.or(config.split),
            output_dir: self.output_dir,
            clone_dir: self.clone_dir,
            tokenizer_model: self
                .model
                .unwrap_or_else(|| config.tokenizer_model.clone()),
        }
    }
}
