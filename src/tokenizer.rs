use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "gpt-4";

pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    pub fn new(model_name: &str) -> Result<Self> {
        let bpe = get_bpe_from_model(model_name).map_err(|e| {
            Error::Tokenizer(format!(
                "failed to initialize tiktoken tokenizer for '{model_name}': {e}"
            ))
        })?;

        Ok(Self { bpe })
    }

    /// The cl100k_base encoding.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::Tokenizer(format!("failed to load cl100k_base: {e}")))?;

        Ok(Self { bpe })
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        // tiktoken's encode_with_special_tokens is infallible
        self.bpe.encode_with_special_tokens(text).len()
    }
}
