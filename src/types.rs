/// One selected file: its `/`-separated path relative to the traversal
/// root, its decoded contents, and an optional token count for the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub relative_path: String,
    pub content: String,
    pub token_count: Option<usize>,
}

impl FileRecord {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
            token_count: None,
        }
    }

    pub fn with_token_count(mut self, count: usize) -> Self {
        self.token_count = Some(count);
        self
    }
}
