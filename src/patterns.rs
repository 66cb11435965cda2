use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use glob::{MatchOptions, Pattern};
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Extensions (and a few whole file names) that are never worth feeding to
/// a text consumer.
pub const IGNORED_EXTENSIONS: &[&str] = &[
    ".lock",
    // Compiled executables and libraries
    ".exe", ".dll", ".so", ".a", ".lib", ".dylib", ".o", ".obj",
    // Compressed archives
    ".zip", ".tar", ".tar.gz", ".tgz", ".rar", ".7z", ".bz2", ".gz", ".xz", ".z", ".lz", ".lzma",
    ".lzo", ".rz", ".sz", ".dz",
    // Application documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp",
    // Media
    ".png", ".jpg", ".jpeg", ".gif", ".mp3", ".mp4", ".wav", ".flac", ".ogg", ".avi", ".mkv",
    ".mov", ".webm", ".wmv", ".m4a", ".aac",
    // Virtual machine and container images
    ".iso", ".vmdk", ".qcow2", ".vdi", ".vhd", ".vhdx", ".ova", ".ovf",
    // Databases
    ".db", ".sqlite", ".mdb", ".accdb", ".frm", ".ibd", ".dbf",
    // Java
    ".jar", ".class", ".war", ".ear", ".jpi",
    // Python bytecode and packages
    ".pyc", ".pyo", ".pyd", ".egg", ".whl",
    // Packages, dumps and images
    ".deb", ".rpm", ".apk", ".msi", ".dmg", ".pkg", ".bin", ".dat", ".data", ".dump", ".img",
    ".toast", ".vcd", ".crx", ".xpi", ".lockb", "package-lock.json", ".svg",
    // Fonts and icons
    ".eot", ".otf", ".ttf", ".woff", ".woff2", ".ico", ".icns", ".cur",
    ".cab", ".dmp", ".msp", ".msm",
    // Keys and certificates
    ".keystore", ".jks", ".truststore", ".cer", ".crt", ".der", ".p7b", ".p7c", ".p12", ".pfx",
    ".pem", ".csr", ".key", ".pub", ".sig", ".pgp", ".gpg",
    ".nupkg", ".snupkg", ".appx", ".msix", ".msu",
    ".snap", ".flatpak", ".appimage",
    ".ko", ".sys", ".elf",
    ".swf", ".fla", ".swc",
    ".rlib", ".pdb", ".idb", ".dbg",
    // Build and editor leftovers
    ".sdf", ".bak", ".tmp", ".temp", ".log", ".tlog", ".ilk",
    ".bpl", ".dcu", ".dcp", ".dcpil", ".drc",
    ".aps", ".res", ".rsrc", ".rc", ".resx",
    // Local settings
    ".prefs", ".properties", ".ini", ".cfg", ".config", ".conf",
    ".DS_Store", ".localized", ".svn", ".git", ".gitignore", ".gitkeep",
];

static BUILTIN_DENYLIST: Lazy<HashSet<&'static str>> =
    Lazy::new(|| IGNORED_EXTENSIONS.iter().copied().collect());

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

enum Matcher {
    Glob(Pattern),
    Literal(String),
}

impl Matcher {
    fn new(pattern: &str) -> Self {
        let collapsed = collapse_stars(pattern);
        match Pattern::new(&collapsed)
            .or_else(|_| Pattern::new(&escape_unclosed_brackets(&collapsed)))
        {
            Ok(glob) => Matcher::Glob(glob),
            Err(_) => Matcher::Literal(pattern.to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Glob(glob) => glob.matches_with(path, MATCH_OPTIONS),
            Matcher::Literal(literal) => literal == path,
        }
    }
}

/// A single ignore-file line compiled for matching at any depth.
struct IgnorePattern {
    raw: String,
    whole: Matcher,
    nested: Matcher,
}

impl IgnorePattern {
    fn new(raw: &str) -> Self {
        let raw = raw.replace('\\', "/");
        Self {
            whole: Matcher::new(&raw),
            nested: Matcher::new(&format!("*/{raw}")),
            raw,
        }
    }

    fn matches(&self, path: &str) -> bool {
        self.whole.matches(path)
            || self.nested.matches(path)
            || (self.raw.ends_with('/') && path.starts_with(&self.raw))
    }
}

/// The combined exclusion rule set for one traversal root: ignore-file
/// patterns plus the extension denylist (built-ins unioned with user
/// additions).
pub struct ExclusionRules {
    patterns: Vec<IgnorePattern>,
    extra_extensions: HashSet<String>,
}

impl ExclusionRules {
    pub fn new<S: AsRef<str>>(patterns: &[S], extra_extensions: &[String]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| IgnorePattern::new(p.as_ref()))
                .collect(),
            extra_extensions: extra_extensions.iter().cloned().collect(),
        }
    }

    /// Whether a file at `relative` (relative to the traversal root) is
    /// excluded, either by pattern or by its extension.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.matches_pattern(relative, false) || self.has_denied_extension(relative)
    }

    /// Pattern-only check. Directories are also tested with a trailing `/`
    /// so that `build/` prunes the `build` directory itself.
    pub fn matches_pattern(&self, relative: &Path, is_dir: bool) -> bool {
        let normalized = normalize_path(relative);
        if self.patterns.iter().any(|p| p.matches(&normalized)) {
            return true;
        }
        if is_dir {
            let with_slash = format!("{normalized}/");
            return self.patterns.iter().any(|p| p.matches(&with_slash));
        }
        false
    }

    pub fn has_denied_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if self.denies(name) {
            return true;
        }

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if self.denies(&format!(".{ext}")) {
                return true;
            }
        }

        // Multi-part suffixes like `.tar.gz`
        let stem_start = name.len() - name.trim_start_matches('.').len();
        match name[stem_start..].find('.') {
            Some(idx) => self.denies(&name[stem_start + idx..]),
            None => false,
        }
    }

    fn denies(&self, candidate: &str) -> bool {
        BUILTIN_DENYLIST.contains(candidate) || self.extra_extensions.contains(candidate)
    }
}

/// Shallow gitignore-style check of `path` against raw patterns.
pub fn is_ignored<S: AsRef<str>>(path: &Path, patterns: &[S]) -> bool {
    ExclusionRules::new(patterns, &[]).matches_pattern(path, false)
}

/// Reads `<root>/.gitignore`, dropping blank lines and comments. A missing
/// file yields no patterns.
pub fn load_gitignore_patterns(root: &Path) -> Result<Vec<String>> {
    let gitignore = root.join(".gitignore");
    if !gitignore.is_file() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&gitignore).map_err(|source| Error::Io {
        path: gitignore.clone(),
        source,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.replace(std::path::MAIN_SEPARATOR, "/"))
        .collect())
}

/// Joins path components with `/` regardless of platform.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

// fnmatch reads a `[` that never closes as a literal bracket; `glob`
// rejects it, so rewrite it as the single-character class `[[]`.
fn escape_unclosed_brackets(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '[' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        if chars.get(j) == Some(&'!') {
            j += 1;
        }
        if chars.get(j) == Some(&']') {
            j += 1;
        }
        match chars[j..].iter().position(|&c| c == ']') {
            Some(offset) => {
                let end = j + offset;
                out.extend(&chars[i..=end]);
                i = end + 1;
            }
            None => {
                out.push_str("[[]");
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn rules(patterns: &[&str]) -> ExclusionRules {
        ExclusionRules::new(patterns, &[])
    }

    #[test]
    fn test_builtin_extensions_are_excluded() {
        let rules = rules(&[]);
        assert!(rules.is_excluded(Path::new("Cargo.lock")));
        assert!(rules.is_excluded(Path::new("assets/logo.png")));
        assert!(rules.is_excluded(Path::new("dist/bundle.tar.gz")));
        assert!(rules.is_excluded(Path::new("web/package-lock.json")));
        assert!(rules.is_excluded(Path::new(".DS_Store")));
        assert!(!rules.is_excluded(Path::new("src/main.rs")));
        assert!(!rules.is_excluded(Path::new("README")));
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let rules = rules(&[]);
        assert!(rules.is_excluded(Path::new("photo.png")));
        assert!(!rules.is_excluded(Path::new("photo.PNG")));
    }

    #[test]
    fn test_user_extensions_union_with_builtins() {
        let rules = ExclusionRules::new::<&str>(&[], &[".md".to_string()]);
        assert!(rules.is_excluded(Path::new("docs/guide.md")));
        assert!(rules.is_excluded(Path::new("yarn.lock")));
        assert!(!rules.is_excluded(Path::new("main.py")));
    }

    #[test]
    fn test_extension_exclusion_ignores_patterns() {
        // A pattern list that matches nothing must not rescue a denied file.
        let rules = ExclusionRules::new(&["nothing-here"], &[".txt".to_string()]);
        assert!(rules.is_excluded(Path::new("notes.txt")));
    }

    #[test]
    fn test_pattern_matches_at_any_depth() {
        let rules = rules(&["*.tmp.rs", "secret.env"]);
        assert!(rules.is_excluded(Path::new("a.tmp.rs")));
        assert!(rules.is_excluded(Path::new("deep/nested/b.tmp.rs")));
        assert!(rules.is_excluded(Path::new("config/secret.env")));
        assert!(!rules.is_excluded(Path::new("config/public.env")));
    }

    #[test]
    fn test_star_crosses_separators() {
        let rules = rules(&["src*"]);
        assert!(rules.is_excluded(Path::new("src/lib.rs")));
    }

    #[test]
    fn test_directory_prefix_pattern() {
        let rules = rules(&["build/"]);
        assert!(rules.is_excluded(Path::new("build/output.txt")));
        assert!(rules.matches_pattern(Path::new("build"), true));
        assert!(!rules.matches_pattern(Path::new("build"), false));
        assert!(!rules.is_excluded(Path::new("rebuild.sh")));
    }

    #[test]
    fn test_named_directory_pattern_matches_nested_dirs() {
        let rules = rules(&["node_modules"]);
        assert!(rules.matches_pattern(Path::new("node_modules"), true));
        assert!(rules.matches_pattern(Path::new("web/node_modules"), true));
    }

    #[test]
    fn test_double_star_behaves_like_single_star() {
        let rules = rules(&["**/generated.rs"]);
        assert!(rules.is_excluded(Path::new("a/b/generated.rs")));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let rules = rules(&["[oops"]);
        assert!(rules.is_excluded(Path::new("[oops")));
        assert!(rules.is_excluded(Path::new("a/[oops")));
        assert!(rules.is_excluded(Path::new("a/b/[oops")));
        assert!(!rules.is_excluded(Path::new("oops")));
    }

    #[test]
    fn test_unclosed_bracket_keeps_other_wildcards() {
        let rules = rules(&["*[draft"]);
        assert!(rules.is_excluded(Path::new("notes[draft")));
        assert!(rules.is_excluded(Path::new("docs/notes[draft")));
        assert!(!rules.is_excluded(Path::new("notes-draft")));
    }

    #[test]
    fn test_escape_unclosed_brackets() {
        assert_eq!(escape_unclosed_brackets("[oops"), "[[]oops");
        assert_eq!(escape_unclosed_brackets("[ab]x["), "[ab]x[[]");
        assert_eq!(escape_unclosed_brackets("[]]"), "[]]");
        assert_eq!(escape_unclosed_brackets("[!]"), "[[]!]");
    }

    #[test]
    fn test_matching_is_pure() {
        let rules = rules(&["*.gen"]);
        let path = PathBuf::from("x/y.gen");
        let first = rules.is_excluded(&path);
        let second = rules.is_excluded(&path);
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn test_is_ignored_helper() {
        assert!(is_ignored(Path::new("logs/today.out"), &["logs/"]));
        assert!(!is_ignored(Path::new("src/logs.rs"), &["logs/"]));
    }

    #[test]
    fn test_load_gitignore_patterns_strips_comments() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(".gitignore"),
            "# comment\n\ntarget/\n  *.swp  \n",
        )?;

        let patterns = load_gitignore_patterns(dir.path())?;
        assert_eq!(patterns, vec!["target/".to_string(), "*.swp".to_string()]);
        Ok(())
    }

    #[test]
    fn test_load_gitignore_patterns_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(load_gitignore_patterns(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("./a/b/c.rs")), "a/b/c.rs");
        assert_eq!(normalize_path(Path::new("a.rs")), "a.rs");
    }
}
