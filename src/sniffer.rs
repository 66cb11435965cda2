use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::trace;

/// Descriptions (as printed by `file -b`) that mark a path as not worth
/// reading as text.
pub const SKIPPED_FILE_TYPES: &[&str] = &["ELF 64-bit LSB pie executable", "symbolic link to"];

pub fn is_skipped_type(description: &str) -> bool {
    SKIPPED_FILE_TYPES
        .iter()
        .any(|prefix| description.starts_with(prefix))
}

/// Describes what kind of file lives at a path. `None` means the type
/// could not be determined, which never excludes a file.
pub trait TypeSniffer {
    fn classify(&self, path: &Path) -> Option<String>;

    fn is_skipped(&self, path: &Path) -> bool {
        self.classify(path)
            .map(|description| is_skipped_type(&description))
            .unwrap_or(false)
    }
}

/// Classifies files with the system `file` utility. Symbolic links are
/// recognised from metadata without spawning a process.
pub struct FileCommandSniffer {
    program: Option<PathBuf>,
}

impl FileCommandSniffer {
    pub fn new() -> Self {
        Self {
            program: which::which("file").ok(),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.program.is_some()
    }
}

impl Default for FileCommandSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSniffer for FileCommandSniffer {
    fn classify(&self, path: &Path) -> Option<String> {
        if let Ok(metadata) = fs::symlink_metadata(path) {
            if metadata.file_type().is_symlink() {
                let target = fs::read_link(path)
                    .map(|t| t.display().to_string())
                    .unwrap_or_default();
                return Some(format!("symbolic link to {target}"));
            }
        }

        let program = self.program.as_ref()?;
        let output = Command::new(program).arg("-b").arg(path).output().ok()?;
        if !output.status.success() {
            trace!("`file` failed for {}", path.display());
            return None;
        }

        let description = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if description.is_empty() {
            None
        } else {
            Some(description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_list_prefixes() {
        assert!(is_skipped_type(
            "ELF 64-bit LSB pie executable, x86-64, dynamically linked"
        ));
        assert!(is_skipped_type("symbolic link to ../target"));
        assert!(!is_skipped_type("ASCII text"));
        assert!(!is_skipped_type("Python script, ASCII text executable"));
    }

    #[test]
    fn test_missing_program_is_unknown_type() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello")?;

        let sniffer = FileCommandSniffer::with_program(dir.path().join("no-such-file-utility"));
        assert_eq!(sniffer.classify(&file), None);
        assert!(!sniffer.is_skipped(&file));
        Ok(())
    }

    #[test]
    fn test_text_file_is_not_skipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("a.txt");
        fs::write(&file, "just some text\n")?;

        assert!(!FileCommandSniffer::new().is_skipped(&file));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_skipped_without_file_utility() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        fs::write(&target, "hello")?;
        std::os::unix::fs::symlink(&target, &link)?;

        let sniffer = FileCommandSniffer::with_program(dir.path().join("missing"));
        let description = sniffer.classify(&link).unwrap_or_default();
        assert!(description.starts_with("symbolic link to"));
        assert!(sniffer.is_skipped(&link));
        Ok(())
    }

    #[cfg(all(target_os = "linux", target_pointer_width = "64", target_endian = "little"))]
    #[test]
    fn test_running_executable_is_classified_as_elf() -> anyhow::Result<()> {
        let sniffer = FileCommandSniffer::new();
        if !sniffer.is_available() {
            return Ok(());
        }

        let exe = std::env::current_exe()?;
        let description = sniffer.classify(&exe).unwrap_or_default();
        assert!(description.starts_with("ELF 64-bit LSB"), "{description}");
        // Older `file` releases describe PIE binaries as shared objects.
        if description.contains("pie executable") {
            assert!(sniffer.is_skipped(&exe));
        }
        Ok(())
    }
}
