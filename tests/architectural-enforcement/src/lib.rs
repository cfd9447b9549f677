//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The sequencer owns every timer; nothing else sleeps
//! - No blocking sleeps anywhere
//! - No panicking shortcuts in library code
//!
//! The helpers here scan the production part of each source file, i.e.
//! everything above its `#[cfg(test)]` module.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../..")))
}

/// A line of production code
#[derive(Clone, Debug)]
pub struct CodeLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// The line with any trailing `//` comment removed
    pub code: String,
}

impl std::fmt::Display for CodeLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.number, self.code.trim())
    }
}

/// Every `.rs` file below `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    if !root.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Production lines of `path`: comments dropped, test module cut off
#[must_use]
pub fn production_lines(path: &Path) -> Vec<CodeLine> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .filter_map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            if code.trim().is_empty() {
                return None;
            }
            Some(CodeLine {
                path: path.to_path_buf(),
                number: idx + 1,
                code: code.to_string(),
            })
        })
        .collect()
}

/// Production lines under `dir` matching `predicate`
pub fn find_violations(dir: &str, predicate: impl Fn(&CodeLine) -> bool) -> Vec<CodeLine> {
    rust_files(dir)
        .iter()
        .flat_map(|path| production_lines(path))
        .filter(|line| predicate(line))
        .collect()
}

/// Panic with a readable report if `violations` is not empty
pub fn report(rule: &str, violations: &[CodeLine]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s). Fix these before merging!", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn test_production_lines_stop_at_tests() {
        let dir = std::env::temp_dir().join(format!("arch-scan-{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let file = dir.join("sample.rs");
        fs::write(
            &file,
            "fn a() {} // trailing\n// only a comment\n\n#[cfg(test)]\nmod tests {}\n",
        )
        .unwrap();

        let lines = production_lines(&file);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].code.trim(), "fn a() {}");
    }
}
