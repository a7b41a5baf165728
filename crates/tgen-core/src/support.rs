//! Copies the configured support files into the generated tree.

use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use thiserror::Error;

use crate::config::Config;

/// Errors raised while copying support files.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Invalid file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CopyError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CopyError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Copies every `files` entry of the configuration and returns the paths
/// that were written.
pub fn copy_support_files(config: &Config) -> Result<Vec<PathBuf>, CopyError> {
    let mut copied = Vec::new();

    for entry in &config.files {
        let target = match &entry.target_path {
            Some(path) => config.resolve(path),
            None => config.target_root(),
        };

        let matches = expand_outside(&config.base_dir, &entry.source_pattern, &config.target_root())?;
        if matches.is_empty() {
            log::warn!("No files match `{}`", entry.source_pattern);
        }

        for source in matches {
            copied.push(copy_into(&source, &target)?);
        }
    }

    Ok(copied)
}

/// Files and folders below `base` matched by a glob.
///
/// The pattern is matched against the path relative to `base`, so `*.java`
/// only names files directly in `base` while `**/*.java` reaches into
/// subfolders. A matched folder stands for its whole content, so nothing
/// inside it is reported separately.
pub fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, CopyError> {
    walk(base, pattern, None)
}

/// Like [`expand`], but never looks inside `excluded`.
pub fn expand_outside(base: &Path, pattern: &str, excluded: &Path) -> Result<Vec<PathBuf>, CopyError> {
    walk(base, pattern, Some(excluded.to_path_buf()))
}

fn walk(base: &Path, pattern: &str, excluded: Option<PathBuf>) -> Result<Vec<PathBuf>, CopyError> {
    let glob = build_override(base, pattern)?;

    let mut builder = WalkBuilder::new(base);
    builder
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    if let Some(excluded) = excluded {
        builder.filter_entry(move |entry| entry.path() != excluded.as_path());
    }

    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in builder.build() {
        let entry = entry.map_err(|source| CopyError::Walk {
            path: base.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path == base {
            continue;
        }
        if matches.iter().any(|done| path.starts_with(done)) {
            continue;
        }

        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if glob.matched(path, is_dir).is_whitelist() {
            matches.push(path.to_path_buf());
        }
    }

    Ok(matches)
}

/// Roots a pattern at the base folder. Gitignore globs without a slash
/// would otherwise match at any depth.
fn anchored(pattern: &str) -> String {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    if pattern.starts_with('/') || pattern.starts_with("**") {
        pattern.to_string()
    } else {
        format!("/{}", pattern)
    }
}

fn build_override(base: &Path, pattern: &str) -> Result<Override, CopyError> {
    let to_error = |source| CopyError::Pattern {
        pattern: pattern.to_string(),
        source,
    };

    let mut builder = OverrideBuilder::new(base);
    builder.add(&anchored(pattern)).map_err(to_error)?;
    builder.build().map_err(to_error)
}

/// Copies a file or folder into `target_dir`, keeping its name.
fn copy_into(source: &Path, target_dir: &Path) -> Result<PathBuf, CopyError> {
    std::fs::create_dir_all(target_dir).map_err(|e| CopyError::io(target_dir, e))?;

    let name = source
        .file_name()
        .ok_or_else(|| CopyError::io(source, std::io::ErrorKind::InvalidInput.into()))?;
    let destination = target_dir.join(name);

    if source.is_dir() {
        copy_dir(source, &destination)?;
    } else {
        std::fs::copy(source, &destination).map_err(|e| CopyError::io(source, e))?;
    }

    log::debug!("Copied {} to {}", source.display(), destination.display());
    Ok(destination)
}

fn copy_dir(source: &Path, destination: &Path) -> Result<(), CopyError> {
    std::fs::create_dir_all(destination).map_err(|e| CopyError::io(destination, e))?;

    for entry in std::fs::read_dir(source).map_err(|e| CopyError::io(source, e))? {
        let entry = entry.map_err(|e| CopyError::io(source, e))?;
        let path = entry.path();
        let target = destination.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            std::fs::copy(&path, &target).map_err(|e| CopyError::io(&path, e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("runtime/src")).unwrap();
        fs::write(dir.path().join("runtime/src/Lib.java"), "lib").unwrap();
        fs::write(dir.path().join("runtime/pom.xml"), "pom").unwrap();
        fs::write(dir.path().join("helper.java"), "helper").unwrap();
        fs::write(dir.path().join("notes.md"), "notes").unwrap();
        dir
    }

    #[test]
    fn test_expand_matches_from_the_base() {
        let dir = tree();
        let matches = expand(dir.path(), "*.java").unwrap();
        assert_eq!(matches, vec![dir.path().join("helper.java")]);

        let matches = expand(dir.path(), "./runtime/*/*.java").unwrap();
        assert_eq!(matches, vec![dir.path().join("runtime/src/Lib.java")]);
    }

    #[test]
    fn test_expand_any_depth_needs_double_star() {
        let dir = tree();
        let matches = expand(dir.path(), "**/*.java").unwrap();
        assert_eq!(
            matches,
            vec![dir.path().join("helper.java"), dir.path().join("runtime/src/Lib.java")]
        );
    }

    #[test]
    fn test_generated_tree_is_never_copied() {
        let dir = tree();
        let generated = dir.path().join("tests/Lexer/simple");
        fs::create_dir_all(&generated).unwrap();
        fs::write(generated.join("L.java"), "generated").unwrap();

        let matches = expand_outside(dir.path(), "**/*.java", &dir.path().join("tests")).unwrap();
        assert_eq!(
            matches,
            vec![dir.path().join("helper.java"), dir.path().join("runtime/src/Lib.java")]
        );
    }

    #[test]
    fn test_copy_support_files_keeps_top_level_pattern() {
        let dir = tree();
        let generated = dir.path().join("tests/Lexer/simple");
        fs::create_dir_all(&generated).unwrap();
        fs::write(generated.join("L.java"), "generated").unwrap();

        let mut config = Config::from_json_str(
            r#"{
                "language": "Java",
                "targetExtension": "java",
                "specTemplateFile": "Test.java.stg",
                "grammarTemplateFile": "Java.test.stg",
                "files": [{ "sourcePattern": "*.java" }]
            }"#,
        )
        .unwrap();
        config.base_dir = dir.path().to_path_buf();

        let written = copy_support_files(&config).unwrap();
        assert_eq!(written, vec![dir.path().join("tests/helper.java")]);
        assert!(!dir.path().join("tests/L.java").exists());
    }

    #[test]
    fn test_expand_folder_once() {
        let dir = tree();
        let matches = expand(dir.path(), "/runtime").unwrap();
        assert_eq!(matches, vec![dir.path().join("runtime")]);
    }

    #[test]
    fn test_copy_folder_recursively() {
        let dir = tree();
        let target = dir.path().join("out");
        let written = copy_into(&dir.path().join("runtime"), &target).unwrap();
        assert_eq!(written, target.join("runtime"));
        assert_eq!(fs::read_to_string(target.join("runtime/src/Lib.java")).unwrap(), "lib");
        assert_eq!(fs::read_to_string(target.join("runtime/pom.xml")).unwrap(), "pom");
    }
}
