//! Source discovery.
//!
//! Uses the `ignore` crate to collect the `.cs` files of a project while
//! respecting .gitignore, .git/info/exclude, global gitignore, and
//! .scriptpackignore. Build output and project metadata directories are
//! skipped.

use std::path::{Path, PathBuf};

use glob::Pattern;
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, warn};

/// Top-level directories that never hold script sources.
pub const DEFAULT_EXCLUDED_DIRECTORIES: [&str; 3] = ["Properties", "obj", "bin"];

/// Per-project ignore file, in gitignore syntax.
pub const IGNORE_FILE: &str = ".scriptpackignore";

/// Errors that can occur during discovery.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a project directory or .csproj file: {path}")]
    NotAProject { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for discovery.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Names of top-level directories to skip.
    pub exclude_directories: Vec<String>,
    /// Glob patterns matched against the path relative to the project root
    /// and against the file name.
    pub exclude_files: Vec<String>,
    /// Include hidden files and directories.
    pub include_hidden: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            exclude_directories: DEFAULT_EXCLUDED_DIRECTORIES
                .iter()
                .map(|d| d.to_string())
                .collect(),
            exclude_files: Vec::new(),
            include_hidden: false,
            respect_gitignore: true,
        }
    }
}

impl WalkOptions {
    /// Skip another top-level directory.
    pub fn exclude_directory(mut self, name: impl Into<String>) -> Self {
        self.exclude_directories.push(name.into());
        self
    }

    /// Skip files matching a glob pattern.
    pub fn exclude_file(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_files.push(pattern.into());
        self
    }
}

/// The directory holding the sources of `path`.
///
/// A `.csproj` file stands for the directory it lives in.
pub fn project_root(path: &Path) -> Result<PathBuf, WalkError> {
    if !path.exists() {
        return Err(WalkError::NotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let is_project = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csproj"));
    if !is_project {
        return Err(WalkError::NotAProject {
            path: path.to_path_buf(),
        });
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(PathBuf::from(".")),
    }
}

fn is_source(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("cs"))
}

/// Collect the C# sources below `root`, sorted by path.
///
/// The order is the merge order of the declarations, so it must not depend
/// on the file system.
pub fn source_files(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let patterns = options
        .exclude_files
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| WalkError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(false);

    let ignore_file = root.join(IGNORE_FILE);
    if ignore_file.exists() {
        if let Some(err) = builder.add_ignore(&ignore_file) {
            warn!(path = %ignore_file.display(), error = %err, "ignore file not fully applied");
        }
    }

    let excluded = options.exclude_directories.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if entry.depth() != 1 || !is_dir {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !excluded.iter().any(|d| *d == name)
    });

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(ignore::Error::Io(err)) => {
                let path = root.to_path_buf();
                return Err(if err.kind() == std::io::ErrorKind::PermissionDenied {
                    WalkError::PermissionDenied { path }
                } else {
                    WalkError::Io { path, source: err }
                });
            }
            Err(err) => {
                // Unreadable ignore rules and the like do not stop discovery.
                warn!(error = %err, "skipping walk entry");
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_source(path) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let file_name = path.file_name().map(Path::new).unwrap_or(relative);
        if patterns
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(file_name))
        {
            debug!(path = %relative.display(), "excluded by pattern");
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    debug!(root = %root.display(), files = files.len(), "sources discovered");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("Scripts")).unwrap();
        fs::create_dir_all(dir.path().join("obj/Debug")).unwrap();
        fs::create_dir_all(dir.path().join("Properties")).unwrap();
        fs::write(dir.path().join("Program.cs"), "class Program {}").unwrap();
        fs::write(dir.path().join("Scripts/Helper.cs"), "class Helper {}").unwrap();
        fs::write(dir.path().join("Scripts/notes.txt"), "notes").unwrap();
        fs::write(dir.path().join("obj/Debug/Generated.cs"), "class G {}").unwrap();
        fs::write(dir.path().join("Properties/AssemblyInfo.cs"), "").unwrap();
        fs::write(dir.path().join("Script.csproj"), "<Project />").unwrap();

        dir
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_collects_sources_sorted() {
        let dir = create_test_project();
        let files = source_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["Program.cs", "Scripts/Helper.cs"]);
    }

    #[test]
    fn test_excluded_directory() {
        let dir = create_test_project();
        let options = WalkOptions::default().exclude_directory("Scripts");
        let files = source_files(dir.path(), &options).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["Program.cs"]);
    }

    #[test]
    fn test_excluded_file_pattern() {
        let dir = create_test_project();
        let options = WalkOptions::default().exclude_file("Help*.cs");
        let files = source_files(dir.path(), &options).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["Program.cs"]);

        let options = WalkOptions::default().exclude_file("Scripts/*");
        let files = source_files(dir.path(), &options).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["Program.cs"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = create_test_project();
        let options = WalkOptions::default().exclude_file("[");
        assert!(matches!(
            source_files(dir.path(), &options),
            Err(WalkError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_respects_ignore_file() {
        let dir = create_test_project();
        fs::write(dir.path().join(IGNORE_FILE), "Scripts/").unwrap();
        let files = source_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["Program.cs"]);
    }

    #[test]
    fn test_nested_excluded_names_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Scripts/bin")).unwrap();
        fs::write(dir.path().join("Scripts/bin/Tool.cs"), "").unwrap();
        let files = source_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["Scripts/bin/Tool.cs"]);
    }

    #[test]
    fn test_project_root() {
        let dir = create_test_project();
        assert_eq!(project_root(dir.path()).unwrap(), dir.path());
        assert_eq!(
            project_root(&dir.path().join("Script.csproj")).unwrap(),
            dir.path()
        );
        assert!(matches!(
            project_root(&dir.path().join("Program.cs")),
            Err(WalkError::NotAProject { .. })
        ));
        assert!(matches!(
            project_root(Path::new("/nonexistent/project")),
            Err(WalkError::NotFound { .. })
        ));
    }
}
