//! Error types for scriptpack.

use std::path::PathBuf;

use crate::cancel::Cancelled;
use crate::config::ConfigError;
use crate::entry::EntryError;
use crate::parser::ParseError;
use crate::render::RenderError;
use crate::rewrite::RewriteError;
use crate::sink::SinkError;
use crate::walker::WalkError;

/// Top-level error type for a generation run.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("no source files found in {0}: make sure you select the project root")]
    NoFilesFound(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(WalkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(ParseError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Rewrite(RewriteError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("output error: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl From<WalkError> for PackError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::NotFound { path } => PackError::PathNotFound(path),
            other => PackError::Walk(other),
        }
    }
}

impl From<ParseError> for PackError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Cancelled(c) => PackError::Cancelled(c),
            other => PackError::Parse(other),
        }
    }
}

impl From<RewriteError> for PackError {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::Cancelled(c) => PackError::Cancelled(c),
            other => PackError::Rewrite(other),
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &PackError) -> i32 {
    match error {
        PackError::PathNotFound(_) | PackError::NoFilesFound(_) => 3,
        PackError::Entry(EntryError::NoEntryPoint { .. }) => 4,
        PackError::Parse(_) => 5,
        PackError::Rewrite(_) => 70,
        PackError::Cancelled(_) => 130,
        PackError::Io { .. }
        | PackError::Walk(_)
        | PackError::Config(_)
        | PackError::Render(_)
        | PackError::Sink(_) => 1,
    }
}
