//! Where a generated script goes.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination of the script text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// The system clipboard, ready to paste into a programmable block.
    Clipboard,
    /// A file. Missing parent directories are created.
    File(PathBuf),
    Stdout,
}

impl Sink {
    /// The sink for an optional output path: a file when given, the clipboard
    /// otherwise.
    pub fn for_output(output: Option<PathBuf>) -> Self {
        match output {
            Some(path) if !path.as_os_str().is_empty() => Sink::File(path),
            _ => Sink::Clipboard,
        }
    }
}

/// Hand `text` to `sink`.
pub fn dispatch(text: &str, sink: &Sink) -> Result<(), SinkError> {
    match sink {
        Sink::Clipboard => {
            let mut clipboard = arboard::Clipboard::new()?;
            clipboard.set_text(text)?;
            info!(chars = text.chars().count(), "copied to clipboard");
        }
        Sink::File(path) => {
            let io = |source| SinkError::Io {
                path: path.clone(),
                source,
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io)?;
            }
            fs::write(path, text).map_err(io)?;
            info!(path = %path.display(), "script written");
        }
        Sink::Stdout => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{text}")
                .and_then(|()| out.flush())
                .map_err(|source| SinkError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
        }
    }
    Ok(())
}
