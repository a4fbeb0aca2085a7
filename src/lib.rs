//! Scriptpack - Build a single Space Engineers script from a C# project.
//!
//! Scriptpack parses every source file of a project, merges all of their
//! declarations into the `Program : MyGridProgram` class, optionally strips and
//! compresses the result, and produces the text that goes into a programmable
//! block.
//!
//! # Quick Start
//!
//! ```no_run
//! use scriptpack::builder::Generator;
//! use scriptpack::sink::{dispatch, Sink};
//!
//! let generated = Generator::new("./MyScript")
//!     .remove_comments(true)
//!     .generate()
//!     .unwrap();
//!
//! println!("{}", generated.report);
//! dispatch(&generated.output, &Sink::Clipboard).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`syntax`] - Syntax tree with trivia, structural sharing and edits
//! - [`parser`] - C# parsing through tree-sitter
//! - [`extract`] - File-scope declarations
//! - [`entry`] - Entry declaration lookup
//! - [`merge`] - Merging declarations into the entry
//! - [`rewrite`] - The rewrite passes and their pipeline
//! - [`render`] - Layout, brace stripping and de-indentation
//! - [`budget`] - Script length against the character limit
//! - [`walker`] - Source discovery with gitignore support
//! - [`builder`] - Fluent API tying it all together
//! - [`sink`] - Clipboard and file output

pub mod budget;
pub mod builder;
pub mod cancel;
pub mod config;
pub mod entry;
pub mod errors;
pub mod extract;
pub mod merge;
pub mod parser;
pub mod render;
pub mod rewrite;
pub mod sink;
pub mod syntax;
pub mod walker;

// Re-export key types at crate root for convenience
pub use budget::{BudgetReport, BUDGET_CEILING};
pub use builder::{generate_from_sources, Generated, Generator};
pub use cancel::{CancellationToken, Cancelled};
pub use config::{Config, ConfigError, GenerateOptions};
pub use entry::{resolve_entry, EntryError, EntryPoint};
pub use errors::{exit_code, PackError};
pub use parser::{parse, ParseError};
pub use render::{render, FormatOptions, RenderError, RenderOptions};
pub use rewrite::{Pass, Pipeline, PipelineConfig, RewriteError};
pub use sink::{dispatch, Sink, SinkError};
pub use syntax::{Node, SyntaxTree, Token, Trivia};
pub use walker::WalkError;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `verbosity` picks the level: 0 warns,
/// 1 adds progress, 2 and up adds per-file and per-pass detail.
pub fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scriptpack={level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
