//! Scriptpack CLI - Build a Space Engineers script from a C# project.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use scriptpack::builder::{Generated, Generator};
use scriptpack::cancel::CancellationToken;
use scriptpack::entry::EntryPoint;
use scriptpack::errors::{exit_code, PackError};
use scriptpack::sink::{dispatch, Sink, SinkError};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "scriptpack")]
#[command(about = "Build a single Space Engineers script from a C# project")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v progress, -vv details)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a project into one script
    Build {
        /// Project directory or .csproj file
        project: PathBuf,

        /// Output file; the script goes to the clipboard when omitted
        output: Option<PathBuf>,

        /// Strip comments, documentation, redundant modifiers and whitespace
        #[arg(short, long)]
        minify: bool,

        /// Strip comments
        #[arg(short, long)]
        remove_comments: bool,

        /// Strip documentation comments
        #[arg(long, visible_alias = "rd")]
        remove_documentation: bool,

        /// Skip a top-level directory (repeatable)
        #[arg(short = 'x', long, visible_alias = "xd", value_name = "DIR")]
        exclude_directory: Vec<String>,

        /// Skip files matching a glob (repeatable)
        #[arg(long, visible_alias = "xf", value_name = "GLOB")]
        exclude_file: Vec<String>,

        /// Name of the entry class
        #[arg(long, value_name = "NAME")]
        entry_name: Option<String>,

        /// Base type of the entry class
        #[arg(long, value_name = "TYPE")]
        entry_base: Option<String>,

        /// Print the script instead of copying it
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Print a JSON report with the script
        #[arg(long, conflicts_with = "stdout")]
        json: bool,

        /// Skip the consistency checks between rewrite passes
        #[arg(long)]
        no_verify: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    scriptpack::init_tracing(cli.verbose);

    let json_output = matches!(cli.command, Commands::Build { json: true, .. });

    let result = match cli.command {
        Commands::Build {
            project,
            output,
            minify,
            remove_comments,
            remove_documentation,
            exclude_directory,
            exclude_file,
            entry_name,
            entry_base,
            stdout,
            json,
            no_verify,
        } => {
            let mut generator = Generator::new(project)
                .cancellation(cancel_on_ctrl_c())
                .minify(minify)
                .remove_comments(remove_comments)
                .remove_documentation(remove_documentation)
                .verify(!no_verify);
            for name in exclude_directory {
                generator = generator.exclude_directory(name);
            }
            for pattern in exclude_file {
                generator = generator.exclude_file(pattern);
            }
            if entry_name.is_some() || entry_base.is_some() {
                let default = EntryPoint::default();
                generator = generator.entry(EntryPoint::new(
                    entry_name.unwrap_or(default.name),
                    entry_base.unwrap_or(default.base),
                ));
            }

            let sink = if stdout {
                Some(Sink::Stdout)
            } else if json && output.is_none() {
                None
            } else {
                Some(Sink::for_output(output))
            };
            run_build(generator, sink, json)
        }
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "scriptpack",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

/// A token cancelled by the first Ctrl-C. A second one exits at once.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handler unavailable");
                return;
            }
        };
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("cancelling");
                handle.cancel();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });
    token
}

// --- Build command ---

#[derive(Serialize)]
struct BuildReport<'a> {
    length: usize,
    ceiling: usize,
    exceeds: bool,
    files: Vec<String>,
    output: &'a str,
}

fn run_build(generator: Generator, sink: Option<Sink>, json: bool) -> Result<(), PackError> {
    let generated = generator.generate()?;

    if let Some(sink) = &sink {
        dispatch(&generated.output, sink)?;
    }

    if json {
        println!("{}", report_json(&generated)?);
    } else {
        eprintln!("{}", generated.report);
    }

    Ok(())
}

fn report_json(generated: &Generated) -> Result<String, PackError> {
    let report = BuildReport {
        length: generated.report.length,
        ceiling: generated.report.ceiling,
        exceeds: generated.report.exceeds(),
        files: generated
            .files
            .iter()
            .map(|f| f.display().to_string())
            .collect(),
        output: &generated.output,
    };
    serde_json::to_string_pretty(&report).map_err(|e| {
        PackError::Sink(SinkError::Io {
            path: PathBuf::from("<stdout>"),
            source: std::io::Error::other(e.to_string()),
        })
    })
}
