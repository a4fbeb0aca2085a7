//! Fluent builder API for scriptpack.
//!
//! Provides both function composition and builder-style APIs
//! for turning a project into a single script.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::budget::BudgetReport;
use crate::cancel::CancellationToken;
use crate::config::{Config, GenerateOptions};
use crate::entry::{resolve_entry, EntryPoint};
use crate::errors::PackError;
use crate::extract::declarations;
use crate::merge::merge;
use crate::parser::parse;
use crate::render::{render, RenderOptions};
use crate::rewrite::{Pass, Pipeline};
use crate::syntax::{Node, SyntaxTree};
use crate::walker::{project_root, source_files, WalkOptions};

/// Builder for generating a script from a project.
///
/// # Examples
///
/// ```no_run
/// use scriptpack::builder::Generator;
///
/// let generated = Generator::new("./MyScript")
///     .minify(true)
///     .generate()
///     .unwrap();
///
/// println!("{}", generated.report);
/// ```
pub struct Generator {
    root: PathBuf,
    options: GenerateOptions,
    entry: Option<EntryPoint>,
    read_config: bool,
    cancel: CancellationToken,
}

impl Generator {
    /// Create a new builder for a project directory or `.csproj` file.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: GenerateOptions::default(),
            entry: None,
            read_config: true,
            cancel: CancellationToken::new(),
        }
    }

    /// Compress the script as far as possible. Implies both stripping options.
    pub fn minify(mut self, minify: bool) -> Self {
        self.options.pipeline.minify = minify;
        self
    }

    pub fn remove_comments(mut self, remove: bool) -> Self {
        self.options.pipeline.remove_comments = remove;
        self
    }

    pub fn remove_documentation(mut self, remove: bool) -> Self {
        self.options.pipeline.remove_documentation = remove;
        self
    }

    /// Merge into a different entry declaration than `Program : MyGridProgram`.
    pub fn entry(mut self, entry: EntryPoint) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Skip a top-level directory of the project.
    pub fn exclude_directory(mut self, name: impl Into<String>) -> Self {
        self.options.exclude_directories.push(name.into());
        self
    }

    /// Skip files matching a glob pattern.
    pub fn exclude_file(mut self, pattern: impl Into<String>) -> Self {
        self.options.exclude_files.push(pattern.into());
        self
    }

    /// Check the tree after every rewrite pass (default: true).
    pub fn verify(mut self, verify: bool) -> Self {
        self.options.verify = verify;
        self
    }

    /// Read `scriptpack.toml` from the project root (default: true).
    pub fn read_config(mut self, read: bool) -> Self {
        self.read_config = read;
        self
    }

    /// Observe `token` between files and around rewrite passes.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Options as configured so far, before the project file is applied.
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Discover, parse, merge, rewrite and render.
    pub fn generate(self) -> Result<Generated, PackError> {
        let root = project_root(&self.root)?;

        let mut options = self.options;
        if self.read_config {
            let config = Config::load(&root)?;
            config.apply(&mut options);
            options.entry = config.entry_point();
        }
        if let Some(entry) = self.entry {
            options.entry = entry;
        }

        let walk = options
            .exclude_directories
            .iter()
            .fold(WalkOptions::default(), |walk, name| walk.exclude_directory(name.as_str()));
        let walk = options
            .exclude_files
            .iter()
            .fold(walk, |walk, pattern| walk.exclude_file(pattern.as_str()));

        let files = source_files(&root, &walk)?;
        if files.is_empty() {
            return Err(PackError::NoFilesFound(root));
        }
        info!(root = %root.display(), files = files.len(), "sources discovered");

        let cancel = &self.cancel;
        let trees = files
            .into_par_iter()
            .map(|path| {
                cancel.check()?;
                let source = read_source(&path)?;
                let tree = parse(&source, &path, cancel)?;
                debug!(file = %path.display(), "parsed");
                Ok(tree)
            })
            .collect::<Result<Vec<SyntaxTree>, PackError>>()?;

        assemble(&trees, &options, cancel)
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct Generated {
    /// The script text.
    pub output: String,
    pub report: BudgetReport,
    /// Source files in merge order.
    pub files: Vec<PathBuf>,
    /// Rewrite passes that ran, in order.
    pub passes: Vec<Pass>,
}

fn read_source(path: &Path) -> Result<String, PackError> {
    let text = fs::read_to_string(path).map_err(|source| PackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Generate a script from in-memory sources, in the given order.
///
/// `sources` pairs a display name with the file text.
pub fn generate_from_sources(
    sources: &[(&str, &str)],
    options: &GenerateOptions,
    cancel: &CancellationToken,
) -> Result<Generated, PackError> {
    let trees = sources
        .par_iter()
        .map(|(name, text)| {
            cancel.check()?;
            Ok(parse(text, Path::new(name), cancel)?)
        })
        .collect::<Result<Vec<SyntaxTree>, PackError>>()?;

    assemble(&trees, options, cancel)
}

/// Everything after parsing: extract, resolve, merge, rewrite, render.
fn assemble(
    trees: &[SyntaxTree],
    options: &GenerateOptions,
    cancel: &CancellationToken,
) -> Result<Generated, PackError> {
    let mut all: Vec<Arc<Node>> = Vec::new();
    for tree in trees {
        cancel.check()?;
        let before = all.len();
        all.extend(declarations(tree).cloned());
        debug!(
            file = %tree.path.display(),
            declarations = all.len() - before,
            "declarations extracted"
        );
    }

    let entry = resolve_entry(&all, &options.entry)?;
    let merged = merge(entry, &all);

    let pipeline = Pipeline::new(&options.pipeline).verify(options.verify);
    let rewritten = pipeline.run(merged, cancel)?;
    cancel.check()?;

    let render_options = RenderOptions {
        reformat: !options.pipeline.minify,
        ..Default::default()
    };
    let output = render(&rewritten, &render_options)?;

    let report = BudgetReport::new(&output);
    if report.exceeds() {
        warn!(budget = %report, "script exceeds the character limit");
    } else {
        info!(budget = %report, "script generated");
    }

    Ok(Generated {
        output,
        report,
        files: trees.iter().map(|t| t.path.clone()).collect(),
        passes: pipeline.passes().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryError;
    use crate::errors::exit_code;
    use crate::rewrite::PipelineConfig;
    use tempfile::TempDir;

    const PROGRAM: &str = "public partial class Program : MyGridProgram\n{\n    public void Main(string argument)\n    {\n        Echo(Helper.Name);\n    }\n}\n";
    const HELPER: &str = "/// <summary>Shared names.</summary>\nstatic class Helper\n{\n    // the label\n    public const string Name = \"helper\";\n}\n";

    fn create_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Program.cs"), PROGRAM).unwrap();
        fs::create_dir_all(dir.path().join("Lib")).unwrap();
        fs::write(dir.path().join("Lib/Helper.cs"), HELPER).unwrap();
        fs::create_dir_all(dir.path().join("obj")).unwrap();
        fs::write(dir.path().join("obj/Broken.cs"), "class {").unwrap();
        dir
    }

    #[test]
    fn test_generate_project() {
        let dir = create_project();
        let generated = Generator::new(dir.path()).generate().unwrap();

        assert_eq!(generated.files.len(), 2);
        assert!(generated.files[0].ends_with("Lib/Helper.cs"));
        assert!(generated.passes.is_empty());

        let output = &generated.output;
        assert!(output.starts_with("public void Main(string argument) {"), "{output}");
        assert!(output.contains("static class Helper {"), "{output}");
        assert!(output.contains("// the label"));
        assert!(output.contains("/// <summary>Shared names.</summary>"));
        assert_eq!(generated.report.length, output.chars().count());
    }

    #[test]
    fn test_order_follows_files() {
        let generated = generate_from_sources(
            &[
                ("F1.cs", "class A { }\nclass B { }"),
                ("F2.cs", "class Program : MyGridProgram\n{\n    int x;\n}\nclass C { }"),
            ],
            &GenerateOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        let out = &generated.output;
        let at = |needle: &str| out.find(needle).unwrap();
        assert!(out.starts_with("int x;"), "{out}");
        assert!(at("int x;") < at("class A"));
        assert!(at("class A") < at("class B"));
        assert!(at("class B") < at("class C"));
    }

    #[test]
    fn test_minified_project() {
        let dir = create_project();
        let generated = Generator::new(dir.path()).minify(true).generate().unwrap();
        let output = &generated.output;

        assert_eq!(generated.passes, Pass::ALL.to_vec());
        assert!(!output.contains("//"), "{output}");
        assert!(!output.contains("\n\n"));
        assert!(output.starts_with("public void Main(string argument){"), "{output}");
        assert_eq!(generated.report.length, output.chars().count());
    }

    #[test]
    fn test_minified_conditional_code() {
        let options = GenerateOptions {
            pipeline: PipelineConfig {
                minify: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let generated = generate_from_sources(
            &[(
                "Program.cs",
                "class Program : MyGridProgram { int a;\n#if DEBUG\n void Log() { }\n#endif\n int b; }",
            )],
            &options,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(generated.output, "int a;\n#if DEBUG\nvoid Log(){}\n#endif\nint b;");
    }

    #[test]
    fn test_missing_entry_point() {
        let err = generate_from_sources(
            &[("Program.cs", "class Program { }")],
            &GenerateOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Entry(EntryError::NoEntryPoint { .. })));
    }

    #[test]
    fn test_custom_entry_point() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Main.cs"), "class Script : Base { int a; }").unwrap();

        let generated = Generator::new(dir.path())
            .entry(EntryPoint::new("Script", "Base"))
            .generate()
            .unwrap();
        assert_eq!(generated.output, "int a;");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = generate_from_sources(
            &[("Bad.cs", "class Program : MyGridProgram { void M( }")],
            &GenerateOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Parse(_)));
        assert!(err.to_string().contains("Bad.cs"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = create_project();
        let token = CancellationToken::new();
        token.cancel();
        let err = Generator::new(dir.path())
            .cancellation(token)
            .generate()
            .unwrap_err();
        assert!(matches!(err, PackError::Cancelled(_)));
    }

    #[test]
    fn test_excluded_sources_are_skipped() {
        let dir = create_project();
        fs::create_dir_all(dir.path().join("Tests")).unwrap();
        fs::write(dir.path().join("Tests/Broken.cs"), "class {").unwrap();
        fs::write(dir.path().join("Lib/Helper.Designer.cs"), "class {").unwrap();

        let generated = Generator::new(dir.path())
            .exclude_directory("Tests")
            .exclude_file("*.Designer.cs")
            .generate()
            .unwrap();
        assert_eq!(generated.files.len(), 2);
    }

    #[test]
    fn test_cancelled_from_another_thread() {
        let dir = create_project();
        let token = CancellationToken::new();
        let handle = token.clone();
        std::thread::spawn(move || handle.cancel()).join().unwrap();

        let err = Generator::new(dir.path())
            .cancellation(token)
            .generate()
            .unwrap_err();
        assert_eq!(exit_code(&err), 130);
    }

    #[test]
    fn test_empty_project() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("readme.md"), "# nothing").unwrap();
        let err = Generator::new(dir.path()).generate().unwrap_err();
        assert!(matches!(err, PackError::NoFilesFound(_)));
    }

    #[test]
    fn test_csproj_and_config_file() {
        let dir = create_project();
        fs::write(dir.path().join("Script.csproj"), "<Project />").unwrap();
        fs::write(
            dir.path().join("scriptpack.toml"),
            "remove_comments = true\nexclude_directories = [\"Lib\"]\n",
        )
        .unwrap();

        let generated = Generator::new(dir.path().join("Script.csproj"))
            .generate()
            .unwrap();
        assert_eq!(generated.files.len(), 1);
        assert_eq!(generated.passes, vec![Pass::StripComments]);
        assert!(!generated.output.contains("Helper {"));
    }

    #[test]
    fn test_options_are_combined() {
        let options = GenerateOptions {
            pipeline: PipelineConfig {
                remove_comments: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let generated = generate_from_sources(
            &[("P.cs", "class Program : MyGridProgram\n{\n    // gone\n    /// kept\n    int a;\n}")],
            &options,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(generated.output, "/// kept\nint a;");
        assert_eq!(generated.passes, vec![Pass::StripComments]);
    }
}
