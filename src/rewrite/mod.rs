//! Rewrite pipeline.
//!
//! Each pass is a [`Rewrite`] implementation driven over the merged
//! declaration by [`rewrite`]. Passes run in the fixed order of
//! [`Pass::ALL`]; the configuration only selects which of them run.

mod comments;
mod documentation;
mod empty_statements;
mod modifiers;
mod regions;
mod type_separator;
pub mod verify;
mod whitespace;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::cancel::{CancellationToken, Cancelled};
use crate::parser::check_syntax;
use crate::syntax::{Element, Node, Token};

pub use comments::StripComments;
pub use documentation::StripDocumentation;
pub use empty_statements::RemoveEmptyStatements;
pub use modifiers::StripRedundantModifiers;
pub use regions::RemoveRegions;
pub use type_separator::SeparateTypes;
pub use whitespace::CompressWhitespace;

/// A tree rewrite.
///
/// `ancestors` holds the enclosing nodes, innermost last. Both hooks default
/// to the identity.
pub trait Rewrite {
    /// Called before the node's children are visited. `None` removes the node
    /// from its parent.
    fn node(&self, node: Arc<Node>, ancestors: &[Arc<Node>]) -> Option<Arc<Node>> {
        let _ = ancestors;
        Some(node)
    }

    fn token(&self, token: Arc<Token>, ancestors: &[Arc<Node>]) -> Arc<Token> {
        let _ = ancestors;
        token
    }
}

/// Apply `pass` to `root` and every node and token below it, in document
/// order.
///
/// Unchanged subtrees are shared with the input. Returns `None` when the pass
/// removes the root itself.
pub fn rewrite(root: &Arc<Node>, pass: &dyn Rewrite) -> Option<Arc<Node>> {
    let mut ancestors = Vec::new();
    visit(Arc::clone(root), pass, &mut ancestors)
}

fn visit(node: Arc<Node>, pass: &dyn Rewrite, ancestors: &mut Vec<Arc<Node>>) -> Option<Arc<Node>> {
    let node = pass.node(node, ancestors)?;

    ancestors.push(Arc::clone(&node));
    let mut changed = false;
    let mut children = Vec::with_capacity(node.children().len());
    for child in node.children() {
        match child {
            Element::Node(n) => match visit(Arc::clone(n), pass, ancestors) {
                Some(new) => {
                    changed |= !Arc::ptr_eq(&new, n);
                    children.push(Element::Node(new));
                }
                None => changed = true,
            },
            Element::Token(t) => {
                let new = pass.token(Arc::clone(t), ancestors);
                changed |= !Arc::ptr_eq(&new, t);
                children.push(Element::Token(new));
            }
        }
    }
    ancestors.pop();

    if changed {
        Some(Arc::new(node.with_children(children)))
    } else {
        Some(node)
    }
}

/// The rewrite passes, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    StripComments,
    StripDocumentation,
    StripRedundantModifiers,
    RemoveEmptyStatements,
    RemoveRegions,
    CompressWhitespace,
    SeparateTypes,
}

impl Pass {
    pub const ALL: [Pass; 7] = [
        Pass::StripComments,
        Pass::StripDocumentation,
        Pass::StripRedundantModifiers,
        Pass::RemoveEmptyStatements,
        Pass::RemoveRegions,
        Pass::CompressWhitespace,
        Pass::SeparateTypes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::StripComments => "strip-comments",
            Pass::StripDocumentation => "strip-documentation",
            Pass::StripRedundantModifiers => "strip-redundant-modifiers",
            Pass::RemoveEmptyStatements => "remove-empty-statements",
            Pass::RemoveRegions => "remove-regions",
            Pass::CompressWhitespace => "compress-whitespace",
            Pass::SeparateTypes => "separate-types",
        }
    }

    /// Run this pass over `root`.
    pub fn apply(self, root: &Arc<Node>) -> Option<Arc<Node>> {
        match self {
            Pass::StripComments => rewrite(root, &StripComments),
            Pass::StripDocumentation => rewrite(root, &StripDocumentation),
            Pass::StripRedundantModifiers => rewrite(root, &StripRedundantModifiers),
            Pass::RemoveEmptyStatements => rewrite(root, &RemoveEmptyStatements),
            Pass::RemoveRegions => rewrite(root, &RemoveRegions),
            Pass::CompressWhitespace => rewrite(root, &CompressWhitespace::new()),
            Pass::SeparateTypes => rewrite(root, &SeparateTypes),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three user-facing switches.
///
/// `minify` implies the other two and adds the structural passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub remove_comments: bool,
    pub remove_documentation: bool,
    pub minify: bool,
}

impl PipelineConfig {
    /// Enabled passes, in pipeline order, each at most once.
    pub fn passes(&self) -> Vec<Pass> {
        Pass::ALL
            .into_iter()
            .filter(|pass| match pass {
                Pass::StripComments => self.remove_comments || self.minify,
                Pass::StripDocumentation => self.remove_documentation || self.minify,
                _ => self.minify,
            })
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("internal error: pass '{pass}' left the tree inconsistent: {reason}")]
    Inconsistency { pass: Pass, reason: String },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// A configured sequence of passes.
#[derive(Debug, Clone)]
pub struct Pipeline {
    passes: Vec<Pass>,
    verify: bool,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            passes: config.passes(),
            verify: true,
        }
    }

    /// Check the tree after every pass and re-parse the final text
    /// (default: on).
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Run every enabled pass over the merged declaration.
    ///
    /// Cancellation is observed before and after each pass, never inside one.
    pub fn run(&self, root: Arc<Node>, cancel: &CancellationToken) -> Result<Arc<Node>, RewriteError> {
        // Only hold the output to the parser if the input passed it.
        let reparse = self.verify
            && !self.passes.is_empty()
            && check_syntax(&root.to_string(), Path::new("<merged>")).is_ok();

        let mut current = root;
        for &pass in &self.passes {
            cancel.check()?;
            debug!(pass = %pass, "pass started");

            current = pass.apply(&current).ok_or_else(|| RewriteError::Inconsistency {
                pass,
                reason: "the entry declaration was removed".to_string(),
            })?;
            if self.verify {
                verify::check_structure(&current)
                    .map_err(|reason| RewriteError::Inconsistency { pass, reason })?;
            }

            debug!(pass = %pass, tokens = current.tokens().count(), "pass finished");
            cancel.check()?;
        }

        if let (true, Some(&last)) = (reparse, self.passes.last()) {
            check_syntax(&current.to_string(), Path::new("<merged>")).map_err(|e| {
                RewriteError::Inconsistency {
                    pass: last,
                    reason: e.to_string(),
                }
            })?;
        }

        info!(passes = self.passes.len(), "rewrite finished");
        Ok(current)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::*;
    use crate::entry::{resolve_entry, EntryPoint};
    use crate::extract::declarations;
    use crate::merge::merge;
    use crate::parser::parse;
    use crate::syntax::TriviaKind;

    /// Parse `source` and return the merged entry declaration.
    pub(crate) fn merged(source: &str) -> Arc<Node> {
        let tree = parse(source, Path::new("Test.cs"), &CancellationToken::new()).unwrap();
        let all: Vec<Arc<Node>> = declarations(&tree).cloned().collect();
        let entry = resolve_entry(&all, &EntryPoint::default()).unwrap();
        merge(entry, &all)
    }

    pub(crate) fn trivia_kinds(node: &Node) -> Vec<TriviaKind> {
        node.tokens()
            .flat_map(|t| t.leading.iter().chain(t.trailing.iter()))
            .map(|t| t.kind())
            .collect()
    }

    const SCRIPT: &str = r#"
/// <summary>Entry.</summary>
public partial class Program : MyGridProgram
{
    #region State
    private int _count; // counter
    #endregion

    /* setup */
    public Program() { ; }

    /// <summary>Runs.</summary>
    public void Main(string argument)
    {
        _count++;
        if (_count > 10) { _count = 0; }
        else return;
    }
}

internal class Helper
{
    private string Name => "helper";
}
"#;

    #[test]
    fn test_minify_implies_sub_passes() {
        let config = PipelineConfig {
            minify: true,
            ..Default::default()
        };
        assert_eq!(config.passes(), Pass::ALL.to_vec());

        let only_comments = PipelineConfig {
            remove_comments: true,
            ..Default::default()
        };
        assert_eq!(only_comments.passes(), vec![Pass::StripComments]);
    }

    #[test]
    fn test_minify_leaves_no_comment_trivia() {
        let minify = PipelineConfig {
            minify: true,
            ..Default::default()
        };
        let strip = PipelineConfig {
            remove_comments: true,
            remove_documentation: true,
            minify: false,
        };
        let cancel = CancellationToken::new();
        let a = Pipeline::new(&minify).run(merged(SCRIPT), &cancel).unwrap();
        let b = Pipeline::new(&strip).run(merged(SCRIPT), &cancel).unwrap();

        for node in [&a, &b] {
            assert!(!trivia_kinds(node).iter().any(|k| k.is_comment()));
        }
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_minified_output_reparses() {
        let config = PipelineConfig {
            minify: true,
            ..Default::default()
        };
        let out = Pipeline::new(&config)
            .run(merged(SCRIPT), &CancellationToken::new())
            .unwrap();
        let text = out.to_string();
        assert!(check_syntax(&text, Path::new("out.cs")).is_ok(), "{text}");
        assert!(!text.contains("private"));
        assert!(!text.contains("#region"));
        assert!(text.contains("else return;"));
        assert!(text.contains("class Helper{string Name=>"));
        assert!(!text.contains("\n\n"));
    }

    #[test]
    fn test_minify_keeps_conditional_blocks() {
        let source = "class Program : MyGridProgram\n{\n    int a;\n#if DEBUG\n    void Log(string s) { Echo(s); }\n#else\n    void Log(string s) { }\n#endif\n    int b;\n}";
        let config = PipelineConfig {
            minify: true,
            ..Default::default()
        };
        let out = Pipeline::new(&config)
            .run(merged(source), &CancellationToken::new())
            .unwrap();
        let text = out.to_string();

        assert!(check_syntax(&text, Path::new("out.cs")).is_ok(), "{text}");
        assert!(text.contains("\n#if DEBUG\nvoid Log(string s){Echo(s);}\n#else\n"), "{text}");
        assert!(text.contains("\n#endif\nint b;"), "{text}");
    }

    #[test]
    fn test_rewrite_shares_untouched_subtrees() {
        let root = merged("class Program : MyGridProgram { void A() { } void B() { } }");
        let out = rewrite(&root, &StripComments).unwrap();
        assert!(Arc::ptr_eq(&root, &out));
    }

    #[test]
    fn test_cancelled_pipeline() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = PipelineConfig {
            remove_comments: true,
            ..Default::default()
        };
        let err = Pipeline::new(&config).run(merged(SCRIPT), &cancel).unwrap_err();
        assert!(matches!(err, RewriteError::Cancelled(_)));
    }

    struct RemoveRoot;

    impl Rewrite for RemoveRoot {
        fn node(&self, node: Arc<Node>, ancestors: &[Arc<Node>]) -> Option<Arc<Node>> {
            if ancestors.is_empty() {
                None
            } else {
                Some(node)
            }
        }
    }

    #[test]
    fn test_removed_root_is_none() {
        let root = merged("class Program : MyGridProgram { }");
        assert!(rewrite(&root, &RemoveRoot).is_none());
    }

    #[test]
    fn test_pass_names() {
        assert_eq!(Pass::CompressWhitespace.to_string(), "compress-whitespace");
        let err = RewriteError::Inconsistency {
            pass: Pass::SeparateTypes,
            reason: "unbalanced braces".into(),
        };
        assert_eq!(
            err.to_string(),
            "internal error: pass 'separate-types' left the tree inconsistent: unbalanced braces"
        );
    }
}
