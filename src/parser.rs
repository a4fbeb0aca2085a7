//! C# parsing with tree-sitter.
//!
//! The concrete tree from `tree-sitter-c-sharp` is converted into the
//! trivia-carrying [`Node`] model: every leaf becomes a [`Token`], and the text
//! between two leaves (whitespace, comments, `#region` and other extras) is
//! re-lexed into trivia and split between them.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use tree_sitter::Parser;

use crate::cancel::{CancellationToken, Cancelled};
use crate::syntax::kind::is_atomic_grammar_kind;
use crate::syntax::trivia::{lex_trivia, split_gap};
use crate::syntax::{Element, Node, SyntaxKind, SyntaxTree, Token, TokenKind, TokenRole, TriviaList};

thread_local! {
    static CSHARP_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// Errors raised while parsing a source file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to initialize C# parser: {0}")]
    ParserInit(String),

    #[error("parser produced no tree for {file}")]
    NoTree { file: PathBuf },

    #[error("parse error in {file} at {line}:{column}: {message}")]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

fn init_csharp_parser() -> Result<Parser, ParseError> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| ParseError::ParserInit(e.to_string()))?;
    Ok(p)
}

/// Execute a function with this thread's cached C# parser.
fn with_csharp_parser<F, R>(f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut Parser) -> R,
{
    CSHARP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init_csharp_parser()?);
        }
        let parser = slot
            .as_mut()
            .ok_or_else(|| ParseError::ParserInit("no parser cached".to_string()))?;
        Ok(f(parser))
    })
}

/// Parse one source file into a syntax tree.
///
/// `file` only identifies the source in diagnostics.
pub fn parse(
    source: &str,
    file: &Path,
    cancel: &CancellationToken,
) -> Result<SyntaxTree, ParseError> {
    cancel.check()?;

    let tree = with_csharp_parser(|p| p.parse(source, None))?.ok_or_else(|| {
        ParseError::NoTree {
            file: file.to_path_buf(),
        }
    })?;
    let ts_root = tree.root_node();
    if ts_root.has_error() {
        return Err(syntax_error(ts_root, source, file));
    }

    cancel.check()?;

    let mut leaves = Vec::new();
    let raw = collect(ts_root, source, &mut leaves);
    let mut tokens = attach_trivia(&leaves, source);
    let root = Node::new(SyntaxKind::CompilationUnit, build(raw, &mut tokens));

    debug!(file = %file.display(), tokens = leaves.len(), "parsed");

    Ok(SyntaxTree {
        path: file.to_path_buf(),
        root: Arc::new(root),
    })
}

/// Check that `source` parses without errors, without building a tree.
pub fn check_syntax(source: &str, file: &Path) -> Result<(), ParseError> {
    let tree = with_csharp_parser(|p| p.parse(source, None))?.ok_or_else(|| {
        ParseError::NoTree {
            file: file.to_path_buf(),
        }
    })?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error(root, source, file));
    }
    Ok(())
}

fn syntax_error(root: tree_sitter::Node, source: &str, file: &Path) -> ParseError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("expected `{}`", node.kind())
    } else {
        let snippet: String = source
            .get(node.byte_range())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .chars()
            .take(24)
            .collect();
        if snippet.is_empty() {
            "unexpected input".to_string()
        } else {
            format!("unexpected `{snippet}`")
        }
    };

    ParseError::Syntax {
        file: file.to_path_buf(),
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

fn first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}

/// A leaf of the concrete tree, by byte range.
struct Leaf {
    start: usize,
    end: usize,
    kind: TokenKind,
    role: TokenRole,
}

/// Shape of the converted tree before trivia is attached.
enum Raw {
    Node(SyntaxKind, Vec<Raw>),
    Leaf(usize),
}

fn collect(node: tree_sitter::Node, source: &str, leaves: &mut Vec<Leaf>) -> Vec<Raw> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if !cursor.goto_first_child() {
        return out;
    }

    loop {
        let child = cursor.node();
        let role = if cursor.field_name() == Some("name") {
            TokenRole::Name
        } else {
            TokenRole::Plain
        };

        if !child.is_extra() {
            let grammar_kind = child.kind();
            if is_atomic_grammar_kind(grammar_kind) || child.child_count() == 0 {
                if child.start_byte() < child.end_byte() {
                    let text = source.get(child.byte_range()).unwrap_or_default();
                    leaves.push(Leaf {
                        start: child.start_byte(),
                        end: child.end_byte(),
                        kind: TokenKind::classify(grammar_kind, text),
                        role,
                    });
                    let leaf = Raw::Leaf(leaves.len() - 1);
                    // Single-token statements such as `;` still need a node.
                    let kind = SyntaxKind::from_grammar(grammar_kind);
                    if child.is_named() && kind != SyntaxKind::Other {
                        out.push(Raw::Node(kind, vec![leaf]));
                    } else {
                        out.push(leaf);
                    }
                }
            } else {
                let children = collect(child, source, leaves);
                if !children.is_empty() {
                    out.push(Raw::Node(SyntaxKind::from_grammar(grammar_kind), children));
                }
            }
        }

        if !cursor.goto_next_sibling() {
            break;
        }
    }

    out
}

fn attach_trivia(leaves: &[Leaf], source: &str) -> Vec<Option<Token>> {
    let mut tokens: Vec<Option<Token>> = Vec::with_capacity(leaves.len());
    let mut prev_end = 0;

    for (i, leaf) in leaves.iter().enumerate() {
        let gap = source.get(prev_end..leaf.start).unwrap_or_default();
        let (trailing, leading) = split_gap(gap, i > 0);
        if let Some(Some(prev)) = tokens.last_mut() {
            prev.trailing = trailing;
        }

        let mut token = Token::new(leaf.kind, source.get(leaf.start..leaf.end).unwrap_or_default());
        token.leading = leading;
        token.role = leaf.role;
        tokens.push(Some(token));
        prev_end = leaf.end;
    }

    if let Some(Some(last)) = tokens.last_mut() {
        let tail: TriviaList = lex_trivia(source.get(prev_end..).unwrap_or_default());
        last.trailing.extend(tail);
    }

    tokens
}

fn build(raw: Vec<Raw>, tokens: &mut [Option<Token>]) -> Vec<Element> {
    let mut out = Vec::with_capacity(raw.len());
    for item in raw {
        match item {
            Raw::Leaf(i) => {
                if let Some(token) = tokens.get_mut(i).and_then(Option::take) {
                    out.push(Element::from(token));
                }
            }
            Raw::Node(kind, children) => {
                out.push(Element::from(Node::new(kind, build(children, tokens))));
            }
        }
    }
    out
}
