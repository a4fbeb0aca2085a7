//! Whitespace compression.
//!
//! Drops line breaks and indentation everywhere, keeping a single space where
//! there used to be separation. Punctuation hugs its neighbours, and names lose
//! the space that follows them.
//!
//! Two things survive compression regardless of the rules above:
//! preprocessor directives keep a line of their own, and no two tokens are
//! written so close that they lex as one (`else` `return`, `+` `+`).

use std::cell::Cell;
use std::sync::Arc;

use super::verify::would_fuse;
use super::Rewrite;
use crate::syntax::{Node, SyntaxKind, Token, TokenKind, Trivia, TriviaKind, TriviaList};

/// Tokens whose trivia is cleared with no space left behind.
const HUGGING: &[&str] = &[
    ";", ":", ",", "{", "}", "[", "]", "(", ")", "=", "==", ">", ">=", ">>", ">>=", "<", "<=",
    "<<", "<<=",
];

#[derive(Debug, Default)]
pub struct CompressWhitespace {
    state: Cell<State>,
}

impl CompressWhitespace {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Output position, carried from token to token in document order.
#[derive(Debug, Default, Clone, Copy)]
struct State {
    /// Last character written.
    last: Option<char>,
    /// The source had separation here that is still owed as one space.
    space: bool,
    /// The previous token takes no space after it.
    glue: bool,
    /// A directive was written and its line is still open.
    directive: bool,
}

impl State {
    fn at_line_start(&self) -> bool {
        matches!(self.last, None | Some('\n'))
    }

    /// Write what is owed in front of text starting with `next`.
    fn settle(&mut self, out: &mut TriviaList, next: Option<char>) {
        let fuses = matches!((self.last, next), (Some(p), Some(n)) if would_fuse(p, n));
        if (self.space || fuses) && !self.at_line_start() {
            out.push(Trivia::space());
            self.last = Some(' ');
        }
        self.space = false;
    }

    fn line_break(&mut self, out: &mut TriviaList) {
        out.push(Trivia::line_break());
        self.last = Some('\n');
        self.space = false;
        self.directive = false;
    }

    /// Compress one trivia list into `out`.
    ///
    /// The first line break after a directive ends its condition and is kept.
    fn compress(&mut self, list: &TriviaList, out: &mut TriviaList) {
        for item in list.iter() {
            if self.directive && item.kind() == TriviaKind::LineBreak {
                self.line_break(out);
                self.glue = false;
                continue;
            }
            if item.kind().is_blank() {
                self.space |= !self.glue && !self.at_line_start();
                continue;
            }
            if is_directive(item) {
                if !self.at_line_start() {
                    self.line_break(out);
                }
            } else {
                self.settle(out, item.text().chars().next());
            }
            out.push(item.clone());
            self.last = item.text().chars().last();
            self.glue = false;
            if item.ends_line() {
                self.line_break(out);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// `#if`, `#elif`, `#else`, `#endif`.
    Directive,
    /// The line break that ends a directive condition, where the grammar
    /// makes it a token.
    DirectiveEnd,
    Hug,
    Name,
    Plain,
}

impl Rule {
    fn of(token: &Token, ancestors: &[Arc<Node>]) -> Self {
        if token.kind == TokenKind::Directive {
            return if token.text().starts_with('#') {
                Rule::Directive
            } else {
                Rule::DirectiveEnd
            };
        }
        if HUGGING.contains(&token.text()) {
            return Rule::Hug;
        }
        let in_base_list = || ancestors.iter().any(|a| a.kind() == SyntaxKind::BaseList);
        if token.is_name() || (token.kind == TokenKind::Identifier && in_base_list()) {
            return Rule::Name;
        }
        Rule::Plain
    }
}

fn is_directive(t: &Trivia) -> bool {
    matches!(
        t.kind(),
        TriviaKind::Directive | TriviaKind::RegionStart | TriviaKind::RegionEnd
    )
}

/// Only the directive lines of `list`, each on a line of its own.
pub(super) fn directive_lines(list: &TriviaList) -> TriviaList {
    let mut out = TriviaList::new();
    for item in list.iter().filter(|t| is_directive(t)) {
        out.push(Trivia::line_break());
        out.push(item.clone());
        out.push(Trivia::line_break());
    }
    out
}

impl Rewrite for CompressWhitespace {
    fn node(&self, node: Arc<Node>, _: &[Arc<Node>]) -> Option<Arc<Node>> {
        let kind = node.kind();
        if !(kind.is_declaration() || kind.is_statement()) {
            return Some(node);
        }
        let (Some(first), Some(last)) = (node.first_token(), node.last_token()) else {
            return Some(node);
        };

        let leading = directive_lines(&first.leading);
        let trailing = directive_lines(&last.trailing);
        if leading == first.leading && trailing == last.trailing {
            return Some(node);
        }
        Some(Arc::new(
            node.with_leading_trivia(leading)
                .with_trailing_trivia(trailing),
        ))
    }

    fn token(&self, token: Arc<Token>, ancestors: &[Arc<Node>]) -> Arc<Token> {
        let rule = Rule::of(&token, ancestors);
        let mut state = self.state.get();
        let mut leading = TriviaList::new();
        let mut trailing = TriviaList::new();

        match rule {
            Rule::DirectiveEnd => state.space = false,
            Rule::Hug => {
                state.glue = true;
                state.compress(&token.leading, &mut leading);
                state.space = false;
            }
            Rule::Directive | Rule::Name | Rule::Plain => {
                state.compress(&token.leading, &mut leading);
            }
        }
        if rule == Rule::Directive && !state.at_line_start() {
            state.line_break(&mut leading);
        }
        state.settle(&mut leading, token.text().chars().next());
        state.last = token.text().chars().last().or(state.last);

        match rule {
            Rule::DirectiveEnd => {
                state.last = Some('\n');
                state.glue = false;
                state.directive = false;
            }
            Rule::Hug | Rule::Name => {
                state.glue = true;
                state.compress(&token.trailing, &mut trailing);
                state.glue = true;
            }
            Rule::Directive | Rule::Plain => {
                state.glue = false;
                state.directive |= rule == Rule::Directive;
                state.compress(&token.trailing, &mut trailing);
            }
        }
        let closes_block = token.text().starts_with("#else") || token.text().starts_with("#endif");
        if rule == Rule::Directive && closes_block && !state.at_line_start() {
            state.line_break(&mut trailing);
        }

        self.state.set(state);

        if leading == token.leading && trailing == token.trailing {
            token
        } else {
            Arc::new(Token {
                leading,
                trailing,
                ..(*token).clone()
            })
        }
    }
}
