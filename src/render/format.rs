//! Canonical C# layout.
//!
//! One fixed style: every statement and member starts its own line,
//! indentation follows brace depth, spacing between tokens on a line follows
//! [`FormatOptions`], and opening braces, `else`, `catch` and `finally` are
//! pulled onto the line before them. Other line breaks of the input are kept,
//! as are comments and directives, which are re-indented.

use std::ops::Range;
use std::sync::Arc;

use super::RenderError;
use crate::rewrite::verify::would_fuse;
use crate::syntax::{Element, Node, SyntaxKind, Token, TokenKind, TriviaKind};

/// Keywords followed by a parenthesized condition or header.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "while", "for", "foreach", "switch", "catch", "using", "lock", "fixed", "when",
];

/// Keywords that read like calls: `typeof(T)`, `new()`.
const CALL_KEYWORDS: &[&str] = &[
    "typeof", "sizeof", "nameof", "default", "new", "this", "base", "checked", "unchecked",
    "stackalloc",
];

/// Statements whose body is indented when it is not a block.
const EMBEDDING: &[&str] = &["if", "else", "while", "for", "foreach", "do", "using", "lock", "fixed"];

const SPACED_OPERATORS: &[&str] = &[
    "=", "==", "!=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "??=", "=>",
    "&&", "||", "??", "<=", ">=",
];

/// The layout rules applied by [`format`].
///
/// The default is the canonical style. It is built once per run and passed
/// down by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Columns per indentation level.
    pub indent_size: usize,
    /// Columns a tab counts for when measuring indentation.
    pub tab_width: usize,
    /// Indent the statements under a `case` label.
    pub indent_switch_sections: bool,
    /// Indent a non-block body of `if`, `while` and friends.
    pub indent_embedded_statements: bool,
    pub space_after_comma: bool,
    pub space_after_control_keyword: bool,
    pub space_around_base_colon: bool,
    pub space_before_call_paren: bool,
    pub space_within_parens: bool,
    /// Longest run of blank lines kept.
    pub max_blank_lines: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            tab_width: 4,
            indent_switch_sections: true,
            indent_embedded_statements: true,
            space_after_comma: true,
            space_after_control_keyword: true,
            space_around_base_colon: true,
            space_before_call_paren: false,
            space_within_parens: false,
            max_blank_lines: 1,
        }
    }
}

impl FormatOptions {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.indent_size == 0 {
            return Err(RenderError::InvalidOptions("indent_size must be at least 1".into()));
        }
        if self.tab_width == 0 {
            return Err(RenderError::InvalidOptions("tab_width must be at least 1".into()));
        }
        Ok(())
    }
}

/// Formatted text of a type declaration.
#[derive(Debug, Clone)]
pub struct Formatted {
    pub text: String,
    body: Option<Range<usize>>,
}

impl Formatted {
    /// The text between the braces of the declaration body.
    pub fn body(&self) -> Option<&str> {
        self.body.clone().and_then(|range| self.text.get(range))
    }
}

/// Lay out `root` in the canonical style.
pub fn format(root: &Node, options: &FormatOptions) -> Formatted {
    let body = root.body().map(|b| &**b);
    let mut formatter = Formatter {
        options,
        out: String::new(),
        prev: None,
        prev_parent: SyntaxKind::Other,
        pending: 0,
        fresh: true,
        force_line: false,
        open: Vec::new(),
        body,
        open_brace: body.and_then(|b| b.first_token()),
        close_brace: body.and_then(|b| b.last_token()),
        start: None,
        end: None,
    };
    formatter.node(root, 0);
    formatter.finish();

    let body = match (formatter.start, formatter.end) {
        (Some(start), Some(end)) if start <= end => Some(start..end),
        _ => None,
    };
    Formatted {
        text: formatter.out,
        body,
    }
}

#[derive(Clone, Copy)]
struct Ctx<'n> {
    level: usize,
    parent: &'n Node,
}

struct Formatter<'a> {
    options: &'a FormatOptions,
    out: String,
    prev: Option<Arc<Token>>,
    prev_parent: SyntaxKind,
    /// Line breaks owed before the next token.
    pending: usize,
    /// The next token begins a statement or declaration.
    fresh: bool,
    force_line: bool,
    /// One entry per open brace: whether a line break followed it.
    open: Vec<bool>,
    body: Option<&'a Node>,
    open_brace: Option<&'a Arc<Token>>,
    close_brace: Option<&'a Arc<Token>>,
    start: Option<usize>,
    end: Option<usize>,
}

impl<'a> Formatter<'a> {
    fn node(&mut self, node: &Node, level: usize) {
        let in_body = self.body.is_some_and(|b| std::ptr::eq(b, node));
        let mut inner = level;

        for (index, child) in node.children().iter().enumerate() {
            match child {
                Element::Token(t) => {
                    if t.text() == "}" {
                        inner = level;
                    }
                    self.token(t, Ctx { level: inner, parent: node });
                    if t.text() == "{" {
                        inner = level + 1;
                    }
                }
                Element::Node(n) => {
                    let kind = n.kind();
                    if kind.is_statement()
                        || kind.is_declaration()
                        || matches!(
                            kind,
                            SyntaxKind::Accessor
                                | SyntaxKind::EnumMember
                                | SyntaxKind::SwitchSection
                                | SyntaxKind::Conditional
                        )
                    {
                        self.fresh = true;
                    }
                    if (in_body && self.prev.is_some()) || self.breaks_before(node, n) {
                        self.force_line = true;
                    }
                    let level = inner + self.bonus(node, index, n);
                    self.node(n, level);
                    if kind == SyntaxKind::AttributeList {
                        self.fresh = true;
                    }
                }
            }
        }
    }

    /// Extra indentation for an embedded statement or a case body.
    fn bonus(&self, parent: &Node, index: usize, child: &Node) -> usize {
        let kind = child.kind();
        if !kind.is_statement() || kind == SyntaxKind::Block {
            return 0;
        }
        match parent.kind() {
            SyntaxKind::SwitchSection => usize::from(self.options.indent_switch_sections),
            SyntaxKind::Statement if self.options.indent_embedded_statements => {
                let head = parent.first_token().map(|t| t.text()).unwrap_or_default();
                let after_else = index > 0
                    && parent.children()[index - 1]
                        .as_token()
                        .is_some_and(|t| t.text() == "else");
                let else_if = after_else && child.first_token().is_some_and(|t| t.text() == "if");
                usize::from(EMBEDDING.contains(&head) && !else_if)
            }
            _ => 0,
        }
    }

    fn token(&mut self, token: &Arc<Token>, ctx: Ctx<'_>) {
        let text = token.text();
        let is_directive = token.kind == TokenKind::Directive;
        let continuation = !self.fresh && !is_directive && !matches!(text, "{" | "}");
        let line_level = ctx.level + usize::from(continuation);
        let note_level = if text == "}" { ctx.level + 1 } else { line_level };

        let prev = self.prev.take();
        let mut breaks = std::mem::take(&mut self.pending);
        let mut had_space = false;
        let mut noted = false;
        let mut must_break = false;

        let trailing = prev.iter().flat_map(|p| p.trailing.iter());
        for item in trailing.chain(token.leading.iter()) {
            match item.kind() {
                TriviaKind::Whitespace => had_space = true,
                TriviaKind::LineBreak => breaks += 1,
                kind => {
                    let own_line = matches!(
                        kind,
                        TriviaKind::Directive | TriviaKind::RegionStart | TriviaKind::RegionEnd
                    );
                    if (breaks > 0 || own_line) && !self.out.is_empty() && !self.at_line_start() {
                        self.newline(breaks);
                        self.indent(note_level);
                    } else if self.at_line_start() {
                        if breaks > 1 && !self.out.is_empty() {
                            self.newline(breaks - 1);
                        }
                        self.indent(note_level);
                    } else if !self.out.ends_with(' ') {
                        self.out.push(' ');
                    }
                    self.out.push_str(item.text());
                    breaks = 0;
                    had_space = false;
                    noted = true;
                    must_break = item.ends_line();
                }
            }
        }

        // The line break closing a directive condition is layout, not text.
        if is_directive && !text.starts_with('#') {
            self.pending = 1;
            self.fresh = true;
            self.prev = Some(Arc::clone(token));
            self.prev_parent = ctx.parent.kind();
            return;
        }

        if must_break {
            breaks = breaks.max(1);
        }
        if breaks > 0 && !noted && self.joins(prev.as_deref(), token, ctx) {
            breaks = 0;
        }
        if breaks == 0 && self.starts_line(prev.as_deref(), token) {
            breaks = 1;
        }
        self.force_line = false;

        if breaks > 0 && !self.out.is_empty() {
            if !self.at_line_start() {
                self.newline(breaks);
            } else if breaks > 1 {
                self.newline(breaks - 1);
            }
            self.indent(line_level);
        } else if self.at_line_start() {
            self.indent(line_level);
        } else if noted {
            if !self.out.ends_with(' ') {
                self.out.push(' ');
            }
        } else if let Some(p) = prev.as_deref() {
            if self.space_between(p, token, ctx, had_space) {
                self.out.push(' ');
            }
        }

        if self.close_brace.is_some_and(|c| Arc::ptr_eq(c, token)) {
            self.end = Some(self.out.len());
        }
        self.out.push_str(text);
        if self.open_brace.is_some_and(|o| Arc::ptr_eq(o, token)) {
            self.start = Some(self.out.len());
        }

        match text {
            "{" => self.open.push(false),
            "}" => {
                self.open.pop();
            }
            _ => {}
        }
        self.fresh = matches!(text, ";" | "{" | "}");
        self.prev = Some(Arc::clone(token));
        self.prev_parent = ctx.parent.kind();
    }

    /// Whether a line break in the source before `token` is dropped.
    fn joins(&self, prev: Option<&Token>, token: &Token, ctx: Ctx<'_>) -> bool {
        let Some(prev) = prev else {
            return false;
        };
        if prev.kind == TokenKind::Directive {
            return false;
        }
        match token.text() {
            "{" => !matches!(prev.text(), ";" | "{" | "}" | ":"),
            "else" | "catch" | "finally" => prev.text() == "}",
            "while" => {
                prev.text() == "}" && ctx.parent.first_token().is_some_and(|t| t.text() == "do")
            }
            _ => false,
        }
    }

    /// Whether `token` goes on a new line even though the source had none.
    fn starts_line(&self, prev: Option<&Token>, token: &Token) -> bool {
        if prev.is_none() {
            return false;
        }
        if token.kind == TokenKind::Directive || self.force_line {
            return true;
        }
        token.text() == "}" && self.open.last() == Some(&true)
    }

    /// Whether `child` of `parent` is a statement or member that must not
    /// share a line with the one before it.
    fn breaks_before(&self, parent: &Node, child: &Node) -> bool {
        let kind = child.kind();
        if !(kind.is_statement() || kind.is_declaration()) {
            return false;
        }
        let after: &[&str] = match parent.kind() {
            SyntaxKind::Block | SyntaxKind::DeclarationList => &[";", "{", "}"],
            SyntaxKind::SwitchSection => &[";", "{", "}", ":"],
            _ => return false,
        };
        self.prev.as_ref().is_some_and(|p| after.contains(&p.text()))
    }

    fn space_between(&self, prev: &Token, token: &Token, ctx: Ctx<'_>, had_space: bool) -> bool {
        let (p, c) = (prev.text(), token.text());
        let options = self.options;

        if let (Some(a), Some(b)) = (p.chars().last(), c.chars().next()) {
            if would_fuse(a, b) {
                return true;
            }
        }
        let base_colon = |kind: SyntaxKind| {
            matches!(kind, SyntaxKind::BaseList | SyntaxKind::ConstructorInitializer)
        };
        if (c == ":" && base_colon(ctx.parent.kind())) || (p == ":" && base_colon(self.prev_parent)) {
            return options.space_around_base_colon;
        }

        match (p, c) {
            ("{", "}") => had_space,
            ("(", ")") | ("[", "]") => false,
            (_, "," | ";" | "." | "?." | "]") | ("." | "?." | "[", _) => false,
            ("(", _) | (_, ")") => options.space_within_parens,
            (",", _) => options.space_after_comma,
            (";", _) => true,
            (_, "(") => self.paren_space(prev, had_space),
            (_, "{") | ("{", _) | (_, "}") => true,
            _ if SPACED_OPERATORS.contains(&p) || SPACED_OPERATORS.contains(&c) => true,
            _ => had_space,
        }
    }

    fn paren_space(&self, prev: &Token, had_space: bool) -> bool {
        let p = prev.text();
        match prev.kind {
            TokenKind::Keyword if CONTROL_KEYWORDS.contains(&p) => {
                self.options.space_after_control_keyword
            }
            TokenKind::Keyword if CALL_KEYWORDS.contains(&p) => false,
            TokenKind::Keyword => true,
            TokenKind::Identifier => self.options.space_before_call_paren,
            _ if SPACED_OPERATORS.contains(&p) => true,
            _ => had_space,
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn newline(&mut self, count: usize) {
        while self.out.ends_with(' ') || self.out.ends_with('\t') {
            self.out.pop();
        }
        let count = count.clamp(1, self.options.max_blank_lines + 1);
        for _ in 0..count {
            self.out.push('\n');
        }
        self.open.iter_mut().for_each(|multiline| *multiline = true);
    }

    fn indent(&mut self, level: usize) {
        let width = level * self.options.indent_size;
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    /// Comments after the last token.
    fn finish(&mut self) {
        if let Some(prev) = self.prev.take() {
            let mut breaks = 0;
            for item in prev.trailing.iter() {
                match item.kind() {
                    TriviaKind::Whitespace => {}
                    TriviaKind::LineBreak => breaks += 1,
                    _ => {
                        if breaks > 0 {
                            self.newline(breaks);
                        } else if !self.at_line_start() {
                            self.out.push(' ');
                        }
                        self.out.push_str(item.text());
                        breaks = 0;
                    }
                }
            }
        }
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
    }
}
