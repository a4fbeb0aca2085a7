//! Trivia: the non-semantic text attached to token edges.
//!
//! The C# grammar reports comments and directives as "extras" floating between
//! tokens. Here the text between two tokens is re-lexed into an ordered list of
//! trivia and split between the two neighbours: the previous token keeps
//! everything up to and including the first line break as trailing trivia, the
//! next token receives the rest as leading trivia.

use std::fmt;

use compact_str::CompactString;
use smallvec::SmallVec;

/// Ordered trivia around one edge of a token.
pub type TriviaList = SmallVec<[Trivia; 2]>;

/// Kind of a trivia item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    /// A run of horizontal whitespace.
    Whitespace,
    /// `\n`, `\r\n` or `\r`.
    LineBreak,
    /// `// ...` up to the end of the line.
    SingleLineComment,
    /// `/* ... */`.
    MultiLineComment,
    /// `/// ...` or `/** ... */` in leading position.
    DocComment,
    /// `#region ...`
    RegionStart,
    /// `#endregion ...`
    RegionEnd,
    /// Any other preprocessor line (`#pragma`, `#define`, ...).
    Directive,
    /// Text the lexer could not classify; rendered verbatim.
    Skipped,
}

impl TriviaKind {
    /// Comment kinds, documentation included.
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TriviaKind::SingleLineComment | TriviaKind::MultiLineComment | TriviaKind::DocComment
        )
    }

    /// Whitespace or line break.
    pub fn is_blank(self) -> bool {
        matches!(self, TriviaKind::Whitespace | TriviaKind::LineBreak)
    }
}

/// One trivia item with its literal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    kind: TriviaKind,
    text: CompactString,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<CompactString>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// A whitespace run.
    pub fn whitespace(text: impl Into<CompactString>) -> Self {
        Self::new(TriviaKind::Whitespace, text)
    }

    /// A single space.
    pub fn space() -> Self {
        Self::whitespace(" ")
    }

    /// A `\n` line break.
    pub fn line_break() -> Self {
        Self::new(TriviaKind::LineBreak, "\n")
    }

    pub fn kind(&self) -> TriviaKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the item must be followed by a line break before any code.
    ///
    /// Single-line comments run to the end of the line and directives must
    /// occupy a line of their own.
    pub fn ends_line(&self) -> bool {
        match self.kind {
            TriviaKind::SingleLineComment
            | TriviaKind::RegionStart
            | TriviaKind::RegionEnd
            | TriviaKind::Directive => true,
            TriviaKind::DocComment => self.text.starts_with("///"),
            _ => false,
        }
    }
}

impl fmt::Display for Trivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lex the text between two tokens into trivia.
///
/// Never fails: text that matches no trivia form is kept as
/// [`TriviaKind::Skipped`] so rendering stays lossless.
pub fn lex_trivia(text: &str) -> TriviaList {
    let mut out = TriviaList::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let (kind, len) = match c {
            '\r' if rest.starts_with("\r\n") => (TriviaKind::LineBreak, 2),
            '\n' | '\r' => (TriviaKind::LineBreak, 1),
            c if is_horizontal_space(c) => {
                let len = rest
                    .char_indices()
                    .find(|&(_, c)| !is_horizontal_space(c))
                    .map_or(rest.len(), |(i, _)| i);
                (TriviaKind::Whitespace, len)
            }
            '/' if rest.starts_with("///") && !rest.starts_with("////") => {
                (TriviaKind::DocComment, line_len(rest))
            }
            '/' if rest.starts_with("//") => (TriviaKind::SingleLineComment, line_len(rest)),
            '/' if rest.starts_with("/**") && !rest.starts_with("/**/") => {
                (TriviaKind::DocComment, block_comment_len(rest))
            }
            '/' if rest.starts_with("/*") => (TriviaKind::MultiLineComment, block_comment_len(rest)),
            '#' => {
                let len = line_len(rest);
                (directive_kind(&rest[..len]), len)
            }
            _ => {
                let len = rest
                    .char_indices()
                    .skip(1)
                    .find(|&(_, c)| c.is_whitespace() || c == '/' || c == '#')
                    .map_or(rest.len(), |(i, _)| i);
                (TriviaKind::Skipped, len)
            }
        };

        out.push(Trivia::new(kind, &rest[..len]));
        rest = &rest[len..];
    }

    out
}

/// Split the gap between two tokens into (trailing of previous, leading of next).
///
/// When there is no previous token the whole gap is leading trivia. Doc
/// comments that end up trailing code on the same line are plain comments.
pub fn split_gap(gap: &str, has_previous: bool) -> (TriviaList, TriviaList) {
    let items = lex_trivia(gap);
    if !has_previous {
        return (TriviaList::new(), items);
    }

    let cut = items
        .iter()
        .position(|t| t.kind == TriviaKind::LineBreak)
        .map_or(items.len(), |i| i + 1);

    let mut trailing: TriviaList = items[..cut].iter().cloned().collect();
    for item in trailing.iter_mut() {
        if item.kind == TriviaKind::DocComment {
            item.kind = if item.text.starts_with("///") {
                TriviaKind::SingleLineComment
            } else {
                TriviaKind::MultiLineComment
            };
        }
    }
    let leading = items[cut..].iter().cloned().collect();
    (trailing, leading)
}

/// Remove every item matching `pred`, together with the layout that only
/// existed to hold it: the indentation in front of it and the line break
/// that terminates it.
pub fn remove_line_items(list: &TriviaList, pred: impl Fn(&Trivia) -> bool) -> TriviaList {
    let mut out = TriviaList::new();
    let mut skip_break = false;

    for item in list {
        if pred(item) {
            let own_line = match out.last() {
                None => true,
                Some(t) if t.kind == TriviaKind::LineBreak => true,
                Some(t) if t.kind == TriviaKind::Whitespace => {
                    out.len() == 1 || out[out.len() - 2].kind == TriviaKind::LineBreak
                }
                Some(_) => false,
            };
            if own_line && out.last().is_some_and(|t| t.kind == TriviaKind::Whitespace) {
                out.pop();
            }
            skip_break = own_line;
            continue;
        }
        if skip_break && item.kind == TriviaKind::LineBreak {
            skip_break = false;
            continue;
        }
        skip_break = false;
        out.push(item.clone());
    }

    out
}

/// Render a trivia list to text.
pub fn trivia_text(list: &[Trivia]) -> String {
    list.iter().map(Trivia::text).collect()
}

fn is_horizontal_space(c: char) -> bool {
    c != '\n' && c != '\r' && (c.is_whitespace() || c == '\u{FEFF}')
}

fn line_len(text: &str) -> usize {
    text.find(['\r', '\n']).unwrap_or(text.len())
}

fn block_comment_len(text: &str) -> usize {
    text[2..].find("*/").map_or(text.len(), |i| i + 4)
}

fn directive_kind(line: &str) -> TriviaKind {
    let name = line[1..].trim_start();
    if name.starts_with("endregion") {
        TriviaKind::RegionEnd
    } else if name.starts_with("region") {
        TriviaKind::RegionStart
    } else {
        TriviaKind::Directive
    }
}
