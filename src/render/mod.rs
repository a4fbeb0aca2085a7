//! Text output for the merged entry declaration.
//!
//! The script is the body of the entry declaration without its braces.
//! Unless the whitespace was already compressed, the declaration is first laid
//! out in the canonical style and the body is then shifted left so that its
//! least indented line starts at column 0.

mod format;

use std::sync::Arc;

use thiserror::Error;

use crate::syntax::{Node, Token};

pub use format::{format, FormatOptions, Formatted};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("the entry declaration has no body")]
    NoBody,

    #[error("invalid format options: {0}")]
    InvalidOptions(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Lay out the declaration and de-indent the body. Off for minified
    /// output.
    pub reformat: bool,
    pub format: FormatOptions,
}

/// Render the script text of `root`.
pub fn render(root: &Node, options: &RenderOptions) -> Result<String, RenderError> {
    if !options.reformat {
        return Ok(render_body(root)?.trim().to_string());
    }

    options.format.validate()?;
    let formatted = format(root, &options.format);
    let body = formatted.body().ok_or(RenderError::NoBody)?;
    Ok(unindent(trim_blank_lines(body), options.format.tab_width))
}

/// The text between the braces of the declaration body, exactly as the tree
/// renders it.
pub fn render_body(root: &Node) -> Result<String, RenderError> {
    let body = root.body().ok_or(RenderError::NoBody)?;
    let (Some(open), Some(close)) = (body.first_token(), body.last_token()) else {
        return Err(RenderError::NoBody);
    };
    let is = |a: &Arc<Token>, b: &Arc<Token>| Arc::ptr_eq(a, b);

    let mut text = String::new();
    let (mut start, mut end) = (None, None);
    for token in root.tokens() {
        for t in &token.leading {
            text.push_str(t.text());
        }
        if is(token, close) {
            end = Some(text.len());
        }
        text.push_str(token.text());
        if is(token, open) {
            start = Some(text.len());
        }
        for t in &token.trailing {
            text.push_str(t.text());
        }
    }

    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(text[start..end].to_string()),
        _ => Err(RenderError::NoBody),
    }
}

/// Drop blank lines at the start and whitespace at the end.
fn trim_blank_lines(text: &str) -> &str {
    let first = text.find(|c: char| !c.is_whitespace()).unwrap_or(text.len());
    let line_start = text[..first].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..].trim_end()
}

/// Leading width of `line` in columns, with tabs counting `tab_width`.
fn indent_width(line: &str, tab_width: usize) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { tab_width } else { 1 })
        .sum()
}

/// Remove the indentation shared by every non-blank line.
///
/// Tabs in the indentation are expanded to `tab_width` spaces first. Blank
/// lines lose at most the shared width.
pub fn unindent(text: &str, tab_width: usize) -> String {
    let shared = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line, tab_width))
        .min()
        .unwrap_or(0);
    if shared == 0 {
        return text.to_string();
    }

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let rest = line.trim_start_matches([' ', '\t']);
            let width = indent_width(line, tab_width);
            let mut out = " ".repeat(width.saturating_sub(shared));
            out.push_str(rest);
            out
        })
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::tests::merged;

    #[test]
    fn test_unindent_round_trip() {
        let text = "    int a;\n    void M() {\n        a++;\n    }";
        let out = unindent(text, 4);
        assert_eq!(out, "int a;\nvoid M() {\n    a++;\n}");
        assert!(out.lines().any(|l| !l.starts_with(' ')));

        let restored: Vec<String> = out.split('\n').map(|l| format!("    {l}")).collect();
        assert_eq!(restored.join("\n"), text);
    }

    #[test]
    fn test_unindent_expands_tabs() {
        assert_eq!(unindent("\tfoo\n\t\tbar", 4), "foo\n    bar");
        assert_eq!(unindent("\tfoo\n      bar", 4), "foo\n  bar");
    }

    #[test]
    fn test_unindent_ignores_blank_lines() {
        assert_eq!(unindent("    a\n\n    b", 4), "a\n\nb");
        assert_eq!(unindent("a\n  b", 4), "a\n  b");
    }

    #[test]
    fn test_render_strips_outer_braces() {
        let root = merged("public class Program : MyGridProgram\n{\n    public void Main()\n    {\n        Echo(\"hi\");\n    }\n}");
        let out = render(
            &root,
            &RenderOptions {
                reformat: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out, "public void Main() {\n    Echo(\"hi\");\n}");
    }

    #[test]
    fn test_render_without_reformat_keeps_text() {
        let root = merged("class Program : MyGridProgram{int a;void M(){}\n}");
        let out = render(&root, &RenderOptions::default()).unwrap();
        assert_eq!(out, "int a;void M(){}");
    }

    #[test]
    fn test_render_body_of_empty_entry() {
        let root = merged("class Program : MyGridProgram { }");
        assert_eq!(render_body(&root).unwrap(), " ");
        let out = render(
            &root,
            &RenderOptions {
                reformat: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let root = merged("class Program : MyGridProgram { }");
        let options = RenderOptions {
            reformat: true,
            format: FormatOptions {
                tab_width: 0,
                ..Default::default()
            },
        };
        assert!(matches!(render(&root, &options), Err(RenderError::InvalidOptions(_))));
    }
}
