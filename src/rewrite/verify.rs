//! Structural checks run after every pass.
//!
//! These catch rewrites that would render to text the C# parser reads
//! differently from the tree: fused words, comments that swallow code,
//! directives that no longer start a line, unbalanced delimiters.

use crate::syntax::{Node, Token, TokenKind, Trivia, TriviaKind};

/// Whether two characters written back to back would lex as one token.
pub(crate) fn would_fuse(prev: char, next: char) -> bool {
    let word = |c: char| c.is_alphanumeric() || c == '_' || c == '@';
    (word(prev) && word(next))
        || matches!(
            (prev, next),
            ('+', '+') | ('-', '-') | ('&', '&') | ('|', '|') | ('/', '/') | ('/', '*')
        )
}

/// Verify the invariants every pass must keep on the merged declaration.
pub fn check_structure(root: &Node) -> Result<(), String> {
    if !root.kind().is_type_declaration() {
        return Err(format!("root is {:?}, not a type declaration", root.kind()));
    }
    if root.name().is_none() {
        return Err("root declaration lost its name".to_string());
    }
    if root.body().is_none() {
        return Err("root declaration lost its body".to_string());
    }

    for node in root.descendants() {
        if node.children().is_empty() {
            return Err(format!("empty {:?} node", node.kind()));
        }
        if node.kind().requires_name() && node.name().is_none() {
            return Err(format!("{:?} declaration lost its name", node.kind()));
        }
    }

    check_delimiters(root)?;
    check_layout(root)
}

fn check_delimiters(root: &Node) -> Result<(), String> {
    let mut open = Vec::new();
    for token in root.tokens() {
        match token.text() {
            "{" | "(" | "[" => open.push(token.text()),
            "}" | ")" | "]" => {
                let expected = match token.text() {
                    "}" => "{",
                    ")" => "(",
                    _ => "[",
                };
                if open.pop() != Some(expected) {
                    return Err(format!("unbalanced `{}`", token.text()));
                }
            }
            "" => return Err("empty token".to_string()),
            _ => {}
        }
    }
    match open.last() {
        Some(unclosed) => Err(format!("unclosed `{unclosed}`")),
        None => Ok(()),
    }
}

/// Line and spacing rules over the rendered sequence of trivia and tokens.
#[derive(Default)]
struct Layout {
    last: Option<char>,
    /// Only whitespace since the last line break.
    line_blank: bool,
    /// A line-ending item was written and no line break followed yet.
    need_break: bool,
    /// Nothing was written since the last token.
    adjacent: bool,
}

impl Layout {
    fn trivia(&mut self, item: &Trivia) -> Result<(), String> {
        if self.need_break && item.kind() != TriviaKind::LineBreak {
            return Err(format!("`{}` follows a line-ending item on the same line", item.text()));
        }
        let directive = matches!(
            item.kind(),
            TriviaKind::Directive | TriviaKind::RegionStart | TriviaKind::RegionEnd
        );
        if directive && !self.line_blank {
            return Err(format!("directive `{}` does not start a line", item.text()));
        }
        self.write(item.text());
        if item.ends_line() {
            self.need_break = true;
        }
        self.adjacent = false;
        Ok(())
    }

    fn token(&mut self, token: &Token) -> Result<(), String> {
        for item in &token.leading {
            self.trivia(item)?;
        }

        if self.need_break && token.kind != TokenKind::Directive {
            return Err(format!("`{}` is swallowed by a line-ending item", token.text()));
        }
        if token.text().starts_with('#') && !self.line_blank {
            return Err(format!("directive `{}` does not start a line", token.text()));
        }
        if let (true, Some(prev), Some(next)) = (self.adjacent, self.last, token.text().chars().next()) {
            if would_fuse(prev, next) {
                return Err(format!("`{}` fuses with the previous token", token.text()));
            }
        }
        self.write(token.text());
        self.adjacent = true;

        for item in &token.trailing {
            self.trivia(item)?;
        }
        Ok(())
    }

    fn write(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' | '\r' => {
                    self.line_blank = true;
                    self.need_break = false;
                }
                c if c.is_whitespace() => {}
                _ => self.line_blank = false,
            }
            self.last = Some(c);
        }
    }
}

fn check_layout(root: &Node) -> Result<(), String> {
    let mut layout = Layout {
        line_blank: true,
        ..Default::default()
    };
    for token in root.tokens() {
        layout.token(token)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rewrite::tests::merged;
    use crate::syntax::{Element, SyntaxKind, TriviaList};

    #[test]
    fn test_parsed_tree_is_consistent() {
        let root = merged(
            "class Program : MyGridProgram\n{\n    #region A\n    int x; // c\n    #endregion\n#if DEBUG\n    void M() { }\n#endif\n}\n",
        );
        assert_eq!(check_structure(&root), Ok(()));
    }

    #[test]
    fn test_detects_swallowed_token() {
        let root = merged("class Program : MyGridProgram { int x; // c\n}");
        // Drop every line break: the comment now swallows the closing brace.
        let flattened = crate::rewrite::rewrite(&root, &DropLineBreaks).unwrap();
        assert!(check_structure(&flattened).is_err());
    }

    #[test]
    fn test_detects_fused_words() {
        let root = merged("class Program : MyGridProgram { int x; }");
        let fused = crate::rewrite::rewrite(&root, &DropAll).unwrap();
        let err = check_structure(&fused).unwrap_err();
        assert!(err.contains("fuses"), "{err}");
    }

    #[test]
    fn test_detects_lost_body() {
        let root = merged("class Program : MyGridProgram { }");
        let index = root.body_index().unwrap();
        let bodiless = Arc::new(root.remove_child(index));
        assert!(check_structure(&bodiless).is_err());
    }

    #[test]
    fn test_would_fuse() {
        assert!(would_fuse('e', 'r'));
        assert!(would_fuse('+', '+'));
        assert!(would_fuse('/', '*'));
        assert!(!would_fuse(';', 'r'));
        assert!(!would_fuse('>', '>'));
    }

    #[test]
    fn test_unbalanced_delimiters() {
        let node = Node::new(
            SyntaxKind::Other,
            vec![Element::from(Token::new(TokenKind::Punctuation, "{"))],
        );
        assert!(check_delimiters(&node).is_err());
    }

    struct DropLineBreaks;

    impl crate::rewrite::Rewrite for DropLineBreaks {
        fn token(&self, token: Arc<Token>, _: &[Arc<Node>]) -> Arc<Token> {
            let keep = |list: &TriviaList| -> TriviaList {
                list.iter()
                    .filter(|t| t.kind() != TriviaKind::LineBreak)
                    .cloned()
                    .collect()
            };
            Arc::new(token.with_leading(keep(&token.leading)).with_trailing(keep(&token.trailing)))
        }
    }

    struct DropAll;

    impl crate::rewrite::Rewrite for DropAll {
        fn token(&self, token: Arc<Token>, _: &[Arc<Node>]) -> Arc<Token> {
            Arc::new(
                token
                    .with_leading(TriviaList::new())
                    .with_trailing(TriviaList::new()),
            )
        }
    }
}
