//! Immutable syntax tree with trivia attached to tokens.
//!
//! Nodes and tokens are shared through [`Arc`]; every edit produces a new node
//! that reuses the untouched subtrees of the old one. Rendering a node writes
//! each token's leading trivia, text and trailing trivia in document order, so
//! an unmodified tree renders back to its exact source text.

pub mod kind;
pub mod trivia;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use compact_str::CompactString;

pub use kind::{SyntaxKind, TokenKind};
pub use trivia::{Trivia, TriviaKind, TriviaList};

/// What a token stands for inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenRole {
    /// The token names its parent (declaration, parameter, member access).
    Name,
    #[default]
    Plain,
}

/// A terminal with its surrounding trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: CompactString,
    pub leading: TriviaList,
    pub trailing: TriviaList,
    pub role: TokenRole,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<CompactString>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading: TriviaList::new(),
            trailing: TriviaList::new(),
            role: TokenRole::Plain,
        }
    }

    /// Mark the token as the name of its parent.
    pub fn named(mut self) -> Self {
        self.role = TokenRole::Name;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_name(&self) -> bool {
        self.role == TokenRole::Name
    }

    /// Copy of the token with different leading trivia.
    pub fn with_leading(&self, leading: TriviaList) -> Self {
        Self {
            leading,
            ..self.clone()
        }
    }

    /// Copy of the token with different trailing trivia.
    pub fn with_trailing(&self, trailing: TriviaList) -> Self {
        Self {
            trailing,
            ..self.clone()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.leading {
            f.write_str(t.text())?;
        }
        f.write_str(&self.text)?;
        for t in &self.trailing {
            f.write_str(t.text())?;
        }
        Ok(())
    }
}

/// A child slot: either a nested node or a token.
#[derive(Debug, Clone)]
pub enum Element {
    Node(Arc<Node>),
    Token(Arc<Token>),
}

impl Element {
    pub fn as_node(&self) -> Option<&Arc<Node>> {
        match self {
            Element::Node(n) => Some(n),
            Element::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Arc<Token>> {
        match self {
            Element::Token(t) => Some(t),
            Element::Node(_) => None,
        }
    }

    pub fn first_token(&self) -> Option<&Arc<Token>> {
        match self {
            Element::Token(t) => Some(t),
            Element::Node(n) => n.first_token(),
        }
    }

    pub fn last_token(&self) -> Option<&Arc<Token>> {
        match self {
            Element::Token(t) => Some(t),
            Element::Node(n) => n.last_token(),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Node(n) => n.fmt(f),
            Element::Token(t) => t.fmt(f),
        }
    }
}

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Element::Node(Arc::new(node))
    }
}

impl From<Token> for Element {
    fn from(token: Token) -> Self {
        Element::Token(Arc::new(token))
    }
}

/// A non-terminal.
#[derive(Debug, Clone)]
pub struct Node {
    kind: SyntaxKind,
    children: Vec<Element>,
}

impl Node {
    pub fn new(kind: SyntaxKind, children: Vec<Element>) -> Self {
        Self { kind, children }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Direct child nodes, skipping tokens.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.children.iter().filter_map(Element::as_node)
    }

    /// Direct child tokens, skipping nodes.
    pub fn child_tokens(&self) -> impl Iterator<Item = &Arc<Token>> {
        self.children.iter().filter_map(Element::as_token)
    }

    /// All tokens of the subtree in document order.
    pub fn tokens(&self) -> Tokens<'_> {
        Tokens {
            stack: vec![self.children.iter()],
        }
    }

    /// The node itself followed by every nested node, in preorder.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            pending: Some(self),
            stack: Vec::new(),
        }
    }

    pub fn first_token(&self) -> Option<&Arc<Token>> {
        self.children.iter().find_map(Element::first_token)
    }

    pub fn last_token(&self) -> Option<&Arc<Token>> {
        self.children.iter().rev().find_map(Element::last_token)
    }

    /// Declared name.
    ///
    /// Fields and event fields are named by their first declarator.
    pub fn name(&self) -> Option<&Arc<Token>> {
        if let Some(name) = self.child_tokens().find(|t| t.is_name()) {
            return Some(name);
        }
        if matches!(self.kind, SyntaxKind::Field | SyntaxKind::EventField) {
            return self
                .descendants()
                .find(|n| n.kind == SyntaxKind::VariableDeclarator)
                .and_then(|d| d.child_tokens().find(|t| t.is_name()));
        }
        None
    }

    /// Declaration modifiers, in source order.
    pub fn modifiers(&self) -> impl Iterator<Item = &Arc<Token>> {
        self.child_tokens().filter(|t| t.kind == TokenKind::Modifier)
    }

    pub fn has_modifier(&self, text: &str) -> bool {
        self.modifiers().any(|m| m.text() == text)
    }

    pub fn base_list(&self) -> Option<&Arc<Node>> {
        self.child_nodes().find(|n| n.kind == SyntaxKind::BaseList)
    }

    /// Index of the braced member list of a type declaration.
    pub fn body_index(&self) -> Option<usize> {
        self.children.iter().position(|c| {
            c.as_node().is_some_and(|n| {
                matches!(n.kind, SyntaxKind::DeclarationList | SyntaxKind::EnumMemberList)
            })
        })
    }

    pub fn body(&self) -> Option<&Arc<Node>> {
        self.body_index()
            .and_then(|i| self.children[i].as_node())
    }

    /// Member nodes inside the body.
    pub fn members(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.body().into_iter().flat_map(|b| b.child_nodes())
    }

    /// Copy of the node with a new child list.
    pub fn with_children(&self, children: Vec<Element>) -> Self {
        Self {
            kind: self.kind,
            children,
        }
    }

    /// Panics if `index` is out of bounds, like slice indexing.
    pub fn replace_child(&self, index: usize, element: Element) -> Self {
        let mut children = self.children.clone();
        children[index] = element;
        self.with_children(children)
    }

    /// Panics if `index` is out of bounds.
    pub fn remove_child(&self, index: usize) -> Self {
        let mut children = self.children.clone();
        children.remove(index);
        self.with_children(children)
    }

    /// Copy of the node whose first token carries `leading`.
    pub fn with_leading_trivia(&self, leading: TriviaList) -> Self {
        self.map_edge(true, &mut |t: &Token| t.with_leading(leading.clone()))
    }

    /// Copy of the node whose last token carries `trailing`.
    pub fn with_trailing_trivia(&self, trailing: TriviaList) -> Self {
        self.map_edge(false, &mut |t: &Token| t.with_trailing(trailing.clone()))
    }

    fn map_edge(&self, first: bool, f: &mut dyn FnMut(&Token) -> Token) -> Self {
        let index = if first {
            self.children.iter().position(|c| c.first_token().is_some())
        } else {
            self.children.iter().rposition(|c| c.last_token().is_some())
        };
        let Some(index) = index else {
            return self.clone();
        };
        let element = match &self.children[index] {
            Element::Token(t) => Element::Token(Arc::new(f(t))),
            Element::Node(n) => Element::Node(Arc::new(n.map_edge(first, f))),
        };
        self.replace_child(index, element)
    }

    /// Copy of a type declaration with `members` appended to its body, in
    /// order, in front of the closing brace.
    ///
    /// Returns `None` when the node has no body.
    pub fn add_members(&self, members: impl IntoIterator<Item = Arc<Node>>) -> Option<Self> {
        let index = self.body_index()?;
        let body = self.children[index].as_node()?;

        let mut children = body.children.clone();
        let close = match children.last() {
            Some(Element::Token(t)) if t.text() == "}" => children.len() - 1,
            _ => children.len(),
        };
        let tail = children.split_off(close);
        children.extend(members.into_iter().map(Element::Node));
        children.extend(tail);

        Some(self.replace_child(index, Element::Node(Arc::new(body.with_children(children)))))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.tokens() {
            token.fmt(f)?;
        }
        Ok(())
    }
}

/// Iterator over the tokens of a subtree.
pub struct Tokens<'a> {
    stack: Vec<std::slice::Iter<'a, Element>>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a Arc<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Element::Token(t)) => return Some(t),
                Some(Element::Node(n)) => self.stack.push(n.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Preorder iterator over a node and its nested nodes.
pub struct Descendants<'a> {
    pending: Option<&'a Node>,
    stack: Vec<std::slice::Iter<'a, Element>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(node) = self.pending.take() {
            self.stack.push(node.children.iter());
            return Some(node);
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Element::Node(n)) => {
                    self.stack.push(n.children.iter());
                    return Some(n);
                }
                Some(Element::Token(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub path: PathBuf,
    pub root: Arc<Node>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::trivia::lex_trivia;

    fn same(a: &Element, b: &Element) -> bool {
        match (a, b) {
            (Element::Node(a), Element::Node(b)) => Arc::ptr_eq(a, b),
            (Element::Token(a), Element::Token(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn tok(kind: TokenKind, text: &str, leading: &str, trailing: &str) -> Element {
        let mut t = Token::new(kind, text);
        t.leading = lex_trivia(leading);
        t.trailing = lex_trivia(trailing);
        t.into()
    }

    fn name(text: &str, trailing: &str) -> Element {
        let mut t = Token::new(TokenKind::Identifier, text).named();
        t.trailing = lex_trivia(trailing);
        t.into()
    }

    /// `// c\nclass Foo { }` built by hand.
    fn class_foo() -> Node {
        let body = Node::new(
            SyntaxKind::DeclarationList,
            vec![
                tok(TokenKind::Punctuation, "{", "", " "),
                tok(TokenKind::Punctuation, "}", "", ""),
            ],
        );
        Node::new(
            SyntaxKind::Class,
            vec![
                tok(TokenKind::Keyword, "class", "// c\n", " "),
                name("Foo", " "),
                body.into(),
            ],
        )
    }

    fn field_x() -> Node {
        let declarator = Node::new(SyntaxKind::VariableDeclarator, vec![name("x", "")]);
        let declaration = Node::new(
            SyntaxKind::Other,
            vec![tok(TokenKind::Keyword, "int", "", " "), declarator.into()],
        );
        Node::new(
            SyntaxKind::Field,
            vec![
                tok(TokenKind::Modifier, "private", "", " "),
                declaration.into(),
                tok(TokenKind::Punctuation, ";", "", ""),
            ],
        )
    }

    #[test]
    fn test_display_is_lossless() {
        assert_eq!(class_foo().to_string(), "// c\nclass Foo { }");
    }

    #[test]
    fn test_tokens_in_order() {
        let node = class_foo();
        let texts: Vec<&str> = node.tokens().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["class", "Foo", "{", "}"]);
    }

    #[test]
    fn test_declaration_accessors() {
        let class = class_foo();
        assert_eq!(class.name().map(|t| t.text()), Some("Foo"));
        assert!(class.body().is_some());
        assert!(class.base_list().is_none());

        let field = field_x();
        assert_eq!(field.name().map(|t| t.text()), Some("x"));
        assert!(field.has_modifier("private"));
        assert!(!field.has_modifier("static"));
    }

    #[test]
    fn test_add_members_before_closing_brace() {
        let class = class_foo();
        let merged = class.add_members([Arc::new(field_x())]).unwrap();
        assert_eq!(merged.to_string(), "// c\nclass Foo { private int x;}");
        assert_eq!(merged.members().count(), 1);
        // The input class is untouched.
        assert_eq!(class.to_string(), "// c\nclass Foo { }");
    }

    #[test]
    fn test_edge_trivia() {
        let class = class_foo();
        let bare = class.with_leading_trivia(TriviaList::new());
        assert_eq!(bare.to_string(), "class Foo { }");
        let spaced = bare.with_trailing_trivia(lex_trivia("\n"));
        assert_eq!(spaced.to_string(), "class Foo { }\n");
    }

    #[test]
    fn test_edits_share_untouched_children() {
        let class = class_foo();
        let edited = class.with_leading_trivia(TriviaList::new());
        assert!(same(&class.children()[2], &edited.children()[2]));
        assert!(!same(&class.children()[0], &edited.children()[0]));
    }

    #[test]
    fn test_descendants_preorder() {
        let field = field_x();
        let kinds: Vec<SyntaxKind> = field.descendants().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![SyntaxKind::Field, SyntaxKind::Other, SyntaxKind::VariableDeclarator]
        );
    }
}
