//! Default accessibility removal.
//!
//! `private` is the default for members of classes, structs and records;
//! `internal` is the default for type declarations. Both are dropped where they
//! restate the default. `private protected` and `protected internal` are
//! distinct accessibilities and stay as written, as does `private` on
//! interface members.

use std::sync::Arc;

use super::Rewrite;
use crate::syntax::{Element, Node, SyntaxKind, Token, TokenKind};

pub struct StripRedundantModifiers;

/// Kind of the closest enclosing type declaration.
fn containing_type(ancestors: &[Arc<Node>]) -> Option<SyntaxKind> {
    ancestors
        .iter()
        .rev()
        .map(|a| a.kind())
        .find(|k| k.is_type_declaration())
}

fn is_redundant(modifier: &Token, node: &Node, ancestors: &[Arc<Node>]) -> bool {
    if node.has_modifier("protected") {
        return false;
    }
    match modifier.text() {
        "private" => matches!(
            containing_type(ancestors),
            Some(SyntaxKind::Class | SyntaxKind::Struct | SyntaxKind::Record)
        ),
        "internal" => node.kind().is_type_declaration(),
        _ => false,
    }
}

impl Rewrite for StripRedundantModifiers {
    fn node(&self, node: Arc<Node>, ancestors: &[Arc<Node>]) -> Option<Arc<Node>> {
        if !node.kind().is_declaration() {
            return Some(node);
        }

        let mut children: Vec<Element> = Vec::with_capacity(node.children().len());
        // Layout in front of a removed modifier moves to whatever follows it.
        let mut carried = None;
        for child in node.children() {
            if let Element::Token(t) = child {
                if t.kind == TokenKind::Modifier && is_redundant(t, &node, ancestors) {
                    carried.get_or_insert_with(|| t.leading.clone());
                    continue;
                }
            }
            match carried.take() {
                Some(leading) => children.push(match child {
                    Element::Token(t) => Element::from(t.with_leading(leading)),
                    Element::Node(n) => Element::from(n.with_leading_trivia(leading)),
                }),
                None => children.push(child.clone()),
            }
        }

        if children.len() == node.children().len() {
            Some(node)
        } else {
            Some(Arc::new(node.with_children(children)))
        }
    }
}
