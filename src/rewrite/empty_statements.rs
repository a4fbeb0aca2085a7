use std::sync::Arc;

use super::Rewrite;
use crate::syntax::{Node, SyntaxKind};

/// Removes `;` statements from blocks and switch sections.
///
/// An empty statement that is the body of `if`, `while`, a label and the like
/// is required by the grammar and stays. A switch section keeps one statement.
pub struct RemoveEmptyStatements;

impl Rewrite for RemoveEmptyStatements {
    fn node(&self, node: Arc<Node>, ancestors: &[Arc<Node>]) -> Option<Arc<Node>> {
        if node.kind() != SyntaxKind::EmptyStatement {
            return Some(node);
        }
        let Some(parent) = ancestors.last() else {
            return Some(node);
        };

        match parent.kind() {
            SyntaxKind::Block => None,
            SyntaxKind::SwitchSection => {
                let statements: Vec<&Arc<Node>> = parent
                    .child_nodes()
                    .filter(|n| n.kind().is_statement())
                    .collect();
                let has_real = statements
                    .iter()
                    .any(|n| n.kind() != SyntaxKind::EmptyStatement);
                let is_last = statements.last().is_some_and(|n| Arc::ptr_eq(n, &node));
                if has_real || !is_last {
                    None
                } else {
                    Some(node)
                }
            }
            _ => Some(node),
        }
    }
}
