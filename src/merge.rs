//! Merging declarations into the entry declaration.

use std::sync::Arc;

use tracing::debug;

use crate::syntax::{Node, Trivia, TriviaKind};

/// Append every declaration except `entry` itself (and any namespace) to the
/// entry's member list, keeping encounter order.
///
/// `entry` must be one of `declarations` and must have a body; otherwise it is
/// returned unchanged.
pub fn merge(entry: &Arc<Node>, declarations: &[Arc<Node>]) -> Arc<Node> {
    let injected: Vec<Arc<Node>> = declarations
        .iter()
        .filter(|d| !Arc::ptr_eq(d, entry) && !d.kind().is_namespace())
        .map(close_last_line)
        .collect();
    let count = injected.len();

    match entry.add_members(injected) {
        Some(merged) => {
            debug!(injected = count, members = merged.members().count(), "merged");
            Arc::new(merged)
        }
        None => Arc::clone(entry),
    }
}

/// A declaration taken from the end of a file may finish with a line comment
/// that has no line break after it. Give it one before anything follows.
fn close_last_line(declaration: &Arc<Node>) -> Arc<Node> {
    let Some(last) = declaration.last_token() else {
        return Arc::clone(declaration);
    };
    let open = last.trailing.iter().rposition(Trivia::ends_line).is_some_and(|i| {
        !last.trailing[i + 1..]
            .iter()
            .any(|t| t.kind() == TriviaKind::LineBreak)
    });
    if !open {
        return Arc::clone(declaration);
    }

    let mut trailing = last.trailing.clone();
    trailing.push(Trivia::line_break());
    Arc::new(declaration.with_trailing_trivia(trailing))
}
