use std::sync::Arc;

use super::Rewrite;
use crate::syntax::{Node, Token, TriviaKind, TriviaList};

/// Removes `//` and `/* */` comments. Documentation comments are left alone.
pub struct StripComments;

fn is_plain_comment(kind: TriviaKind) -> bool {
    matches!(
        kind,
        TriviaKind::SingleLineComment | TriviaKind::MultiLineComment
    )
}

fn strip(list: &TriviaList) -> Option<TriviaList> {
    if !list.iter().any(|t| is_plain_comment(t.kind())) {
        return None;
    }
    Some(
        list.iter()
            .filter(|t| !is_plain_comment(t.kind()))
            .cloned()
            .collect(),
    )
}

impl Rewrite for StripComments {
    fn token(&self, token: Arc<Token>, _: &[Arc<Node>]) -> Arc<Token> {
        match (strip(&token.leading), strip(&token.trailing)) {
            (None, None) => token,
            (leading, trailing) => Arc::new(Token {
                leading: leading.unwrap_or_else(|| token.leading.clone()),
                trailing: trailing.unwrap_or_else(|| token.trailing.clone()),
                ..(*token).clone()
            }),
        }
    }
}
