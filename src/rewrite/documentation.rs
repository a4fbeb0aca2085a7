use std::sync::Arc;

use super::Rewrite;
use crate::syntax::trivia::remove_line_items;
use crate::syntax::{Node, Token, TriviaKind, TriviaList};

/// Removes `///` and `/** */` documentation together with the indentation and
/// line break that only held it.
pub struct StripDocumentation;

fn strip(list: &TriviaList) -> Option<TriviaList> {
    if !list.iter().any(|t| t.kind() == TriviaKind::DocComment) {
        return None;
    }
    Some(remove_line_items(list, |t| t.kind() == TriviaKind::DocComment))
}

impl Rewrite for StripDocumentation {
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
