use std::sync::Arc;

use super::Rewrite;
use crate::syntax::trivia::remove_line_items;
use crate::syntax::{Node, Token, Trivia, TriviaKind, TriviaList};

/// Removes `#region` and `#endregion` lines at any depth.
pub struct RemoveRegions;

fn is_region(t: &Trivia) -> bool {
    matches!(t.kind(), TriviaKind::RegionStart | TriviaKind::RegionEnd)
}

fn strip(list: &TriviaList) -> Option<TriviaList> {
    list.iter()
        .any(is_region)
        .then(|| remove_line_items(list, is_region))
}

impl Rewrite for RemoveRegions {
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
