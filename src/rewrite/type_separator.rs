use std::sync::Arc;

use super::whitespace::directive_lines;
use super::Rewrite;
use crate::syntax::{Node, Trivia, TriviaList};

/// Puts a line break after every nested type declaration and clears the
/// trivia in front of it.
pub struct SeparateTypes;

impl Rewrite for SeparateTypes {
    fn node(&self, node: Arc<Node>, ancestors: &[Arc<Node>]) -> Option<Arc<Node>> {
        if ancestors.is_empty() || !node.kind().is_type_declaration() {
            return Some(node);
        }

        let leading = node
            .first_token()
            .map(|t| directive_lines(&t.leading))
            .unwrap_or_default();
        let mut trailing = TriviaList::new();
        trailing.push(Trivia::line_break());

        Some(Arc::new(
            node.with_leading_trivia(leading)
                .with_trailing_trivia(trailing),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::rewrite;
    use crate::rewrite::tests::merged;

    #[test]
    fn test_nested_types_end_their_line() {
        let source = "class Program : MyGridProgram {int a;  class A{}  struct B{} enum C{X} delegate void D();}";
        let out = rewrite(&merged(source), &SeparateTypes).unwrap();
        assert_eq!(
            out.to_string(),
            "class Program : MyGridProgram {int a;  class A{}\nstruct B{}\nenum C{X}\ndelegate void D();\n}"
        );
    }

    #[test]
    fn test_root_is_untouched() {
        let root = merged("// entry\nclass Program : MyGridProgram { }");
        let out = rewrite(&root, &SeparateTypes).unwrap();
        assert!(Arc::ptr_eq(&root, &out));
    }
}
