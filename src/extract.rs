//! Declaration extraction.
//!
//! Yields the file-scope declarations of a tree, looking through namespace
//! containers. Declarations nested in a type stay inside that type.

use std::sync::Arc;

use crate::syntax::{Element, Node, SyntaxKind, SyntaxTree};

/// Lazy iterator over the top-level declarations of one tree.
pub struct Declarations<'a> {
    stack: Vec<std::slice::Iter<'a, Element>>,
}

/// Top-level declarations of `tree`, in source order.
pub fn declarations(tree: &SyntaxTree) -> Declarations<'_> {
    Declarations {
        stack: vec![tree.root.children().iter()],
    }
}

impl<'a> Iterator for Declarations<'a> {
    type Item = &'a Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let Some(element) = top.next() else {
                self.stack.pop();
                continue;
            };
            let Some(node) = element.as_node() else {
                continue;
            };

            match node.kind() {
                SyntaxKind::Namespace => {
                    if let Some(body) = node.body() {
                        self.stack.push(body.children().iter());
                    }
                }
                // The declarations that follow a file-scoped namespace are its
                // siblings, so there is nothing to enter.
                SyntaxKind::FileScopedNamespace | SyntaxKind::UsingDirective => {}
                kind if kind.is_declaration() || kind == SyntaxKind::Conditional => {
                    return Some(node);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::cancel::CancellationToken;
    use crate::parser::parse;

    fn names(source: &str) -> Vec<String> {
        let tree = parse(source, Path::new("Test.cs"), &CancellationToken::new()).unwrap();
        declarations(&tree)
            .map(|d| d.name().map(|n| n.text().to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_flattens_namespaces() {
        let source = "using System;\nnamespace Outer { namespace Inner { class A { } } struct B { } }\nclass C { }";
        assert_eq!(names(source), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_file_scoped_namespace() {
        assert_eq!(names("namespace Demo;\nclass A { }\nenum E { X }"), vec!["A", "E"]);
    }

    #[test]
    fn test_nested_types_stay_inside() {
        assert_eq!(names("class Outer { class Inner { } }"), vec!["Outer"]);
    }

    #[test]
    fn test_empty_file() {
        assert!(names("// nothing here\n").is_empty());
    }
}
