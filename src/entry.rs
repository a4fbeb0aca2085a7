//! Entry point resolution.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::syntax::Node;

/// Name and base type that identify the script entry declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub base: String,
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self {
            name: "Program".to_string(),
            base: "MyGridProgram".to_string(),
        }
    }
}

impl EntryPoint {
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
        }
    }

    /// Whether `node` is a type declaration with the entry name, a base list
    /// mentioning the entry base, and a body to merge into.
    pub fn matches(&self, node: &Node) -> bool {
        node.kind().is_type_declaration()
            && node.name().is_some_and(|n| n.text() == self.name)
            && node
                .base_list()
                .is_some_and(|b| b.to_string().contains(self.base.as_str()))
            && node.body().is_some()
    }
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("no entry point found: create a '{name}' class that inherits from '{base}'")]
    NoEntryPoint { name: String, base: String },
}

/// Find the entry declaration among the declarations of every file.
///
/// The first match in encounter order wins. Later matches are reported and
/// then merged like any other declaration.
pub fn resolve_entry<'a>(
    declarations: &'a [Arc<Node>],
    entry: &EntryPoint,
) -> Result<&'a Arc<Node>, EntryError> {
    let mut matches = declarations.iter().filter(|d| entry.matches(d));

    let Some(found) = matches.next() else {
        return Err(EntryError::NoEntryPoint {
            name: entry.name.clone(),
            base: entry.base.clone(),
        });
    };

    let extra = matches.count();
    if extra > 0 {
        warn!(
            name = %entry.name,
            base = %entry.base,
            extra,
            "multiple entry declarations found, using the first"
        );
    }
    info!(name = %entry.name, members = found.members().count(), "entry resolved");

    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::cancel::CancellationToken;
    use crate::extract::declarations;
    use crate::parser::parse;

    fn decls(source: &str) -> Vec<Arc<Node>> {
        let tree = parse(source, Path::new("Test.cs"), &CancellationToken::new()).unwrap();
        declarations(&tree).cloned().collect()
    }

    #[test]
    fn test_resolves_entry() {
        let list = decls("class Helper { }\npartial class Program : MyGridProgram { }");
        let found = resolve_entry(&list, &EntryPoint::default()).unwrap();
        assert!(Arc::ptr_eq(found, &list[1]));
    }

    #[test]
    fn test_program_without_base_is_no_entry() {
        let list = decls("class Program { void Main() { } }");
        let err = resolve_entry(&list, &EntryPoint::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no entry point found: create a 'Program' class that inherits from 'MyGridProgram'"
        );
    }

    #[test]
    fn test_wrong_base_is_no_entry() {
        let list = decls("class Program : Base { }\nclass Script : MyGridProgram { }");
        assert!(resolve_entry(&list, &EntryPoint::default()).is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let list = decls("class Program : MyGridProgram { int a; }\nclass Program : MyGridProgram { }");
        let found = resolve_entry(&list, &EntryPoint::default()).unwrap();
        assert!(Arc::ptr_eq(found, &list[0]));
    }

    #[test]
    fn test_custom_entry() {
        let list = decls("class Main : Sandbox.ModAPI.Ingame.MyGridProgram { }");
        let entry = EntryPoint::new("Main", "MyGridProgram");
        assert!(resolve_entry(&list, &entry).is_ok());
    }

    #[test]
    fn test_empty_list() {
        assert!(resolve_entry(&[], &EntryPoint::default()).is_err());
    }
}
