//! Node and token kinds.

/// Kind of a non-terminal node.
///
/// Closed over the shapes the rewrite passes and the formatter care about;
/// everything else collapses into [`SyntaxKind::Other`] (or
/// [`SyntaxKind::Statement`] for statements without special handling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    CompilationUnit,
    Namespace,
    FileScopedNamespace,
    UsingDirective,

    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Record,

    Field,
    EventField,
    Event,
    Property,
    Indexer,
    Method,
    Constructor,
    Destructor,
    Operator,
    ConversionOperator,
    EnumMember,

    DeclarationList,
    EnumMemberList,
    AccessorList,
    Accessor,
    BaseList,
    AttributeList,
    ParameterList,
    Parameter,
    VariableDeclarator,
    ConstructorInitializer,

    Block,
    EmptyStatement,
    Statement,
    SwitchSection,

    MemberAccess,
    Cast,

    /// `#if` / `#elif` / `#else` blocks that wrap code.
    Conditional,
    Other,
}

impl SyntaxKind {
    /// Map a C# grammar node kind to its syntax kind.
    pub fn from_grammar(kind: &str) -> Self {
        match kind {
            "compilation_unit" => SyntaxKind::CompilationUnit,
            "namespace_declaration" => SyntaxKind::Namespace,
            "file_scoped_namespace_declaration" => SyntaxKind::FileScopedNamespace,
            "using_directive" => SyntaxKind::UsingDirective,
            "class_declaration" => SyntaxKind::Class,
            "struct_declaration" => SyntaxKind::Struct,
            "interface_declaration" => SyntaxKind::Interface,
            "enum_declaration" => SyntaxKind::Enum,
            "delegate_declaration" => SyntaxKind::Delegate,
            "record_declaration" => SyntaxKind::Record,
            "field_declaration" => SyntaxKind::Field,
            "event_field_declaration" => SyntaxKind::EventField,
            "event_declaration" => SyntaxKind::Event,
            "property_declaration" => SyntaxKind::Property,
            "indexer_declaration" => SyntaxKind::Indexer,
            "method_declaration" => SyntaxKind::Method,
            "constructor_declaration" => SyntaxKind::Constructor,
            "destructor_declaration" => SyntaxKind::Destructor,
            "operator_declaration" => SyntaxKind::Operator,
            "conversion_operator_declaration" => SyntaxKind::ConversionOperator,
            "enum_member_declaration" => SyntaxKind::EnumMember,
            "declaration_list" => SyntaxKind::DeclarationList,
            "enum_member_declaration_list" => SyntaxKind::EnumMemberList,
            "accessor_list" => SyntaxKind::AccessorList,
            "accessor_declaration" => SyntaxKind::Accessor,
            "base_list" => SyntaxKind::BaseList,
            "attribute_list" => SyntaxKind::AttributeList,
            "parameter_list" | "bracketed_parameter_list" => SyntaxKind::ParameterList,
            "parameter" => SyntaxKind::Parameter,
            "variable_declarator" => SyntaxKind::VariableDeclarator,
            "constructor_initializer" => SyntaxKind::ConstructorInitializer,
            "block" => SyntaxKind::Block,
            "empty_statement" => SyntaxKind::EmptyStatement,
            "switch_section" => SyntaxKind::SwitchSection,
            "member_access_expression" => SyntaxKind::MemberAccess,
            "cast_expression" => SyntaxKind::Cast,
            k if k.starts_with("preproc_if")
                || k.starts_with("preproc_elif")
                || k.starts_with("preproc_else") =>
            {
                SyntaxKind::Conditional
            }
            "global_statement" => SyntaxKind::Other,
            k if k.ends_with("_statement") => SyntaxKind::Statement,
            _ => SyntaxKind::Other,
        }
    }

    /// Class, struct, interface, enum, delegate or record.
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::Class
                | SyntaxKind::Struct
                | SyntaxKind::Interface
                | SyntaxKind::Enum
                | SyntaxKind::Delegate
                | SyntaxKind::Record
        )
    }

    /// Any member-bearing declaration: types and type members.
    pub fn is_declaration(self) -> bool {
        self.is_type_declaration()
            || matches!(
                self,
                SyntaxKind::Field
                    | SyntaxKind::EventField
                    | SyntaxKind::Event
                    | SyntaxKind::Property
                    | SyntaxKind::Indexer
                    | SyntaxKind::Method
                    | SyntaxKind::Constructor
                    | SyntaxKind::Destructor
                    | SyntaxKind::Operator
                    | SyntaxKind::ConversionOperator
                    | SyntaxKind::EnumMember
            )
    }

    /// Namespace containers, block-bodied or file-scoped.
    pub fn is_namespace(self) -> bool {
        matches!(self, SyntaxKind::Namespace | SyntaxKind::FileScopedNamespace)
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block | SyntaxKind::EmptyStatement | SyntaxKind::Statement
        )
    }

    /// Kinds whose declarations carry a required name.
    pub fn requires_name(self) -> bool {
        self.is_type_declaration()
            || matches!(
                self,
                SyntaxKind::Method
                    | SyntaxKind::Constructor
                    | SyntaxKind::Destructor
                    | SyntaxKind::Property
                    | SyntaxKind::Event
                    | SyntaxKind::EnumMember
            )
    }

    /// Nodes whose child list may lose a statement without breaking the grammar.
    pub fn holds_statement_list(self) -> bool {
        matches!(self, SyntaxKind::Block | SyntaxKind::SwitchSection)
    }
}

/// Kind of a terminal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    /// Declaration modifiers (`public`, `static`, ...) and parameter modifiers.
    Modifier,
    Literal,
    Punctuation,
    /// Pieces of a preprocessor line that is part of the tree (`#if`, `#endif`,
    /// and the line terminator after a condition).
    Directive,
}

impl TokenKind {
    /// Classify a token by grammar kind and literal text.
    pub fn classify(grammar_kind: &str, text: &str) -> Self {
        if grammar_kind == "identifier" {
            return TokenKind::Identifier;
        }
        if grammar_kind == "modifier" {
            return TokenKind::Modifier;
        }
        if grammar_kind.contains("literal") || grammar_kind == "interpolated_string_expression" {
            return TokenKind::Literal;
        }
        if text.starts_with('#') || (!text.is_empty() && text.trim().is_empty()) {
            return TokenKind::Directive;
        }
        match text.chars().next() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '@' => TokenKind::Keyword,
            _ => TokenKind::Punctuation,
        }
    }
}

/// Grammar kinds converted to a single token even though the grammar gives
/// them internal structure.
pub(crate) fn is_atomic_grammar_kind(kind: &str) -> bool {
    matches!(kind, "identifier" | "modifier" | "interpolated_string_expression")
        || kind.contains("literal")
}
