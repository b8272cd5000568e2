use crate::lexer::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declarations of one Go source file that matter for literal filling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourceFile {
    /// Package name from the package clause
    pub package: String,
    /// Import declarations in source order
    pub imports: Vec<ImportSpec>,
    /// Top-level type declarations in source order
    pub types: Vec<TypeSpec>,
}

/// A single import: `alias "path"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Explicit alias, including `_` and `.`
    pub alias: Option<String>,
    /// Import path without quotes
    pub path: String,
}

impl ImportSpec {
    /// Name the package is referred to by inside the importing file
    ///
    /// Without an alias this is the last path element, which is the package
    /// name for every conventionally laid out module.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A type declaration: `type Name[P any] T` or `type Name = T`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Declared name
    pub name: String,
    /// Type parameter names of a generic declaration
    pub type_params: Vec<String>,
    /// `type A = B` rather than `type A B`
    pub is_alias: bool,
    /// Right-hand side type
    pub ty: TypeExpr,
    /// Span of the whole declaration
    pub span: Span,
}

/// Syntactic type expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Named type, possibly package-qualified or instantiated: `pkg.T[int]`
    Named {
        /// Package qualifier (import local name)
        package: Option<String>,
        /// Type name
        name: String,
        /// Generic type arguments
        args: Vec<TypeExpr>,
    },
    /// Pointer type `*T`
    Pointer(Box<TypeExpr>),
    /// Slice type `[]T`
    Slice(Box<TypeExpr>),
    /// Array type `[N]T`; the length is kept as written (`...` for inferred)
    Array {
        /// Length expression text
        len: String,
        /// Element type
        elem: Box<TypeExpr>,
    },
    /// Map type `map[K]V`
    Map {
        /// Key type
        key: Box<TypeExpr>,
        /// Value type
        value: Box<TypeExpr>,
    },
    /// Anonymous struct type
    Struct(Vec<FieldSpec>),
    /// Interface, func or chan type, kept verbatim
    Opaque(String),
}

impl TypeExpr {
    /// Shorthand for an unqualified, non-generic named type
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: None,
            name: name.into(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named {
                package,
                name,
                args,
            } => {
                if let Some(pkg) = package {
                    write!(f, "{}.", pkg)?;
                }
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
            TypeExpr::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if !field.embedded {
                        write!(f, "{} ", field.names.join(", "))?;
                    }
                    write!(f, "{}", field.ty)?;
                    if let Some(tag) = &field.tag {
                        write!(f, " {}", tag)?;
                    }
                }
                write!(f, "}}")
            }
            TypeExpr::Opaque(text) => write!(f, "{}", text),
        }
    }
}

/// One line of a struct body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field names; an embedded field has its type name here
    pub names: Vec<String>,
    /// Declared type
    pub ty: TypeExpr,
    /// Struct tag, verbatim including quotes
    pub tag: Option<String>,
    /// Embedded (anonymous) field
    pub embedded: bool,
}

/// A composite literal: `T{...}`, `[]T{...}`, `map[K]V{...}` or an elided `{...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeLiteral {
    /// Parsed literal type; `None` when elided inside a container literal
    pub ty: Option<TypeExpr>,
    /// Literal type as written, or as synthesized
    pub type_text: Option<String>,
    /// Elements in authored order
    pub elements: Vec<Element>,
    /// Byte range of the literal in the source (empty for synthesized literals)
    pub span: Span,
    /// Authored text of the whole literal (empty for synthesized literals)
    pub text: String,
    /// Comments on their own lines after the last element
    #[serde(default)]
    pub dangling: Vec<String>,
}

impl CompositeLiteral {
    /// Builds a synthesized literal that has no source location
    pub fn synthesized(type_text: impl Into<String>, elements: Vec<Element>) -> Self {
        CompositeLiteral {
            ty: None,
            type_text: Some(type_text.into()),
            elements,
            span: Span::default(),
            text: String::new(),
            dangling: Vec::new(),
        }
    }

    /// Whether this literal itself (not its nested literals) carries comments
    pub fn has_comments(&self) -> bool {
        !self.dangling.is_empty() || self.elements.iter().any(|e| !e.comments.is_empty())
    }

    /// Field name of every keyed element, in order
    pub fn field_names(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match &e.key {
                Some(ElementKey::Field(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Looks up the value of a keyed field element
    pub fn field(&self, name: &str) -> Option<&ValueExpr> {
        self.elements.iter().find_map(|e| match &e.key {
            Some(ElementKey::Field(key)) if key == name => Some(&e.value),
            _ => None,
        })
    }
}

/// One element of a composite literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Key, when the element is keyed
    pub key: Option<ElementKey>,
    /// Element value
    pub value: ValueExpr,
    /// Comments attached to the element
    #[serde(default)]
    pub comments: Comments,
}

impl Element {
    /// A `Name: value` element
    pub fn field(name: impl Into<String>, value: ValueExpr) -> Self {
        Element {
            key: Some(ElementKey::Field(name.into())),
            value,
            comments: Comments::default(),
        }
    }

    /// A positional element
    pub fn positional(value: ValueExpr) -> Self {
        Element {
            key: None,
            value,
            comments: Comments::default(),
        }
    }
}

/// Comment text around an element, verbatim including `//` or `/* */`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Comments {
    /// Comments on the lines before the element, or between its key and value
    pub leading: Vec<String>,
    /// Comments after the element on the same line
    pub trailing: Vec<String>,
}

impl Comments {
    /// No comments at all
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Element key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKey {
    /// A bare identifier: a field name in struct literals, a constant in others
    Field(String),
    /// Any other key expression, verbatim
    Expr(String),
}

impl ElementKey {
    /// Key text as written
    pub fn text(&self) -> &str {
        match self {
            ElementKey::Field(name) => name,
            ElementKey::Expr(text) => text,
        }
    }
}

/// Value of a literal element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueExpr {
    /// Verbatim expression the engine never looks into
    Opaque(String),
    /// Nested composite literal
    Composite(CompositeLiteral),
    /// Address of a composite literal: `&T{...}`
    AddressOf(Box<CompositeLiteral>),
    /// Synthesized null pointer / nil-able zero
    Nil,
    /// Spread value `xs...`, which cannot be kept as a single element
    Spread(String),
}

impl ValueExpr {
    /// Shorthand for an opaque value
    pub fn opaque(text: impl Into<String>) -> Self {
        ValueExpr::Opaque(text.into())
    }

    /// The nested literal, directly or behind `&`
    pub fn literal(&self) -> Option<&CompositeLiteral> {
        match self {
            ValueExpr::Composite(lit) => Some(lit),
            ValueExpr::AddressOf(lit) => Some(lit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        let ty = TypeExpr::Map {
            key: Box::new(TypeExpr::named("string")),
            value: Box::new(TypeExpr::Slice(Box::new(TypeExpr::Pointer(Box::new(
                TypeExpr::Named {
                    package: Some("user".into()),
                    name: "User".into(),
                    args: vec![],
                },
            ))))),
        };
        assert_eq!(ty.to_string(), "map[string][]*user.User");
    }

    #[test]
    fn test_import_local_name() {
        let plain = ImportSpec {
            alias: None,
            path: "gotest/pb/user".into(),
        };
        assert_eq!(plain.local_name(), "user");
        let aliased = ImportSpec {
            alias: Some("pb".into()),
            path: "gotest/pb/user".into(),
        };
        assert_eq!(aliased.local_name(), "pb");
    }

    #[test]
    fn test_field_lookup() {
        let lit = CompositeLiteral::synthesized(
            "User",
            vec![
                Element::field("Name", ValueExpr::opaque("\"x\"")),
                Element::field("Age", ValueExpr::opaque("0")),
            ],
        );
        assert_eq!(lit.field_names(), vec!["Name", "Age"]);
        assert_eq!(lit.field("Age"), Some(&ValueExpr::opaque("0")));
        assert_eq!(lit.field("Address"), None);
    }
}
