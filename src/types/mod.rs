//! # Semantic Type Model
//!
//! Declarations lowered out of Go syntax into the shape literal filling
//! needs: which named record types exist, their fields in declaration order,
//! and for every field type what its zero value looks like.
//!
//! Type identity is nominal. A [`RecordKey`] names a type by the import path
//! of its declaring package plus its declared name, so two structurally
//! identical declarations stay distinct.
//!
//! ```text
//! type ListNode struct {       RecordType {
//!     Val  int                     key: main.ListNode,
//!     Next *ListNode               fields: [Val: Scalar(int), Next: Pointer(Record(main.ListNode))]
//! }                            }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Import path of a package, the unit types are declared and cached in
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopePath(String);

impl ScopePath {
    /// Creates a scope path from an import path
    pub fn new(path: impl Into<String>) -> Self {
        ScopePath(path.into())
    }

    /// The import path
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path element, the default package name for the path
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopePath {
    fn from(path: &str) -> Self {
        ScopePath::new(path)
    }
}

impl From<String> for ScopePath {
    fn from(path: String) -> Self {
        ScopePath(path)
    }
}

/// Identity of a named type: declaring scope plus declared name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Declaring package
    pub scope: ScopePath,
    /// Declared type name
    pub name: String,
}

impl RecordKey {
    /// Creates a key
    pub fn new(scope: impl Into<ScopePath>, name: impl Into<String>) -> Self {
        RecordKey {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

/// Predeclared basic types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `int`
    Int,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint`
    Uint,
    /// `uint8`
    Uint8,
    /// `uint16`
    Uint16,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `uintptr`
    Uintptr,
    /// `byte` (alias of uint8, spelled as written)
    Byte,
    /// `rune` (alias of int32, spelled as written)
    Rune,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `complex64`
    Complex64,
    /// `complex128`
    Complex128,
}

impl ScalarKind {
    /// Go spelling of the kind
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint => "uint",
            ScalarKind::Uint8 => "uint8",
            ScalarKind::Uint16 => "uint16",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Uintptr => "uintptr",
            ScalarKind::Byte => "byte",
            ScalarKind::Rune => "rune",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::Complex64 => "complex64",
            ScalarKind::Complex128 => "complex128",
        }
    }

    /// Zero value literal
    pub fn zero_text(self) -> &'static str {
        match self {
            ScalarKind::Bool => "false",
            ScalarKind::String => "\"\"",
            ScalarKind::Float32 | ScalarKind::Float64 => "0.0",
            _ => "0",
        }
    }
}

/// Length of an array type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayLen {
    /// Literal length
    Fixed(usize),
    /// Constant expression, kept as written
    Named(String),
}

impl ArrayLen {
    /// Parses the length text of an array type
    pub fn parse(text: &str) -> Self {
        let cleaned = text.replace('_', "");
        let parsed = if let Some(hex) = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
        {
            usize::from_str_radix(hex, 16).ok()
        } else {
            cleaned.parse::<usize>().ok()
        };
        match parsed {
            Some(n) => ArrayLen::Fixed(n),
            None => ArrayLen::Named(text.to_string()),
        }
    }
}

impl fmt::Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Fixed(n) => write!(f, "{}", n),
            ArrayLen::Named(text) => f.write_str(text),
        }
    }
}

/// Reference to a type from a field declaration or literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// Predeclared basic type
    Scalar(ScalarKind),
    /// Named type, possibly instantiated with type arguments
    Record {
        /// Type identity
        key: RecordKey,
        /// Type arguments of a generic instantiation
        args: Vec<TypeRef>,
    },
    /// `*T`
    Pointer(Box<TypeRef>),
    /// `[]T`
    Slice(Box<TypeRef>),
    /// `[N]T`
    Array(Box<TypeRef>, ArrayLen),
    /// `map[K]V`
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Interface, func, chan, `error` and `any`: zero is `nil`; spelled as written
    Nilable(String),
    /// Anonymous struct type, spelled as written
    AnonStruct(String),
    /// Type parameter of the enclosing generic declaration
    TypeParam(String),
}

impl TypeRef {
    /// Reference to a non-generic named type
    pub fn record(key: RecordKey) -> Self {
        TypeRef::Record {
            key,
            args: Vec::new(),
        }
    }

    /// The named type behind the reference, if it is one
    pub fn record_key(&self) -> Option<&RecordKey> {
        match self {
            TypeRef::Record { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Whether the type's zero value is `nil`
    pub fn is_nilable(&self) -> bool {
        matches!(self, TypeRef::Pointer(_) | TypeRef::Nilable(_))
    }

    /// Replaces bound type parameters with their arguments
    pub fn substitute(&self, bindings: &HashMap<&str, &TypeRef>) -> TypeRef {
        match self {
            TypeRef::TypeParam(name) => bindings
                .get(name.as_str())
                .map(|arg| (*arg).clone())
                .unwrap_or_else(|| self.clone()),
            TypeRef::Record { key, args } => TypeRef::Record {
                key: key.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(inner.substitute(bindings))),
            TypeRef::Slice(elem) => TypeRef::Slice(Box::new(elem.substitute(bindings))),
            TypeRef::Array(elem, len) => {
                TypeRef::Array(Box::new(elem.substitute(bindings)), len.clone())
            }
            TypeRef::Map(key, value) => TypeRef::Map(
                Box::new(key.substitute(bindings)),
                Box::new(value.substitute(bindings)),
            ),
            TypeRef::Scalar(_) | TypeRef::Nilable(_) | TypeRef::AnonStruct(_) => self.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => f.write_str(kind.name()),
            TypeRef::Record { key, args } => {
                write!(f, "{}", key)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "[{}]", args.join(", "))?;
                }
                Ok(())
            }
            TypeRef::Pointer(inner) => write!(f, "*{}", inner),
            TypeRef::Slice(elem) => write!(f, "[]{}", elem),
            TypeRef::Array(elem, len) => write!(f, "[{}]{}", len, elem),
            TypeRef::Map(key, value) => write!(f, "map[{}]{}", key, value),
            TypeRef::Nilable(text) | TypeRef::AnonStruct(text) | TypeRef::TypeParam(text) => {
                f.write_str(text)
            }
        }
    }
}

/// Whether a field can be named from outside its package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Name starts with an upper-case letter
    Exported,
    /// Only writable from the declaring package
    Unexported,
}

impl Visibility {
    /// Go's export rule
    pub fn of(name: &str) -> Self {
        match name.chars().next() {
            Some(c) if c.is_uppercase() => Visibility::Exported,
            _ => Visibility::Unexported,
        }
    }
}

/// One declared field of a record type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Field name (type name for embedded fields)
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Export status of the name
    pub visibility: Visibility,
    /// Embedded field
    pub embedded: bool,
    /// Struct tag, carried through and never interpreted
    pub metadata: Option<String>,
}

impl FieldDeclaration {
    /// Creates a non-embedded field without metadata
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        FieldDeclaration {
            visibility: Visibility::of(&name),
            name,
            ty,
            embedded: false,
            metadata: None,
        }
    }

    /// Whether a literal in `invoking` may name this field of a type declared in `declaring`
    pub fn writable_from(&self, declaring: &ScopePath, invoking: &ScopePath) -> bool {
        self.visibility == Visibility::Exported || declaring == invoking
    }
}

/// A named struct type with its fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordType {
    /// Type identity
    pub key: RecordKey,
    /// Type parameter names of a generic declaration
    pub type_params: Vec<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldDeclaration>,
}

impl RecordType {
    /// Creates a non-generic record type
    pub fn new(key: RecordKey, fields: Vec<FieldDeclaration>) -> Self {
        RecordType {
            key,
            type_params: Vec::new(),
            fields,
        }
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared field names in order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// The record with `args` in place of its type parameters
    ///
    /// Fails unless there is exactly one argument per parameter; a generic
    /// type cannot be used uninstantiated.
    pub fn instantiate(&self, args: &[TypeRef]) -> Result<Cow<'_, RecordType>> {
        if args.len() != self.type_params.len() {
            return Err(Error::unsupported(format!(
                "{} takes {} type arguments, got {}",
                self.key,
                self.type_params.len(),
                args.len()
            )));
        }
        if args.is_empty() {
            return Ok(Cow::Borrowed(self));
        }

        let bindings: HashMap<&str, &TypeRef> = self
            .type_params
            .iter()
            .map(String::as_str)
            .zip(args)
            .collect();
        Ok(Cow::Owned(RecordType {
            key: self.key.clone(),
            type_params: Vec::new(),
            fields: self
                .fields
                .iter()
                .map(|field| FieldDeclaration {
                    ty: field.ty.substitute(&bindings),
                    ..field.clone()
                })
                .collect(),
        }))
    }

    /// Fields a literal in `invoking` may name, in order
    pub fn writable_fields<'a>(
        &'a self,
        invoking: &'a ScopePath,
    ) -> impl Iterator<Item = &'a FieldDeclaration> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.writable_from(&self.key.scope, invoking))
    }
}

/// What a type name declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    /// `type T struct {...}`
    Record(Arc<RecordType>),
    /// `type T U` for a non-struct underlying type
    Named {
        /// Declared identity
        key: RecordKey,
        /// Underlying type
        underlying: TypeRef,
    },
    /// `type T = U`
    Alias(TypeRef),
}

lazy_static::lazy_static! {
    /// Predeclared type identifiers
    static ref PREDECLARED: HashMap<&'static str, TypeRef> = {
        let mut m = HashMap::new();
        for kind in [
            ScalarKind::Bool,
            ScalarKind::String,
            ScalarKind::Int,
            ScalarKind::Int8,
            ScalarKind::Int16,
            ScalarKind::Int32,
            ScalarKind::Int64,
            ScalarKind::Uint,
            ScalarKind::Uint8,
            ScalarKind::Uint16,
            ScalarKind::Uint32,
            ScalarKind::Uint64,
            ScalarKind::Uintptr,
            ScalarKind::Byte,
            ScalarKind::Rune,
            ScalarKind::Float32,
            ScalarKind::Float64,
            ScalarKind::Complex64,
            ScalarKind::Complex128,
        ] {
            m.insert(kind.name(), TypeRef::Scalar(kind));
        }
        m.insert("error", TypeRef::Nilable("error".to_string()));
        m.insert("any", TypeRef::Nilable("any".to_string()));
        m
    };
}

/// Looks up a predeclared type identifier
pub fn predeclared(name: &str) -> Option<TypeRef> {
    PREDECLARED.get(name).cloned()
}
