//! # gofill - Go Struct Literal Filler
//!
//! Completes and reorders Go keyed composite literals. Given a literal such as
//!
//! ```go
//! u := User{Address: "beijing", Name: "x"}
//! ```
//!
//! and the declaration `type User struct { Name string; Age int; Address string }`,
//! gofill rewrites it to
//!
//! ```go
//! u := User{
//! 	Name: "x",
//! 	Age: 0,
//! 	Address: "beijing",
//! }
//! ```
//!
//! Authored values are kept byte for byte; missing fields get zero values
//! (`""`, `0`, `0.0`, `false`, `nil`, `[]T{}`, `map[K]V{}`, or a zero-filled
//! nested literal for struct-typed fields).
//!
//! Nested literals are filled too: behind pointers, in slices, arrays and map
//! values, and in call arguments. Pointer fields that refer back to their own
//! type (`Next *ListNode`) zero-fill as `nil`; value fields that would need an
//! infinitely large zero value are rejected.
//!
//! ## Quick Start
//!
//! ```rust
//! use gofill::{Engine, InMemorySources, ScopePath, TypeRegistry};
//! use std::sync::Arc;
//!
//! # fn main() -> gofill::Result<()> {
//! let sources = Arc::new(InMemorySources::new());
//! sources.insert(
//!     "main",
//!     "types.go",
//!     "package main\ntype ListNode struct {\n\tVal  int\n\tNext *ListNode\n}\n",
//! );
//! let engine = Engine::new(Arc::new(TypeRegistry::new(sources)));
//!
//! let source = "package main\n\nvar head = ListNode{Next: &ListNode{Val: 5}}\n";
//! let offset = source.find("Val: 5").unwrap();
//! let patch = engine.fill_at(source, offset, &ScopePath::new("main"))?;
//! assert_eq!(patch.replacement, "ListNode{\n\tVal:  5,\n\tNext: nil,\n}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Go source → GoScanner → Tokens → GoParser → CompositeLiteral ─┐
//!                                                              ▼
//!            SourceProvider → TypeRegistry ──────────────→ Engine → Patch
//! ```
//!
//! ### Main Components
//!
//! - **Lexer** ([`lexer`]) - Go tokens with byte spans and semicolon insertion
//! - **Parser** ([`parser`]) - type declarations and composite literals
//! - **Types** ([`types`]) - nominal record types, field declarations, type references
//! - **Registry** ([`registry`]) - cached, invalidatable declaration lookup per package
//! - **Engine** ([`engine`]) - zero values, normalization, recursion, rendering
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Nothing is partially
//! rewritten: a failure anywhere in a literal leaves the whole literal as is.
//!
//! ```rust
//! use gofill::{Engine, Error, InMemorySources, ScopePath, TypeRegistry};
//! use std::sync::Arc;
//!
//! let sources = Arc::new(InMemorySources::new());
//! sources.insert("main", "a.go", "package main\ntype T struct{ A int }\n");
//! let engine = Engine::new(Arc::new(TypeRegistry::new(sources)));
//!
//! let source = "package main\nvar t = T{A: 1, A: 2}\n";
//! let offset = source.find("A: 1").unwrap();
//! match engine.fill_at(source, offset, &ScopePath::new("main")) {
//!     Err(Error::DuplicateFieldKey { field, .. }) => assert_eq!(field, "A"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

#![warn(missing_docs)]

/// Version of gofill
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod types;

// Re-export main types
pub use config::{FillOptions, Layout, UnknownTypePolicy};
pub use engine::{locate, Diagnostic, Engine, FileReport, Patch};
pub use error::{Error, ErrorSeverity, Result};
pub use lexer::{GoScanner, Span, Token, TokenKind};
pub use parser::{
    Comments, CompositeLiteral, Element, ElementKey, GoParser, TypeExpr, ValueExpr,
};
pub use registry::{
    FsSources, InMemorySources, ScopeContext, Session, SourceProvider, SourceText, TypeRegistry,
};
pub use types::{FieldDeclaration, RecordKey, RecordType, ScalarKind, ScopePath, TypeDef, TypeRef};

/// Type alias for the Go scanner (lexer)
pub type Scanner = GoScanner;

/// Type alias for the Go parser
pub type Parser<'s> = GoParser<'s>;
