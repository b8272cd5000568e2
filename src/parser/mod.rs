//! Go Parser Module
//!
//! Parses package headers, type declarations and composite literals out of
//! Go source. Everything else (function bodies, statements, expressions) is
//! skipped or kept as verbatim text.

mod ast;
mod go_parser;

pub use ast::{
    Comments, CompositeLiteral, Element, ElementKey, FieldSpec, ImportSpec, SourceFile, TypeExpr, TypeSpec,
    ValueExpr,
};
pub use go_parser::GoParser;
