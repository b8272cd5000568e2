//! Lexical analysis for Go source
//!
//! Converts source text into a stream of tokens. Every token carries its byte
//! span so that later stages can copy authored text verbatim.

mod go_scanner;
mod token;

pub use go_scanner::GoScanner;
pub use token::{Span, Token, TokenKind};
