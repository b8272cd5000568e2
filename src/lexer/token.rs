use serde::{Deserialize, Serialize};

/// Byte range into the scanned source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// First byte of the range
    pub start: usize,
    /// One past the last byte of the range
    pub end: usize,
}

impl Span {
    /// Creates a span from byte offsets
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Span covering both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `offset` lies inside the span (end inclusive, so a cursor
    /// right before a closing brace still counts)
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Slices the spanned text out of `source`
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }
}

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
    /// Byte range of the token
    pub span: Span,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize, span: Span) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
            span,
        }
    }
}

/// All possible token types in Go source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal (kept as written: `0x1F`, `1_000`)
    Int(String),
    /// Floating-point literal
    Float(String),
    /// Imaginary literal (`2i`)
    Imag(String),
    /// Rune literal, including quotes
    Char(String),
    /// Interpreted string literal, including quotes
    String(String),
    /// Raw string literal, including backquotes
    RawString(String),

    /// Identifier
    Ident(String),

    // Keywords
    /// `break`
    Break,
    /// `case`
    Case,
    /// `chan`
    Chan,
    /// `const`
    Const,
    /// `continue`
    Continue,
    /// `default`
    Default,
    /// `defer`
    Defer,
    /// `else`
    Else,
    /// `fallthrough`
    Fallthrough,
    /// `for`
    For,
    /// `func`
    Func,
    /// `go`
    Go,
    /// `goto`
    Goto,
    /// `if`
    If,
    /// `import`
    Import,
    /// `interface`
    Interface,
    /// `map`
    Map,
    /// `package`
    Package,
    /// `range`
    Range,
    /// `return`
    Return,
    /// `select`
    Select,
    /// `struct`
    Struct,
    /// `switch`
    Switch,
    /// `type`
    Type,
    /// `var`
    Var,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Comma
    Comma,
    /// Semicolon, explicit or inserted at a line end
    Semicolon,
    /// Colon
    Colon,
    /// Dot
    Dot,
    /// Ellipsis (...)
    Ellipsis,

    // Operators with a structural role
    /// Star (*) - pointer types and multiplication
    Star,
    /// Ampersand (&) - address-of
    Amp,
    /// Assignment (=)
    Assign,
    /// Short variable declaration (:=)
    Define,
    /// Channel arrow (<-)
    Arrow,
    /// Tilde (~) in type constraints
    Tilde,
    /// Any other operator (`+`, `==`, `&&`, `<<=`, ...)
    Op(String),

    // Special
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Break
                | TokenKind::Case
                | TokenKind::Chan
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Default
                | TokenKind::Defer
                | TokenKind::Else
                | TokenKind::Fallthrough
                | TokenKind::For
                | TokenKind::Func
                | TokenKind::Go
                | TokenKind::Goto
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::Interface
                | TokenKind::Map
                | TokenKind::Package
                | TokenKind::Range
                | TokenKind::Return
                | TokenKind::Select
                | TokenKind::Struct
                | TokenKind::Switch
                | TokenKind::Type
                | TokenKind::Var
        )
    }

    /// Get keyword from string
    pub fn keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a line break after this token terminates the statement
    pub fn ends_statement(&self) -> bool {
        match self {
            TokenKind::Ident(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Imag(_)
            | TokenKind::Char(_)
            | TokenKind::String(_)
            | TokenKind::RawString(_)
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Fallthrough
            | TokenKind::Return
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace => true,
            TokenKind::Op(op) => op == "++" || op == "--",
            _ => false,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Int(s)
            | TokenKind::Float(s)
            | TokenKind::Imag(s)
            | TokenKind::Char(s)
            | TokenKind::String(s)
            | TokenKind::RawString(s)
            | TokenKind::Ident(s)
            | TokenKind::Op(s) => write!(f, "{}", s),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("struct"), Some(TokenKind::Struct));
        assert_eq!(TokenKind::keyword("map"), Some(TokenKind::Map));
        assert_eq!(TokenKind::keyword("nil"), None);
        assert_eq!(TokenKind::keyword("string"), None);
    }

    #[test]
    fn test_is_keyword() {
        assert!(TokenKind::Func.is_keyword());
        assert!(TokenKind::Range.is_keyword());
        assert!(!TokenKind::Int("42".to_string()).is_keyword());
        assert!(!TokenKind::Ident("User".to_string()).is_keyword());
    }

    #[test]
    fn test_span_contains_is_end_inclusive() {
        let span = Span::new(4, 10);
        assert!(span.contains(4));
        assert!(span.contains(10));
        assert!(!span.contains(11));
        assert_eq!(Span::new(2, 3).to(span), Span::new(2, 10));
    }
}
