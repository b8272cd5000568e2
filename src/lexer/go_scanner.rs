use super::token::{Span, Token, TokenKind};
use crate::error::{Error, Result};

/// Operators ordered longest first so that scanning takes the longest match
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
    "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ";", ".", ":", "~",
];

/// Scanner for Go source text
pub struct GoScanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Byte offset of every character, plus the total length at the end
    offsets: Vec<usize>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Line and column where the current token started
    start_line: usize,
    start_column: usize,
}

impl GoScanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        let mut offsets: Vec<usize> = source.char_indices().map(|(i, _)| i).collect();
        offsets.push(source.len());
        GoScanner {
            source: source.chars().collect(),
            offsets,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.start = self.current;
        self.insert_semicolon();
        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
            Span::new(self.offsets[self.current], self.offsets[self.current]),
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            '\n' => {
                self.insert_semicolon();
                self.line += 1;
                self.column = 1;
            }
            ' ' | '\r' | '\t' => {}

            '/' if self.peek() == '/' => self.skip_line_comment(),
            '/' if self.peek() == '*' => self.skip_block_comment()?,

            '"' => self.scan_string()?,
            '`' => self.scan_raw_string()?,
            '\'' => self.scan_rune()?,

            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek().is_ascii_digit() => self.scan_number(),

            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            _ => self.scan_operator(c)?,
        }

        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        self.advance(); // opening *
        let mut saw_newline = false;
        loop {
            if self.is_at_end() {
                return Err(Error::ParseError(format!(
                    "Unterminated block comment starting at line {}",
                    self.start_line
                )));
            }
            let c = self.advance();
            if c == '\n' {
                if !saw_newline {
                    // A comment spanning lines acts like a newline
                    self.insert_semicolon();
                }
                saw_newline = true;
                self.line += 1;
                self.column = 1;
            } else if c == '*' && self.peek() == '/' {
                self.advance();
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(Error::ParseError(format!(
                    "Unterminated string at line {}, column {}",
                    self.start_line, self.start_column
                )));
            }
            match self.advance() {
                '\\' => {
                    if !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                '"' => break,
                _ => {}
            }
        }
        let text = self.current_text();
        self.add_token(TokenKind::String(text));
        Ok(())
    }

    fn scan_raw_string(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() {
                return Err(Error::ParseError(format!(
                    "Unterminated raw string at line {}, column {}",
                    self.start_line, self.start_column
                )));
            }
            match self.advance() {
                '`' => break,
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => {}
            }
        }
        let text = self.current_text();
        self.add_token(TokenKind::RawString(text));
        Ok(())
    }

    fn scan_rune(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(Error::ParseError(format!(
                    "Unterminated rune literal at line {}, column {}",
                    self.start_line, self.start_column
                )));
            }
            match self.advance() {
                '\\' => {
                    if !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                '\'' => break,
                _ => {}
            }
        }
        let text = self.current_text();
        self.add_token(TokenKind::Char(text));
        Ok(())
    }

    fn scan_number(&mut self) {
        let first = self.source[self.start];
        let hex = first == '0' && matches!(self.peek(), 'x' | 'X');

        loop {
            let c = self.peek();
            let prev = self.source[self.current - 1];
            let exponent = if hex {
                matches!(prev, 'p' | 'P')
            } else {
                matches!(prev, 'e' | 'E')
            };
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else if c == '.' && self.peek_next() != '.' {
                self.advance();
            } else if (c == '+' || c == '-') && exponent {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.current_text();
        let kind = if text.ends_with('i') {
            TokenKind::Imag(text)
        } else if text.contains('.')
            || (hex && text.contains(['p', 'P']))
            || (!hex && text.contains(['e', 'E']))
        {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        };
        self.add_token(kind);
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.current_text();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Ident(text));
        self.add_token(kind);
    }

    fn scan_operator(&mut self, first: char) -> Result<()> {
        for op in OPERATORS {
            let mut chars = op.chars();
            if chars.next() != Some(first) {
                continue;
            }
            let rest: Vec<char> = chars.collect();
            let matches = rest
                .iter()
                .enumerate()
                .all(|(i, c)| self.source.get(self.current + i) == Some(c));
            if !matches {
                continue;
            }
            for _ in 0..rest.len() {
                self.advance();
            }
            let kind = match *op {
                "(" => TokenKind::LeftParen,
                ")" => TokenKind::RightParen,
                "{" => TokenKind::LeftBrace,
                "}" => TokenKind::RightBrace,
                "[" => TokenKind::LeftBracket,
                "]" => TokenKind::RightBracket,
                "," => TokenKind::Comma,
                ";" => TokenKind::Semicolon,
                ":" => TokenKind::Colon,
                "." => TokenKind::Dot,
                "..." => TokenKind::Ellipsis,
                "*" => TokenKind::Star,
                "&" => TokenKind::Amp,
                "=" => TokenKind::Assign,
                ":=" => TokenKind::Define,
                "<-" => TokenKind::Arrow,
                "~" => TokenKind::Tilde,
                other => TokenKind::Op(other.to_string()),
            };
            self.add_token(kind);
            return Ok(());
        }

        Err(Error::ParseError(format!(
            "Unexpected character '{}' at line {}, column {}",
            first, self.start_line, self.start_column
        )))
    }

    /// Emits an implicit semicolon if the last token ends a statement
    fn insert_semicolon(&mut self) {
        let needed = self
            .tokens
            .last()
            .map(|t| t.kind.ends_statement())
            .unwrap_or(false);
        if needed {
            let at = self.offsets[self.current.saturating_sub(1).max(self.start)];
            self.tokens.push(Token::new(
                TokenKind::Semicolon,
                "\n".to_string(),
                self.line,
                self.column,
                Span::new(at, at),
            ));
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn current_text(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.current_text();
        let span = Span::new(self.offsets[self.start], self.offsets[self.current]);
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_column,
            span,
        ));
    }
}
