use super::ast::{
    Comments, CompositeLiteral, Element, ElementKey, FieldSpec, ImportSpec, SourceFile, TypeExpr,
    TypeSpec, ValueExpr,
};
use crate::error::{Error, Result};
use crate::lexer::{GoScanner, Span, Token, TokenKind};

/// Recursive descent parser for the parts of Go that literal filling needs:
/// package headers, type declarations and composite literals.
pub struct GoParser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    current: usize,
}

impl<'s> GoParser<'s> {
    /// Creates a parser over already scanned tokens of `source`
    pub fn new(source: &'s str, tokens: Vec<Token>) -> Self {
        GoParser {
            source,
            tokens,
            current: 0,
        }
    }

    /// Scans `source` and creates a parser over it
    pub fn from_source(source: &'s str) -> Result<Self> {
        let tokens = GoScanner::new(source).scan_tokens()?;
        Ok(Self::new(source, tokens))
    }

    /// Tokens the parser works on
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parses the package clause, imports and type declarations of a file,
    /// skipping every other declaration
    pub fn parse_file(&mut self) -> Result<SourceFile> {
        self.current = 0;
        self.skip_semicolons();
        self.consume(TokenKind::Package)?;
        let package = self.consume_ident()?;

        let mut file = SourceFile {
            package,
            ..SourceFile::default()
        };

        loop {
            self.skip_semicolons();
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Import => self.parse_import_decl(&mut file.imports)?,
                TokenKind::Type => self.parse_type_decl(&mut file.types)?,
                _ => self.skip_declaration()?,
            }
        }

        Ok(file)
    }

    /// Parses only the package clause and the import declarations
    ///
    /// Stops at the first other declaration, so files with syntax errors
    /// further down still yield their imports.
    pub fn parse_header(&mut self) -> Result<SourceFile> {
        self.current = 0;
        self.skip_semicolons();
        self.consume(TokenKind::Package)?;
        let package = self.consume_ident()?;

        let mut imports = Vec::new();
        loop {
            self.skip_semicolons();
            if !self.check(&TokenKind::Import) {
                break;
            }
            self.parse_import_decl(&mut imports)?;
        }

        Ok(SourceFile {
            package,
            imports,
            types: Vec::new(),
        })
    }

    /// Parses the composite literal whose type (or elided `{`) starts at token `index`
    pub fn parse_literal_at(&mut self, index: usize) -> Result<CompositeLiteral> {
        if index >= self.tokens.len() {
            return Err(Error::UnexpectedEof);
        }
        self.current = index;
        self.parse_composite_literal()
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> Result<()> {
        self.consume(TokenKind::Import)?;
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.check(&TokenKind::RightParen) {
                    self.advance();
                    break;
                }
                if self.is_at_end() {
                    return Err(Error::UnexpectedEof);
                }
                imports.push(self.parse_import_spec()?);
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec> {
        let alias = match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            TokenKind::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };

        let path = match &self.peek().kind {
            TokenKind::String(lit) | TokenKind::RawString(lit) => {
                let path = lit[1..lit.len() - 1].to_string();
                self.advance();
                path
            }
            _ => {
                return Err(self.expected_error(
                    "import path string",
                    Some("Import specs look like `alias \"path/to/pkg\"`."),
                ))
            }
        };

        Ok(ImportSpec { alias, path })
    }

    fn parse_type_decl(&mut self, types: &mut Vec<TypeSpec>) -> Result<()> {
        self.consume(TokenKind::Type)?;
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.check(&TokenKind::RightParen) {
                    self.advance();
                    break;
                }
                if self.is_at_end() {
                    return Err(Error::UnexpectedEof);
                }
                types.push(self.parse_type_spec()?);
            }
        } else {
            types.push(self.parse_type_spec()?);
        }
        Ok(())
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec> {
        let start = self.peek().span.start;
        let name = self.consume_ident()?;

        let type_params = if self.starts_type_params() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        let is_alias = self.check(&TokenKind::Assign);
        if is_alias {
            self.advance();
        }

        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            type_params,
            is_alias,
            ty,
            span: Span::new(start, self.previous_end()),
        })
    }

    /// `type T[P any] ...` as opposed to the array type in `type T [N]int`
    fn starts_type_params(&self) -> bool {
        self.check(&TokenKind::LeftBracket)
            && matches!(self.peek_at(1).kind, TokenKind::Ident(_))
            && !matches!(self.peek_at(2).kind, TokenKind::RightBracket)
    }

    /// Parameter names are the first identifier of every comma separated group
    fn parse_type_params(&mut self) -> Result<Vec<String>> {
        self.consume(TokenKind::LeftBracket)?;
        let mut names = Vec::new();
        let mut depth = 0usize;
        let mut group_start = true;

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Eof => return Err(Error::UnexpectedEof),
                TokenKind::RightBracket if depth == 0 => break,
                TokenKind::LeftBracket | TokenKind::LeftParen | TokenKind::LeftBrace => {
                    depth += 1
                }
                TokenKind::RightBracket | TokenKind::RightParen | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => {
                    group_start = true;
                    continue;
                }
                TokenKind::Ident(name) if group_start => names.push(name),
                _ => {}
            }
            group_start = false;
        }

        Ok(names)
    }

    /// Skips a declaration the filler does not care about (funcs, vars, consts)
    fn skip_declaration(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(Error::UnexpectedEof);
                    }
                    return Ok(());
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    if depth == 0 {
                        return Err(self.syntax_error("Unbalanced closing delimiter"));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Parses a type expression
    pub fn parse_type(&mut self) -> Result<TypeExpr> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                let (package, name) = if self.check(&TokenKind::Dot) {
                    self.advance();
                    (Some(name), self.consume_ident()?)
                } else {
                    (None, name)
                };
                let args = if self.check(&TokenKind::LeftBracket)
                    && !matches!(self.peek_at(1).kind, TokenKind::RightBracket)
                {
                    self.parse_type_args()?
                } else {
                    Vec::new()
                };
                Ok(TypeExpr::Named {
                    package,
                    name,
                    args,
                })
            }
            TokenKind::Star => {
                self.advance();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            TokenKind::LeftBracket => {
                self.advance();
                if self.check(&TokenKind::RightBracket) {
                    self.advance();
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let len_start = self.peek().span.start;
                self.skip_balanced_until(&TokenKind::RightBracket)?;
                let len = self.source[len_start..self.previous_end()].trim().to_string();
                self.consume(TokenKind::RightBracket)?;
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.parse_type()?),
                })
            }
            TokenKind::Map => {
                self.advance();
                self.consume(TokenKind::LeftBracket)?;
                let key = self.parse_type()?;
                self.consume(TokenKind::RightBracket)?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => {
                let start = self.advance().span.start;
                self.consume_balanced(TokenKind::LeftBrace, TokenKind::RightBrace)?;
                Ok(TypeExpr::Opaque(self.text_from(start)))
            }
            TokenKind::Func => {
                let start = self.advance().span.start;
                self.consume_balanced(TokenKind::LeftParen, TokenKind::RightParen)?;
                if self.check(&TokenKind::LeftParen) {
                    self.consume_balanced(TokenKind::LeftParen, TokenKind::RightParen)?;
                } else if self.starts_type() {
                    self.parse_type()?;
                }
                Ok(TypeExpr::Opaque(self.text_from(start)))
            }
            TokenKind::Chan => {
                let start = self.advance().span.start;
                if self.check(&TokenKind::Arrow) {
                    self.advance();
                }
                self.parse_type()?;
                Ok(TypeExpr::Opaque(self.text_from(start)))
            }
            TokenKind::Arrow => {
                let start = self.advance().span.start;
                self.consume(TokenKind::Chan)?;
                self.parse_type()?;
                Ok(TypeExpr::Opaque(self.text_from(start)))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.consume(TokenKind::RightParen)?;
                Ok(inner)
            }
            _ => Err(self.expected_error(
                "type",
                Some("A type is a name (`T`, `pkg.T`), `*T`, `[]T`, `[N]T`, `map[K]V` or `struct{...}`."),
            )),
        }
    }

    fn parse_type_args(&mut self) -> Result<Vec<TypeExpr>> {
        self.consume(TokenKind::LeftBracket)?;
        let mut args = vec![self.parse_type()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            if self.check(&TokenKind::RightBracket) {
                break;
            }
            args.push(self.parse_type()?);
        }
        self.consume(TokenKind::RightBracket)?;
        Ok(args)
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident(_)
                | TokenKind::Star
                | TokenKind::LeftBracket
                | TokenKind::Map
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Func
                | TokenKind::Chan
                | TokenKind::Arrow
        )
    }

    fn parse_struct_type(&mut self) -> Result<TypeExpr> {
        self.consume(TokenKind::Struct)?;
        self.consume(TokenKind::LeftBrace)?;

        let mut fields = Vec::new();
        loop {
            self.skip_semicolons();
            if self.check(&TokenKind::RightBrace) {
                self.advance();
                break;
            }
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            fields.push(self.parse_field_spec()?);
            if !self.check(&TokenKind::RightBrace) {
                self.consume(TokenKind::Semicolon)?;
            }
        }

        Ok(TypeExpr::Struct(fields))
    }

    fn parse_field_spec(&mut self) -> Result<FieldSpec> {
        let embedded = match self.peek().kind {
            TokenKind::Star => true,
            TokenKind::Ident(_) => matches!(
                self.peek_at(1).kind,
                TokenKind::Dot
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
                    | TokenKind::String(_)
                    | TokenKind::RawString(_)
            ),
            _ => {
                return Err(self.expected_error(
                    "field name or embedded type",
                    Some("Struct fields look like `Name Type` or an embedded `Type`."),
                ))
            }
        };

        let (names, ty) = if embedded {
            let ty = self.parse_type()?;
            let name = embedded_name(&ty).ok_or_else(|| {
                self.syntax_error(format!("Invalid embedded field type {}", ty))
            })?;
            (vec![name], ty)
        } else {
            let mut names = vec![self.consume_ident()?];
            while self.check(&TokenKind::Comma) {
                self.advance();
                names.push(self.consume_ident()?);
            }
            (names, self.parse_type()?)
        };

        let tag = match &self.peek().kind {
            TokenKind::String(lit) | TokenKind::RawString(lit) => {
                let tag = lit.clone();
                self.advance();
                Some(tag)
            }
            _ => None,
        };

        Ok(FieldSpec {
            names,
            ty,
            tag,
            embedded,
        })
    }

    // ========================================================================
    // Composite literals
    // ========================================================================

    fn parse_composite_literal(&mut self) -> Result<CompositeLiteral> {
        let start = self.peek().span.start;
        let ty = if self.check(&TokenKind::LeftBrace) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let type_text = ty.as_ref().map(|_| self.text_from(start));

        let open = self.consume(TokenKind::LeftBrace)?.span.end;
        let mut elements = Vec::new();
        let mut bounds = Vec::new();
        loop {
            self.skip_semicolons();
            if self.check(&TokenKind::RightBrace) {
                break;
            }
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            let element_start = self.peek().span.start;
            let (element, key_gap) = self.parse_element()?;
            elements.push(element);
            bounds.push(ElementBounds {
                start: element_start,
                key_gap,
                end: self.previous_end(),
            });
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.skip_semicolons();
                if !self.check(&TokenKind::RightBrace) {
                    return Err(self.expected_error(
                        "`,` or `}`",
                        Some("Composite literal elements are separated by commas."),
                    ));
                }
            }
        }
        let close = self.consume(TokenKind::RightBrace)?.span;
        let dangling = attach_comments(self.source, open, close.start, &mut elements, &bounds);

        Ok(CompositeLiteral {
            ty,
            type_text,
            elements,
            span: Span::new(start, close.end),
            text: self.source[start..close.end].to_string(),
            dangling,
        })
    }

    /// Parses one element; keyed elements also return the byte range between key and value
    fn parse_element(&mut self) -> Result<(Element, Option<(usize, usize)>)> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            if matches!(self.peek_at(1).kind, TokenKind::Colon) {
                let key = ElementKey::Field(name.clone());
                let key_end = self.advance().span.end;
                self.advance();
                let value_start = self.peek().span.start;
                let value = self.parse_element_value()?;
                return Ok((
                    Element {
                        key: Some(key),
                        value,
                        comments: Comments::default(),
                    },
                    Some((key_end, value_start)),
                ));
            }
        }

        let start = self.peek().span.start;
        let first = self.parse_element_value()?;
        if self.check(&TokenKind::Colon) {
            let key_end = self.previous_end();
            let key = ElementKey::Expr(self.source[start..key_end].to_string());
            self.advance();
            let value_start = self.peek().span.start;
            let value = self.parse_element_value()?;
            return Ok((
                Element {
                    key: Some(key),
                    value,
                    comments: Comments::default(),
                },
                Some((key_end, value_start)),
            ));
        }

        Ok((Element::positional(first), None))
    }

    fn parse_element_value(&mut self) -> Result<ValueExpr> {
        let checkpoint = self.current;

        let parsed = if self.check(&TokenKind::LeftBrace) {
            Some(ValueExpr::Composite(self.parse_composite_literal()?))
        } else if self.check(&TokenKind::Amp) && self.looks_like_literal(self.current + 1) {
            self.advance();
            Some(ValueExpr::AddressOf(Box::new(
                self.parse_composite_literal()?,
            )))
        } else if self.looks_like_literal(self.current) {
            Some(ValueExpr::Composite(self.parse_composite_literal()?))
        } else {
            None
        };

        // `T{}.Method()` and friends are expressions built on a literal, not literals
        if let Some(value) = parsed {
            if self.ends_element() {
                return Ok(value);
            }
            self.current = checkpoint;
        }

        self.capture_opaque()
    }

    /// Whether a type expression starting at `index` is directly followed by `{`
    fn looks_like_literal(&mut self, index: usize) -> bool {
        let saved = self.current;
        self.current = index;
        let result = match self.parse_type() {
            Ok(TypeExpr::Opaque(_)) => false,
            Ok(_) => self.check(&TokenKind::LeftBrace),
            Err(_) => false,
        };
        self.current = saved;
        result
    }

    fn ends_element(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Comma | TokenKind::RightBrace | TokenKind::Colon | TokenKind::Semicolon
        )
    }

    /// Captures an arbitrary expression as verbatim text, balanced over `()[]{}`
    fn capture_opaque(&mut self) -> Result<ValueExpr> {
        let start_index = self.current;
        let start = self.peek().span.start;
        let mut depth = 0usize;
        let mut spread = false;

        loop {
            match self.peek().kind {
                TokenKind::Eof => return Err(Error::UnexpectedEof),
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Comma | TokenKind::Colon | TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Ellipsis if depth == 0 => spread = true,
                _ => {}
            }
            self.advance();
        }

        if self.current == start_index {
            return Err(self.expected_error("expression", None));
        }

        let text = self.source[start..self.previous_end()].to_string();
        Ok(if spread {
            ValueExpr::Spread(text)
        } else {
            ValueExpr::Opaque(text)
        })
    }

    // Helper methods

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, distance: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + distance).min(last)]
    }

    fn advance(&mut self) -> Token {
        if self.is_at_end() {
            return self.peek().clone();
        }
        self.current += 1;
        self.tokens[self.current - 1].clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            let message = self.build_error_message(&kind, token);

            Err(Error::SyntaxError {
                line: token.line,
                col: token.column,
                message,
            })
        }
    }

    fn consume_ident(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => {
                let token = self.peek();
                Err(Error::SyntaxError {
                    line: token.line,
                    col: token.column,
                    message: self.build_error_message(&TokenKind::Ident(String::new()), token),
                })
            }
        }
    }

    fn skip_semicolons(&mut self) {
        while matches!(self.peek().kind, TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Consumes `open ... close`, including nested delimiters
    fn consume_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<()> {
        self.consume(open)?;
        self.skip_balanced_until(&close)?;
        self.consume(close)?;
        Ok(())
    }

    /// Advances to the next `close` at nesting depth zero without consuming it
    fn skip_balanced_until(&mut self, close: &TokenKind) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let kind = &self.peek().kind;
            if depth == 0 && kind == close {
                return Ok(());
            }
            match kind {
                TokenKind::Eof => return Err(Error::UnexpectedEof),
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    if depth == 0 {
                        return Err(self.syntax_error("Unbalanced closing delimiter"));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn previous_end(&self) -> usize {
        if self.current == 0 {
            return self.tokens[0].span.start;
        }
        self.tokens[self.current - 1].span.end
    }

    fn text_from(&self, start: usize) -> String {
        self.source[start..self.previous_end()].to_string()
    }

    /// Build a helpful error message
    fn build_error_message(&self, expected: &TokenKind, got: &Token) -> String {
        let expected_str = Self::token_kind_name(expected);
        let got_str = Self::token_kind_name(&got.kind);

        let mut message = format!("Expected {}, found {}", expected_str, got_str);

        let hint = match (expected, &got.kind) {
            (TokenKind::RightBrace, TokenKind::Eof) => {
                Some("Missing closing `}` for an earlier opening `{`.")
            }
            (TokenKind::RightBrace, _) => Some(
                "Elements of a composite literal must be separated by `,`.\n\
                      A trailing `,` is required when the closing `}` is on its own line.",
            ),
            (TokenKind::RightBracket, _) => Some("Missing closing `]` in a type expression."),
            (TokenKind::Ident(_), _) => Some(
                "Expected a name here.\n\
                      Valid identifiers start with a letter or underscore.",
            ),
            (TokenKind::Package, _) => Some("Go files start with a `package name` clause."),
            _ => None,
        };

        if let Some(hint) = hint {
            message.push_str("\n\nHelp: ");
            message.push_str(hint);
        }

        message
    }

    /// Get a human-readable name for a token kind
    fn token_kind_name(kind: &TokenKind) -> String {
        match kind {
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::LeftBracket => "`[`".to_string(),
            TokenKind::RightBracket => "`]`".to_string(),
            TokenKind::LeftBrace => "`{`".to_string(),
            TokenKind::RightBrace => "`}`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Semicolon => "end of statement".to_string(),
            TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::Imag(_) => "number".to_string(),
            TokenKind::String(_) | TokenKind::RawString(_) => "string".to_string(),
            TokenKind::Char(_) => "rune".to_string(),
            TokenKind::Ident(name) if name.is_empty() => "identifier".to_string(),
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Op(op) => format!("`{}`", op),
            TokenKind::Eof => "end of file".to_string(),
            kind if kind.is_keyword() => format!("keyword `{}`", format!("{:?}", kind).to_lowercase()),
            _ => format!("{:?}", kind),
        }
    }

    /// Helper to create a syntax error at current position
    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }

    /// Helper to create a syntax error with expected/got pattern
    fn expected_error(&self, expected: &str, hint: Option<&str>) -> Error {
        let token = self.peek();
        let got_str = Self::token_kind_name(&token.kind);

        let mut message = format!("Expected {}, found {}", expected, got_str);

        if let Some(hint) = hint {
            message.push_str("\n\nHelp: ");
            message.push_str(hint);
        }

        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message,
        }
    }
}

/// Field name of an embedded field: the type name without qualifier or pointer
/// Byte positions of a parsed element inside its literal
struct ElementBounds {
    start: usize,
    key_gap: Option<(usize, usize)>,
    end: usize,
}

/// Hands the comments between `open` and `close` to the elements they belong to
///
/// A comment on the same line after an element trails it; any other comment
/// leads the next element. Comments after the last element's line are returned.
fn attach_comments(
    source: &str,
    open: usize,
    close: usize,
    elements: &mut [Element],
    bounds: &[ElementBounds],
) -> Vec<String> {
    let mut dangling = Vec::new();
    let mut from = open;
    for i in 0..=elements.len() {
        let to = bounds.get(i).map_or(close, |b| b.start);
        for (comment, same_line) in comments_in(&source[from..to]) {
            if same_line && i > 0 {
                elements[i - 1].comments.trailing.push(comment);
            } else if let Some(element) = elements.get_mut(i) {
                element.comments.leading.push(comment);
            } else {
                dangling.push(comment);
            }
        }

        if let Some(bound) = bounds.get(i) {
            if let Some((key_end, value_start)) = bound.key_gap {
                for (comment, _) in comments_in(&source[key_end..value_start]) {
                    elements[i].comments.leading.push(comment);
                }
            }
            from = bound.end;
        }
    }
    dangling
}

/// Comments in a stretch of source holding only punctuation, whitespace and comments,
/// each flagged with whether it starts on the stretch's first line
fn comments_in(gap: &str) -> Vec<(String, bool)> {
    let mut comments = Vec::new();
    let mut same_line = true;
    let mut rest = gap;
    while let Some(at) = rest.find('/') {
        same_line &= !rest[..at].contains('\n');
        let tail = &rest[at..];
        let len = if tail.starts_with("//") {
            tail.find('\n').unwrap_or(tail.len())
        } else if tail.starts_with("/*") {
            tail[2..].find("*/").map_or(tail.len(), |end| end + 4)
        } else {
            1
        };
        if len > 1 {
            comments.push((tail[..len].trim_end().to_string(), same_line));
        }
        rest = &tail[len..];
    }
    comments
}

fn embedded_name(ty: &TypeExpr) -> Option<String> {
    match ty {
        TypeExpr::Named { name, .. } => Some(name.clone()),
        TypeExpr::Pointer(inner) => match inner.as_ref() {
            TypeExpr::Named { name, .. } => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_file(source: &str) -> SourceFile {
        GoParser::from_source(source).unwrap().parse_file().unwrap()
    }

    fn parse_literal(source: &str) -> CompositeLiteral {
        let mut parser = GoParser::from_source(source).unwrap();
        parser.parse_literal_at(0).unwrap()
    }

    #[test]
    fn test_parse_struct_with_tags() {
        let file = parse_file(
            "package main\n\ntype ddd struct {\n\tName    string `json:\"name,omitempty\"`\n\tAge     int\n}\n",
        );
        assert_eq!(file.package, "main");
        assert_eq!(file.types.len(), 1);
        let TypeExpr::Struct(fields) = &file.types[0].ty else {
            panic!("expected struct type");
        };
        assert_eq!(fields[0].names, vec!["Name"]);
        assert_eq!(fields[0].tag.as_deref(), Some("`json:\"name,omitempty\"`"));
        assert_eq!(fields[1].ty, TypeExpr::named("int"));
        assert_eq!(fields[1].tag, None);
    }

    #[test]
    fn test_parse_imports_and_skip_funcs() {
        let file = parse_file(
            r#"package main

import (
	"fmt"
	pb "gotest/pb/user"
	_ "embed"
)

import "strings"

func main() {
	d := ddd{Name: "x"}
	fmt.Println(d, strings.ToUpper("a"))
}

var x = map[string]int{"a": 1}

type T struct{ A, B int }
"#,
        );
        let paths: Vec<_> = file.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["fmt", "gotest/pb/user", "embed", "strings"]);
        assert_eq!(file.imports[1].local_name(), "pb");
        assert_eq!(file.types.len(), 1);
        let TypeExpr::Struct(fields) = &file.types[0].ty else {
            panic!("expected struct type");
        };
        assert_eq!(fields[0].names, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_embedded_and_complex_fields() {
        let file = parse_file(
            r#"package p
type (
	Base struct{}
	Node struct {
		Base
		*Other
		io.Reader
		Next     *Node
		Kids     []Node
		Grid     [3][2]int
		Index    map[string][]*Node
		OnChange func(old, new int) error
		Done     <-chan struct{}
		Any      interface{ Do() }
		Pair     Pair[int, string]
	}
	Alias = Node
	Gender int32
	Pair[K comparable, V any] struct { Key K; Val V }
)
"#,
        );
        assert_eq!(file.types.len(), 5);
        let TypeExpr::Struct(fields) = &file.types[1].ty else {
            panic!("expected struct type");
        };
        let names: Vec<_> = fields.iter().map(|f| f.names[0].as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Base", "Other", "Reader", "Next", "Kids", "Grid", "Index", "OnChange", "Done",
                "Any", "Pair"
            ]
        );
        assert!(fields[0].embedded && fields[1].embedded && fields[2].embedded);
        assert!(!fields[3].embedded);
        assert_eq!(fields[5].ty.to_string(), "[3][2]int");
        assert_eq!(fields[7].ty, TypeExpr::Opaque("func(old, new int) error".into()));
        assert_eq!(fields[8].ty, TypeExpr::Opaque("<-chan struct{}".into()));
        assert_eq!(fields[10].ty.to_string(), "Pair[int, string]");
        assert!(file.types[2].is_alias);
        assert_eq!(file.types[3].ty, TypeExpr::named("int32"));
        assert_eq!(file.types[4].type_params, vec!["K", "V"]);
    }

    #[test]
    fn test_array_type_decl_is_not_generic() {
        let file = parse_file("package p\ntype Buf [N]byte\n");
        assert!(file.types[0].type_params.is_empty());
        assert_eq!(file.types[0].ty.to_string(), "[N]byte");
    }

    #[test]
    fn test_parse_literal_keeps_value_text() {
        let lit = parse_literal("User{Address: \"bei\" + \"jing\", Name: f(a, b), Age: 1 << 2}");
        assert_eq!(lit.type_text.as_deref(), Some("User"));
        assert_eq!(lit.field_names(), vec!["Address", "Name", "Age"]);
        assert_eq!(
            lit.field("Address"),
            Some(&ValueExpr::opaque("\"bei\" + \"jing\""))
        );
        assert_eq!(lit.field("Name"), Some(&ValueExpr::opaque("f(a, b)")));
        assert_eq!(lit.field("Age"), Some(&ValueExpr::opaque("1 << 2")));
        assert_eq!(lit.span, Span::new(0, lit.text.len()));
    }

    #[test]
    fn test_parse_nested_literals() {
        let lit = parse_literal(
            "ListNode{\n\tVal: 0,\n\tNext: &ListNode{\n\t\tVal: 5,\n\t},\n\tKids: []ListNode{{Val: 1}, {}},\n}",
        );
        let Some(ValueExpr::AddressOf(next)) = lit.field("Next") else {
            panic!("expected address-of literal");
        };
        assert_eq!(next.type_text.as_deref(), Some("ListNode"));
        assert_eq!(next.field("Val"), Some(&ValueExpr::opaque("5")));

        let Some(ValueExpr::Composite(kids)) = lit.field("Kids") else {
            panic!("expected slice literal");
        };
        assert_eq!(kids.elements.len(), 2);
        let ValueExpr::Composite(first) = &kids.elements[0].value else {
            panic!("expected elided literal");
        };
        assert_eq!(first.ty, None);
        assert_eq!(first.text, "{Val: 1}");
    }

    #[test]
    fn test_parse_map_keys() {
        let lit = parse_literal("map[string]ddd{\"name\": ddd{Age: 1}, key: {}}");
        assert_eq!(
            lit.elements[0].key,
            Some(ElementKey::Expr("\"name\"".into()))
        );
        assert_eq!(lit.elements[1].key, Some(ElementKey::Field("key".into())));
    }

    #[test]
    fn test_literal_followed_by_selector_is_opaque() {
        let lit = parse_literal("T{A: Point{1, 2}.Scale(3), B: &x, C: xs...}");
        assert_eq!(lit.field("A"), Some(&ValueExpr::opaque("Point{1, 2}.Scale(3)")));
        assert_eq!(lit.field("B"), Some(&ValueExpr::opaque("&x")));
        assert_eq!(lit.field("C"), Some(&ValueExpr::Spread("xs...".into())));
    }

    #[test]
    fn test_func_literal_value_is_opaque() {
        let lit = parse_literal("T{F: func() int { return 1 }, G: 2}");
        assert_eq!(
            lit.field("F"),
            Some(&ValueExpr::opaque("func() int { return 1 }"))
        );
        assert_eq!(lit.field("G"), Some(&ValueExpr::opaque("2")));
    }

    #[test]
    fn test_comments_attach_to_elements() {
        let lit = parse_literal(
            "T{ // opening\n\tA: 1, // one\n\t// about b\n\tB: /* inline */ 2 /* two */,\n\tC: 3,\n\t// closing\n}",
        );
        assert_eq!(lit.field_names(), vec!["A", "B", "C"]);
        assert_eq!(lit.elements[0].comments.leading, vec!["// opening"]);
        assert_eq!(lit.elements[0].comments.trailing, vec!["// one"]);
        assert_eq!(
            lit.elements[1].comments.leading,
            vec!["// about b", "/* inline */"]
        );
        assert_eq!(lit.elements[1].comments.trailing, vec!["/* two */"]);
        assert!(lit.elements[2].comments.is_empty());
        assert_eq!(lit.dangling, vec!["// closing"]);
        assert_eq!(lit.field("B"), Some(&ValueExpr::opaque("2")));
    }

    #[test]
    fn test_comment_only_literal_is_dangling() {
        let lit = parse_literal("T{\n\t// nothing yet\n}");
        assert!(lit.elements.is_empty());
        assert_eq!(lit.dangling, vec!["// nothing yet"]);
        assert!(lit.has_comments());
    }

    #[test]
    fn test_missing_comma_is_reported() {
        let mut parser = GoParser::from_source("T{\n\tA: 1\n\tB: 2,\n}").unwrap();
        let err = parser.parse_literal_at(0).unwrap_err();
        assert!(err.to_string().contains("Expected `,` or `}`"));
    }
}
