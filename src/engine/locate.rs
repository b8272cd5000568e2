//! Finding composite literals in a Go file
//!
//! A `{` opens a composite literal when a literal type ends right before it
//! (`T`, `pkg.T`, `T[int]`, `[]T`, `[N]T`, `map[K]V`) and that type sits in
//! an expression position. Function bodies, blocks and type declarations are
//! never mistaken for literals.

use crate::error::{Error, Result};
use crate::lexer::{GoScanner, Token, TokenKind};
use crate::parser::{CompositeLiteral, GoParser};
use tracing::debug;

/// Innermost typed composite literal whose text contains `offset`
///
/// Elided element literals (`{...}` inside a container) are not typed; the
/// container holding them is returned instead.
pub fn literal_at(source: &str, offset: usize) -> Result<CompositeLiteral> {
    let tokens = GoScanner::new(source).scan_tokens()?;
    let candidates = typed_literal_starts(&tokens);

    let innermost = candidates
        .iter()
        .filter(|(start, close)| {
            tokens[*start].span.start <= offset && offset <= tokens[*close].span.end
        })
        .max_by_key(|(start, _)| tokens[*start].span.start);

    let Some(&(start, _)) = innermost else {
        let (line, col) = line_col(source, offset);
        return Err(Error::LiteralNotFound { line, col });
    };

    GoParser::new(source, tokens).parse_literal_at(start)
}

/// Every typed composite literal not nested in another one, in source order
///
/// Candidates that fail to parse are skipped.
pub fn outermost_literals(source: &str) -> Result<Vec<CompositeLiteral>> {
    let tokens = GoScanner::new(source).scan_tokens()?;
    let mut candidates = typed_literal_starts(&tokens);
    candidates.sort_by_key(|(start, _)| *start);

    let mut parser = GoParser::new(source, tokens);
    let mut literals = Vec::new();
    let mut covered_until = 0usize;

    for (start, close) in candidates {
        let (start_offset, line) = {
            let token = &parser.tokens()[start];
            (token.span.start, token.line)
        };
        if start_offset < covered_until {
            continue;
        }
        match parser.parse_literal_at(start) {
            Ok(literal) => {
                covered_until = parser.tokens()[close].span.end;
                literals.push(literal);
            }
            Err(e) => {
                debug!(line, error = %e, "Skipping literal candidate");
            }
        }
    }

    Ok(literals)
}

/// 1-indexed line and column of a byte offset
///
/// An offset inside a multibyte character counts as that character.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].chars().count() + 1)
}

/// Largest char boundary at or below `offset`, clamped to the source length
pub(crate) fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// `(type start token, closing brace token)` of every typed literal
fn typed_literal_starts(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut found = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LeftBrace => open.push(idx),
            TokenKind::RightBrace => {
                if let Some(brace) = open.pop() {
                    if let Some(start) = literal_type_start(tokens, brace) {
                        found.push((start, idx));
                    }
                }
            }
            _ => {}
        }
    }

    found
}

/// Start of the literal type ending right before the `{` at `brace`
fn literal_type_start(tokens: &[Token], brace: usize) -> Option<usize> {
    if brace == 0 {
        return None;
    }
    let last = brace - 1;

    let mut start = match tokens[last].kind {
        TokenKind::Ident(_) => qualified_start(tokens, last),
        // Generic instantiation `T[int]{`
        TokenKind::RightBracket => {
            let open = matching_open(tokens, last)?;
            if open == 0 || !matches!(tokens[open - 1].kind, TokenKind::Ident(_)) {
                return None;
            }
            qualified_start(tokens, open - 1)
        }
        _ => return None,
    };
    let mut bare_name = true;

    // `[]`, `[N]`, `map[K]` and `*` prefixes
    loop {
        if start == 0 {
            break;
        }
        match tokens[start - 1].kind {
            TokenKind::Star if start >= 2 && tokens[start - 2].kind == TokenKind::RightBracket => {
                start -= 1;
            }
            TokenKind::RightBracket => {
                let open = matching_open(tokens, start - 1)?;
                start = if open > 0 && tokens[open - 1].kind == TokenKind::Map {
                    open - 1
                } else {
                    open
                };
                bare_name = false;
            }
            _ => break,
        }
    }

    if start > 0 && !in_expression_position(&tokens[start - 1].kind) {
        return None;
    }
    if bare_name && in_statement_header(tokens, start) {
        return None;
    }
    Some(start)
}

fn qualified_start(tokens: &[Token], ident: usize) -> usize {
    if ident >= 2
        && tokens[ident - 1].kind == TokenKind::Dot
        && matches!(tokens[ident - 2].kind, TokenKind::Ident(_))
    {
        ident - 2
    } else {
        ident
    }
}

fn matching_open(tokens: &[Token], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for idx in (0..=close).rev() {
        match tokens[idx].kind {
            TokenKind::RightBracket => depth += 1,
            TokenKind::LeftBracket => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Tokens after which an operand may start
fn in_expression_position(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Assign
            | TokenKind::Define
            | TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::LeftBrace
            | TokenKind::Comma
            | TokenKind::Colon
            | TokenKind::Amp
            | TokenKind::Arrow
            | TokenKind::Return
            | TokenKind::Range
            | TokenKind::Case
            | TokenKind::Semicolon
            | TokenKind::Op(_)
    )
}

/// Whether a bare type name at `start` sits unparenthesized in an
/// `if`/`for`/`switch` header, where Go reads its `{` as the block
fn in_statement_header(tokens: &[Token], start: usize) -> bool {
    let mut depth = 0usize;
    for idx in (0..start).rev() {
        match &tokens[idx].kind {
            TokenKind::RightParen | TokenKind::RightBracket => depth += 1,
            TokenKind::LeftParen | TokenKind::LeftBracket => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            TokenKind::If | TokenKind::For | TokenKind::Switch | TokenKind::Select if depth == 0 => {
                return true
            }
            TokenKind::LeftBrace | TokenKind::RightBrace => return false,
            // Only line ends terminate the statement; `;` also separates header clauses
            TokenKind::Semicolon if tokens[idx].lexeme != ";" => return false,
            _ => {}
        }
    }
    false
}
