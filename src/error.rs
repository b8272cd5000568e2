//! Error types for gofill

use thiserror::Error;

/// Literal fill errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Parse errors
    /// Syntax error encountered while parsing Go source
    ///
    /// **Triggered by:** malformed declarations or literals (unbalanced braces, missing types)
    /// **Example:** `type T struct { Name }` followed by end of file
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// General parse error (mostly lexical)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unexpected end of file during parsing
    #[error("Unexpected end of file")]
    UnexpectedEof,

    /// No composite literal encloses the requested cursor position
    #[error("No composite literal at line {line}, column {col}")]
    LiteralNotFound {
        /// Cursor line (1-indexed)
        line: usize,
        /// Cursor column (1-indexed)
        col: usize,
    },

    // Resolution errors
    /// The literal's type, or a nested field's type, could not be resolved
    ///
    /// **Triggered by:** a type name that is not declared in its package, or an import
    /// path the source provider cannot load
    /// **Example:** `user.Profile{}` when package `user` has no `Profile`
    #[error("Type not found: {name} (in {scope})")]
    TypeNotFound {
        /// Scope (import path) the type was looked up in
        scope: String,
        /// Type name
        name: String,
    },

    /// The same field name appears twice in an authored literal
    #[error("Duplicate field {field} in {type_name} literal")]
    DuplicateFieldKey {
        /// Literal type name
        type_name: String,
        /// Repeated field name
        field: String,
    },

    /// An authored key does not match any declared field
    ///
    /// **Triggered by:** renamed or removed fields, typos
    /// **Example:** `User{Nmae: "x"}`
    #[error("Unknown field {field} in {type_name} literal")]
    UnresolvableFieldName {
        /// Literal type name
        type_name: String,
        /// Authored key
        field: String,
        /// Declared field names - not shown in base error message
        #[doc(hidden)]
        declared: Vec<String>,
    },

    /// A value-type field chain revisits a type without passing through a pointer
    #[error("Type {} has no finite zero value: {}", .path.last().map(String::as_str).unwrap_or("?"), .path.join(" -> "))]
    CyclicNonPointerComposite {
        /// Chain of record types, ending with the repeated one
        path: Vec<String>,
    },

    /// The literal uses a construct that cannot be preserved as an opaque value
    ///
    /// **Triggered by:** positional struct elements, spread values (`xs...`), composite
    /// literals of non-composite types
    #[error("Unsupported expression shape: {0}")]
    UnsupportedExpressionShape(String),

    /// A declaring scope changed while the request was running
    #[error("Source of {scope} changed during normalization")]
    StaleSource {
        /// Scope whose epoch moved
        scope: String,
    },

    // Collaborator errors
    /// Reading sources failed
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File or directory path
        path: String,
        /// Underlying error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker pool failure during batch fills
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The request cannot produce a patch
    Fatal,
    /// The request may succeed if retried against fresh input
    Recoverable,
    /// The literal is left untouched; callers may skip silently
    Warning,
}

impl Error {
    /// Create a syntax error at a position
    pub fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        Error::SyntaxError {
            line,
            col,
            message: message.into(),
        }
    }

    /// Create an unsupported shape error with a message
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedExpressionShape(msg.into())
    }

    /// Create an I/O error for a path
    pub fn io(path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::TypeNotFound { .. } => ErrorSeverity::Fatal,
            Error::CyclicNonPointerComposite { .. } => ErrorSeverity::Fatal,
            Error::SyntaxError { .. } => ErrorSeverity::Fatal,
            Error::UnexpectedEof => ErrorSeverity::Fatal,
            Error::Config(_) => ErrorSeverity::Fatal,

            Error::StaleSource { .. } => ErrorSeverity::Recoverable,
            Error::Io { .. } => ErrorSeverity::Recoverable,
            Error::RuntimeError(_) => ErrorSeverity::Recoverable,

            Error::DuplicateFieldKey { .. } => ErrorSeverity::Warning,
            Error::UnresolvableFieldName { .. } => ErrorSeverity::Warning,
            Error::UnsupportedExpressionShape(_) => ErrorSeverity::Warning,
            Error::LiteralNotFound { .. } => ErrorSeverity::Warning,

            _ => ErrorSeverity::Fatal,
        }
    }

    /// Get enhanced error message with declared fields (for UnresolvableFieldName errors)
    pub fn enhanced_message(&self) -> String {
        match self {
            Error::UnresolvableFieldName {
                type_name,
                field,
                declared,
            } => {
                let base = format!("Unknown field {} in {} literal", field, type_name);
                if declared.is_empty() {
                    return base;
                }
                let lowered = field.to_lowercase();
                if let Some(close) = declared.iter().find(|d| d.to_lowercase() == lowered) {
                    return format!("{}. Did you mean {}?", base, close);
                }
                format!("{}. {} declares: [{}]", base, type_name, declared.join(", "))
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for gofill operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_path() {
        let err = Error::CyclicNonPointerComposite {
            path: vec!["main.A".into(), "main.B".into(), "main.A".into()],
        };
        assert_eq!(
            err.to_string(),
            "Type main.A has no finite zero value: main.A -> main.B -> main.A"
        );
        assert_eq!(err.classify(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_enhanced_message_suggests_case_insensitive_match() {
        let err = Error::UnresolvableFieldName {
            type_name: "User".into(),
            field: "name".into(),
            declared: vec!["Name".into(), "Age".into()],
        };
        assert_eq!(
            err.enhanced_message(),
            "Unknown field name in User literal. Did you mean Name?"
        );
    }

    #[test]
    fn test_enhanced_message_lists_fields() {
        let err = Error::UnresolvableFieldName {
            type_name: "User".into(),
            field: "Nick".into(),
            declared: vec!["Name".into(), "Age".into()],
        };
        assert_eq!(
            err.enhanced_message(),
            "Unknown field Nick in User literal. User declares: [Name, Age]"
        );
        assert_eq!(err.classify(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_stale_source_is_recoverable() {
        let err = Error::StaleSource {
            scope: "example.com/app".into(),
        };
        assert_eq!(err.classify(), ErrorSeverity::Recoverable);
    }
}
