//! Load-time error types for rule expressions.
//!
//! Both taxonomies are fatal for the single rule being compiled -- the
//! profile loader excludes that rule and reports the error to the profile
//! author; no partial token stream or AST is ever returned.

use serde::Serialize;

/// Errors produced while tokenizing a rule expression.
///
/// Offsets are byte offsets into the expression string as it appeared in
/// the profile, which is what profile-authoring feedback surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum LexError {
    /// A string literal was opened but the closing quote never appeared.
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    /// A regex literal was opened but the closing `/` never appeared.
    #[error("unterminated regex literal starting at offset {offset}")]
    UnterminatedRegex { offset: usize },

    /// A character that cannot start any token.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    /// A numeric literal that does not parse (e.g. exponent with no digits).
    #[error("invalid numeric literal '{literal}' at offset {offset}")]
    InvalidNumber { literal: String, offset: usize },
}

/// Errors produced while parsing a token stream into an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum ParseError {
    /// The parser required one construct and found another.
    #[error("expected {expected}, got {found} at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    /// The token stream ended mid-expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A complete expression was parsed but input remained.
    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },

    /// Tokenization failed before parsing began.
    #[error(transparent)]
    Lex(#[from] LexError),
}
