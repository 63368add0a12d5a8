//! probo-core: rule expression language for PDF conformance profiles.
//!
//! Provides the load-time half of the rule engine: tokenizing a rule's
//! test expression, parsing it into an immutable expression tree, and
//! printing that tree back to canonical source. Evaluation lives in
//! probo-eval.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`parse_expression()`] -- tokenize and parse one rule expression
//! - [`Expr`] -- the expression tree, reused read-only per evaluation
//! - [`LexError`] / [`ParseError`] -- load-time diagnostics
//!
//! The lexer's [`lex()`] entry point is also exported for callers that
//! want token-level inspection.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use error::{LexError, ParseError};
pub use lexer::{lex, Spanned, Token};
pub use parser::{parse, parse_expression};
