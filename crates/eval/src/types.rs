//! Runtime value types and evaluation context for the rule evaluator.
//!
//! These types are DISTINCT from probo-core AST types. The feature
//! extraction layer produces an [`EvaluationContext`] per PDF object;
//! the evaluator walks the cached expression tree against it and
//! returns a [`PropertyValue`].

use serde::Serialize;
use std::collections::BTreeMap;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that can occur during expression evaluation.
///
/// All of these are recovered at single-rule granularity: the owning
/// rule reports an Indeterminate verdict and the rest of the document's
/// checks proceed. Missing-property lookups and out-of-range indexing
/// are deliberately NOT errors (they evaluate to null).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum EvalError {
    /// An operator or built-in received operands of the wrong type.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Division or modulo with a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// A method name with no entry in the built-in table for the
    /// receiver's type.
    #[error("unknown function '{name}' on {receiver}")]
    UnknownFunction { name: String, receiver: String },

    /// An index expression that did not evaluate to an integer.
    #[error("index must be an integer, got {got}")]
    IndexType { got: String },

    /// The per-evaluation depth or step budget ran out.
    #[error("evaluation budget exceeded: {what} limit of {limit}")]
    BudgetExceeded { what: String, limit: u64 },

    /// A regex literal whose pattern or flags the regex engine rejects.
    #[error("invalid regex /{pattern}/: {message}")]
    RegexCompile { pattern: String, message: String },
}

// ──────────────────────────────────────────────
// Property values
// ──────────────────────────────────────────────

/// The tagged value type flowing through the engine.
///
/// Arrays may mix element types. Numeric comparisons between `Int` and
/// `Real` are performed in real arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Int(_) => "integer",
            PropertyValue::Real(_) => "real",
            PropertyValue::Str(_) => "string",
            PropertyValue::Array(_) => "array",
        }
    }

    /// The truthiness rule applied in logical and ternary contexts, and
    /// when coercing a rule's final value to a verdict: null, false,
    /// zero, the empty string, and the empty array are false; everything
    /// else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Null => false,
            PropertyValue::Bool(b) => *b,
            PropertyValue::Int(n) => *n != 0,
            PropertyValue::Real(r) => *r != 0.0,
            PropertyValue::Str(s) => !s.is_empty(),
            PropertyValue::Array(items) => !items.is_empty(),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<f64> for PropertyValue {
    fn from(r: f64) -> Self {
        PropertyValue::Real(r)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(items)
    }
}

// ──────────────────────────────────────────────
// Evaluation context
// ──────────────────────────────────────────────

/// The property snapshot of one PDF object, supplied fresh per
/// evaluation by the feature-extraction layer. Case-sensitive keys;
/// read-only from the engine's perspective.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationContext(pub BTreeMap<String, PropertyValue>);

impl EvaluationContext {
    pub fn new() -> Self {
        EvaluationContext(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }
}

impl From<BTreeMap<String, PropertyValue>> for EvaluationContext {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        EvaluationContext(map)
    }
}

impl FromIterator<(String, PropertyValue)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        EvaluationContext(iter.into_iter().collect())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
