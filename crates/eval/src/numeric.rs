//! Numeric model for the rule evaluator.
//!
//! Integer and real operands mix freely in profile expressions
//! (`widthFromFontProgram - widthFromDictionary` subtracts a real from
//! an integer). All mixed arithmetic and all Int/Real comparisons are
//! performed in `f64`; pure-integer arithmetic stays in `i64` with
//! checked operations that degrade to `f64` on overflow rather than
//! wrapping.

use probo_core::ast::BinaryOp;

use crate::types::{EvalError, PropertyValue};

/// A numeric operand, extracted from a [`PropertyValue`].
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Real(f64),
}

impl Num {
    fn as_real(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Real(r) => r,
        }
    }
}

fn as_num(v: &PropertyValue) -> Option<Num> {
    match v {
        PropertyValue::Int(n) => Some(Num::Int(*n)),
        PropertyValue::Real(r) => Some(Num::Real(*r)),
        _ => None,
    }
}

fn operands(
    op: BinaryOp,
    left: &PropertyValue,
    right: &PropertyValue,
) -> Result<(Num, Num), EvalError> {
    match (as_num(left), as_num(right)) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(EvalError::TypeMismatch {
            message: format!(
                "'{}' requires numeric operands, got {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
        }),
    }
}

// ──────────────────────────────────────────────
// Arithmetic
// ──────────────────────────────────────────────

/// Evaluate `+`, `-`, `*`, `/` or `%` on two property values.
pub fn arithmetic(
    op: BinaryOp,
    left: &PropertyValue,
    right: &PropertyValue,
) -> Result<PropertyValue, EvalError> {
    let (l, r) = operands(op, left, right)?;
    match op {
        BinaryOp::Add => Ok(int_or_real(l, r, i64::checked_add, |a, b| a + b)),
        BinaryOp::Sub => Ok(int_or_real(l, r, i64::checked_sub, |a, b| a - b)),
        BinaryOp::Mul => Ok(int_or_real(l, r, i64::checked_mul, |a, b| a * b)),
        BinaryOp::Div => divide(l, r),
        BinaryOp::Rem => remainder(l, r),
        other => Err(EvalError::TypeMismatch {
            message: format!("'{}' is not an arithmetic operator", other.symbol()),
        }),
    }
}

/// Int/Int stays Int via the checked op (degrading to Real on i64
/// overflow); any Real operand computes in f64.
fn int_or_real(
    l: Num,
    r: Num,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> PropertyValue {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => match int_op(a, b) {
            Some(n) => PropertyValue::Int(n),
            None => PropertyValue::Real(real_op(a as f64, b as f64)),
        },
        _ => PropertyValue::Real(real_op(l.as_real(), r.as_real())),
    }
}

/// `/` yields Int only for an exact Int/Int quotient; everything else
/// is computed as Real so `width / 2` keeps its fraction.
fn divide(l: Num, r: Num) -> Result<PropertyValue, EvalError> {
    if let (Num::Int(a), Num::Int(b)) = (l, r) {
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        if a % b == 0 {
            return Ok(PropertyValue::Int(a / b));
        }
        return Ok(PropertyValue::Real(a as f64 / b as f64));
    }
    let divisor = r.as_real();
    if divisor == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(PropertyValue::Real(l.as_real() / divisor))
}

fn remainder(l: Num, r: Num) -> Result<PropertyValue, EvalError> {
    if let (Num::Int(a), Num::Int(b)) = (l, r) {
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        return Ok(PropertyValue::Int(a % b));
    }
    let divisor = r.as_real();
    if divisor == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(PropertyValue::Real(l.as_real() % divisor))
}

/// Unary numeric negation.
pub fn negate(operand: &PropertyValue) -> Result<PropertyValue, EvalError> {
    match operand {
        PropertyValue::Int(n) => match n.checked_neg() {
            Some(neg) => Ok(PropertyValue::Int(neg)),
            None => Ok(PropertyValue::Real(-(*n as f64))),
        },
        PropertyValue::Real(r) => Ok(PropertyValue::Real(-r)),
        other => Err(EvalError::TypeMismatch {
            message: format!("unary '-' requires a numeric operand, got {}", other.type_name()),
        }),
    }
}

// ──────────────────────────────────────────────
// Comparison
// ──────────────────────────────────────────────

/// Relational comparison (`<`, `<=`, `>`, `>=`). Numeric operands only.
pub fn relational(
    op: BinaryOp,
    left: &PropertyValue,
    right: &PropertyValue,
) -> Result<bool, EvalError> {
    let (l, r) = operands(op, left, right)?;
    match (l, r) {
        // Keep exact integer ordering when both sides are Int
        (Num::Int(a), Num::Int(b)) => compare_with(op, a, b),
        _ => compare_with(op, l.as_real(), r.as_real()),
    }
}

fn compare_with<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> Result<bool, EvalError> {
    Ok(match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        other => {
            return Err(EvalError::TypeMismatch {
                message: format!("'{}' is not a relational operator", other.symbol()),
            });
        }
    })
}

/// Loose equality: null equals only null, Int and Real promote and
/// compare numerically, strings compare exactly, arrays compare
/// structurally. Mismatched non-numeric kinds are unequal, never an
/// error -- the permissive style the profiles are written in.
pub fn loose_eq(left: &PropertyValue, right: &PropertyValue) -> bool {
    match (left, right) {
        (PropertyValue::Null, PropertyValue::Null) => true,
        (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
        (PropertyValue::Str(a), PropertyValue::Str(b)) => a == b,
        (PropertyValue::Array(a), PropertyValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| loose_eq(x, y))
        }
        (l, r) => match (as_num(l), as_num(r)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => a.as_real() == b.as_real(),
            _ => false,
        },
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
