//! Tree-walking expression evaluator.
//!
//! Walks the cached expression tree against a per-object property
//! context. No mutation of inputs, no state across calls; every walk
//! carries its own [`Budget`] so concurrent evaluations of one shared
//! tree never interfere.
//!
//! Identifier resolution is deliberately permissive: a name bound by an
//! enclosing predicate wins, then the evaluation context, and a missing
//! key evaluates to null rather than erroring -- profile rules lean on
//! this (`Alt != null`) for optional PDF attributes.

use std::collections::BTreeMap;

use probo_core::ast::{BinaryOp, Expr, Literal, UnaryOp};

use crate::limits::{Budget, EvalLimits};
use crate::methods;
use crate::numeric;
use crate::types::{EvalError, EvaluationContext, PropertyValue};

/// Evaluate an expression tree against a property context.
///
/// This is the typed entry point; rule-level callers usually want
/// [`crate::rules::CompiledRule::evaluate`], which coerces the result
/// to a verdict and absorbs evaluation errors.
pub fn evaluate(
    expr: &Expr,
    ctx: &EvaluationContext,
    limits: EvalLimits,
) -> Result<PropertyValue, EvalError> {
    let mut budget = Budget::new(limits);
    eval_expr(expr, ctx, &Scope::new(), &mut budget, 0)
}

// ──────────────────────────────────────────────
// Predicate scope
// ──────────────────────────────────────────────

/// Bound variables from enclosing predicate arguments, layered over
/// (not replacing) the evaluation context.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    bindings: BTreeMap<String, PropertyValue>,
}

impl Scope {
    pub(crate) fn new() -> Self {
        Scope {
            bindings: BTreeMap::new(),
        }
    }

    /// A child scope with one extra binding, used per filter element.
    pub(crate) fn child(&self, param: &str, value: PropertyValue) -> Self {
        let mut child = self.clone();
        child.bindings.insert(param.to_owned(), value);
        child
    }

    fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.bindings.get(name)
    }
}

// ──────────────────────────────────────────────
// Walker
// ──────────────────────────────────────────────

pub(crate) fn eval_expr(
    expr: &Expr,
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    budget.visit(depth)?;

    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),

        Expr::Ident(name) => Ok(scope
            .get(name)
            .or_else(|| ctx.get(name))
            .cloned()
            .unwrap_or(PropertyValue::Null)),

        Expr::Member { base, name } => {
            let value = eval_expr(base, ctx, scope, budget, depth + 1)?;
            Ok(member(&value, name))
        }

        Expr::Index { base, index } => {
            let value = eval_expr(base, ctx, scope, budget, depth + 1)?;
            let idx = eval_expr(index, ctx, scope, budget, depth + 1)?;
            index_value(&value, &idx)
        }

        Expr::Call { callee, args } => eval_call(callee, args, ctx, scope, budget, depth),

        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, ctx, scope, budget, depth + 1)?;
            match op {
                UnaryOp::Not => Ok(PropertyValue::Bool(!value.is_truthy())),
                UnaryOp::Neg => numeric::negate(&value),
            }
        }

        Expr::Binary { op, left, right } => eval_binary(*op, left, right, ctx, scope, budget, depth),

        Expr::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            // Exactly one branch runs; the untaken branch may reference
            // data that would raise on this object
            let cond = eval_expr(cond, ctx, scope, budget, depth + 1)?;
            if cond.is_truthy() {
                eval_expr(then_branch, ctx, scope, budget, depth + 1)
            } else {
                eval_expr(else_branch, ctx, scope, budget, depth + 1)
            }
        }

        Expr::Regex { .. } => Err(EvalError::TypeMismatch {
            message: "a regex literal is only usable as the receiver of test()".to_owned(),
        }),

        Expr::Predicate { .. } => Err(EvalError::TypeMismatch {
            message: "a predicate is only allowed as the argument of filter, some or every"
                .to_owned(),
        }),
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    match op {
        // Short-circuit logical operators; the result is always a
        // boolean, never the last operand, so verdicts stay unambiguous
        BinaryOp::And => {
            let l = eval_expr(left, ctx, scope, budget, depth + 1)?;
            if !l.is_truthy() {
                return Ok(PropertyValue::Bool(false));
            }
            let r = eval_expr(right, ctx, scope, budget, depth + 1)?;
            Ok(PropertyValue::Bool(r.is_truthy()))
        }
        BinaryOp::Or => {
            let l = eval_expr(left, ctx, scope, budget, depth + 1)?;
            if l.is_truthy() {
                return Ok(PropertyValue::Bool(true));
            }
            let r = eval_expr(right, ctx, scope, budget, depth + 1)?;
            Ok(PropertyValue::Bool(r.is_truthy()))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let l = eval_expr(left, ctx, scope, budget, depth + 1)?;
            let r = eval_expr(right, ctx, scope, budget, depth + 1)?;
            let eq = numeric::loose_eq(&l, &r);
            Ok(PropertyValue::Bool(if op == BinaryOp::Eq { eq } else { !eq }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let l = eval_expr(left, ctx, scope, budget, depth + 1)?;
            let r = eval_expr(right, ctx, scope, budget, depth + 1)?;
            Ok(PropertyValue::Bool(numeric::relational(op, &l, &r)?))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let l = eval_expr(left, ctx, scope, budget, depth + 1)?;
            let r = eval_expr(right, ctx, scope, budget, depth + 1)?;
            numeric::arithmetic(op, &l, &r)
        }
    }
}

fn eval_call(
    callee: &Expr,
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    let Expr::Member { base, name } = callee else {
        return Err(EvalError::TypeMismatch {
            message: "only method calls are supported".to_owned(),
        });
    };

    // `Math` is a namespace, not a context property
    if matches!(base.as_ref(), Expr::Ident(ns) if ns == "Math") {
        return methods::math_call(name, args, ctx, scope, budget, depth);
    }

    if let Expr::Regex { pattern, flags } = base.as_ref() {
        return methods::regex_call(pattern, flags, name, args, ctx, scope, budget, depth);
    }

    let receiver = eval_expr(base, ctx, scope, budget, depth + 1)?;
    methods::dispatch(&receiver, name, args, ctx, scope, budget, depth)
}

fn literal_value(lit: &Literal) -> PropertyValue {
    match lit {
        Literal::Null => PropertyValue::Null,
        Literal::Bool(b) => PropertyValue::Bool(*b),
        Literal::Int(n) => PropertyValue::Int(*n),
        Literal::Real(r) => PropertyValue::Real(*r),
        Literal::Str(s) => PropertyValue::Str(s.clone()),
    }
}

/// Built-in member access. `.length` on strings counts Unicode scalar
/// values; any other member on any value is null, mirroring the
/// missing-property rule.
fn member(value: &PropertyValue, name: &str) -> PropertyValue {
    match (value, name) {
        (PropertyValue::Str(s), "length") => PropertyValue::Int(s.chars().count() as i64),
        (PropertyValue::Array(items), "length") => PropertyValue::Int(items.len() as i64),
        _ => PropertyValue::Null,
    }
}

/// Indexing. Out-of-range and negative indices are null (permissive);
/// a non-integer index is an error because it marks a buggy rule rather
/// than absent document data.
fn index_value(value: &PropertyValue, idx: &PropertyValue) -> Result<PropertyValue, EvalError> {
    let PropertyValue::Int(i) = idx else {
        return Err(EvalError::IndexType {
            got: idx.type_name().to_owned(),
        });
    };
    if *i < 0 {
        return Ok(PropertyValue::Null);
    }
    let i = *i as usize;
    match value {
        PropertyValue::Array(items) => Ok(items.get(i).cloned().unwrap_or(PropertyValue::Null)),
        PropertyValue::Str(s) => Ok(s
            .chars()
            .nth(i)
            .map(|c| PropertyValue::Str(c.to_string()))
            .unwrap_or(PropertyValue::Null)),
        _ => Ok(PropertyValue::Null),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
