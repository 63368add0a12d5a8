//! Built-in method table for rule expressions.
//!
//! Dispatch is keyed on (receiver type, method name). The surface is
//! fixed: string helpers, array helpers (including the predicate-taking
//! filter / some / every), the `Math` namespace, and `test()` on regex
//! literals. Anything else is [`EvalError::UnknownFunction`] -- there is
//! no user-defined function mechanism.

use probo_core::ast::Expr;
use regex::Regex;

use crate::interp::{eval_expr, Scope};
use crate::limits::Budget;
use crate::numeric;
use crate::types::{EvalError, EvaluationContext, PropertyValue};

/// Dispatch a method call on an evaluated receiver.
pub(crate) fn dispatch(
    receiver: &PropertyValue,
    name: &str,
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    match receiver {
        PropertyValue::Str(s) => string_method(s, name, args, ctx, scope, budget, depth),
        PropertyValue::Array(items) => array_method(items, name, args, ctx, scope, budget, depth),
        other => Err(unknown(name, other.type_name())),
    }
}

fn unknown(name: &str, receiver: &str) -> EvalError {
    EvalError::UnknownFunction {
        name: name.to_owned(),
        receiver: receiver.to_owned(),
    }
}

// ──────────────────────────────────────────────
// Argument helpers
// ──────────────────────────────────────────────

fn eval_args(
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<Vec<PropertyValue>, EvalError> {
    args.iter()
        .map(|arg| eval_expr(arg, ctx, scope, budget, depth + 1))
        .collect()
}

fn arity(name: &str, args: &[PropertyValue], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::TypeMismatch {
            message: format!(
                "{}() expects {} argument{}, got {}",
                name,
                expected,
                if expected == 1 { "" } else { "s" },
                args.len()
            ),
        })
    }
}

fn str_arg<'a>(name: &str, args: &'a [PropertyValue], at: usize) -> Result<&'a str, EvalError> {
    match &args[at] {
        PropertyValue::Str(s) => Ok(s),
        other => Err(EvalError::TypeMismatch {
            message: format!(
                "{}() expects a string argument, got {}",
                name,
                other.type_name()
            ),
        }),
    }
}

fn int_arg(name: &str, args: &[PropertyValue], at: usize) -> Result<i64, EvalError> {
    match &args[at] {
        PropertyValue::Int(n) => Ok(*n),
        other => Err(EvalError::TypeMismatch {
            message: format!(
                "{}() expects an integer argument, got {}",
                name,
                other.type_name()
            ),
        }),
    }
}

/// The sole-argument predicate form required by filter / some / every.
fn predicate_arg<'a>(name: &str, args: &'a [Expr]) -> Result<(&'a str, &'a Expr), EvalError> {
    if let [Expr::Predicate { param, body }] = args {
        Ok((param.as_str(), body.as_ref()))
    } else {
        Err(EvalError::TypeMismatch {
            message: format!("{}() expects a single predicate argument (param => expr)", name),
        })
    }
}

// ──────────────────────────────────────────────
// String methods
// ──────────────────────────────────────────────

fn string_method(
    s: &str,
    name: &str,
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    let args = eval_args(args, ctx, scope, budget, depth)?;
    match name {
        "split" => {
            arity(name, &args, 1)?;
            let sep = str_arg(name, &args, 0)?;
            let parts: Vec<PropertyValue> = if sep.is_empty() {
                // An empty separator splits into individual characters
                s.chars().map(|c| PropertyValue::Str(c.to_string())).collect()
            } else {
                s.split(sep).map(PropertyValue::from).collect()
            };
            Ok(PropertyValue::Array(parts))
        }
        "contains" => {
            arity(name, &args, 1)?;
            Ok(PropertyValue::Bool(s.contains(str_arg(name, &args, 0)?)))
        }
        "startsWith" => {
            arity(name, &args, 1)?;
            Ok(PropertyValue::Bool(s.starts_with(str_arg(name, &args, 0)?)))
        }
        "endsWith" => {
            arity(name, &args, 1)?;
            Ok(PropertyValue::Bool(s.ends_with(str_arg(name, &args, 0)?)))
        }
        "indexOf" => {
            arity(name, &args, 1)?;
            let needle = str_arg(name, &args, 0)?;
            // Character index, consistent with .length and charAt
            let found = s
                .find(needle)
                .map(|byte_idx| s[..byte_idx].chars().count() as i64)
                .unwrap_or(-1);
            Ok(PropertyValue::Int(found))
        }
        "charAt" => {
            arity(name, &args, 1)?;
            let i = int_arg(name, &args, 0)?;
            let c = usize::try_from(i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| c.to_string())
                .unwrap_or_default();
            Ok(PropertyValue::Str(c))
        }
        "substring" => {
            arity(name, &args, 2)?;
            let len = s.chars().count() as i64;
            let clamp = |n: i64| n.clamp(0, len) as usize;
            let (mut start, mut end) = (clamp(int_arg(name, &args, 0)?), clamp(int_arg(name, &args, 1)?));
            if start > end {
                std::mem::swap(&mut start, &mut end);
            }
            let sub: String = s.chars().skip(start).take(end - start).collect();
            Ok(PropertyValue::Str(sub))
        }
        "trim" => {
            arity(name, &args, 0)?;
            Ok(PropertyValue::from(s.trim()))
        }
        "toLowerCase" => {
            arity(name, &args, 0)?;
            Ok(PropertyValue::Str(s.to_lowercase()))
        }
        "toUpperCase" => {
            arity(name, &args, 0)?;
            Ok(PropertyValue::Str(s.to_uppercase()))
        }
        _ => Err(unknown(name, "string")),
    }
}

// ──────────────────────────────────────────────
// Array methods
// ──────────────────────────────────────────────

fn array_method(
    items: &[PropertyValue],
    name: &str,
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    match name {
        // Predicate-taking methods evaluate the body once per element
        // with the parameter bound in a child scope over the context
        "filter" => {
            let (param, body) = predicate_arg(name, args)?;
            let mut kept = Vec::new();
            for item in items {
                let child = scope.child(param, item.clone());
                if eval_expr(body, ctx, &child, budget, depth + 1)?.is_truthy() {
                    kept.push(item.clone());
                }
            }
            Ok(PropertyValue::Array(kept))
        }
        "some" => {
            let (param, body) = predicate_arg(name, args)?;
            for item in items {
                let child = scope.child(param, item.clone());
                if eval_expr(body, ctx, &child, budget, depth + 1)?.is_truthy() {
                    return Ok(PropertyValue::Bool(true));
                }
            }
            Ok(PropertyValue::Bool(false))
        }
        "every" => {
            let (param, body) = predicate_arg(name, args)?;
            for item in items {
                let child = scope.child(param, item.clone());
                if !eval_expr(body, ctx, &child, budget, depth + 1)?.is_truthy() {
                    return Ok(PropertyValue::Bool(false));
                }
            }
            Ok(PropertyValue::Bool(true))
        }
        "includes" => {
            let args = eval_args(args, ctx, scope, budget, depth)?;
            arity(name, &args, 1)?;
            Ok(PropertyValue::Bool(
                items.iter().any(|item| numeric::loose_eq(item, &args[0])),
            ))
        }
        "indexOf" => {
            let args = eval_args(args, ctx, scope, budget, depth)?;
            arity(name, &args, 1)?;
            let found = items
                .iter()
                .position(|item| numeric::loose_eq(item, &args[0]))
                .map(|i| i as i64)
                .unwrap_or(-1);
            Ok(PropertyValue::Int(found))
        }
        "concat" => {
            let args = eval_args(args, ctx, scope, budget, depth)?;
            arity(name, &args, 1)?;
            let mut joined = items.to_vec();
            match &args[0] {
                PropertyValue::Array(other) => joined.extend(other.iter().cloned()),
                single => joined.push(single.clone()),
            }
            Ok(PropertyValue::Array(joined))
        }
        _ => Err(unknown(name, "array")),
    }
}

// ──────────────────────────────────────────────
// Math namespace
// ──────────────────────────────────────────────

pub(crate) fn math_call(
    name: &str,
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    let args = eval_args(args, ctx, scope, budget, depth)?;
    match name {
        "abs" => {
            arity(name, &args, 1)?;
            match num_arg(name, &args, 0)? {
                NumArg::Int(n) => Ok(n
                    .checked_abs()
                    .map(PropertyValue::Int)
                    .unwrap_or(PropertyValue::Real((n as f64).abs()))),
                NumArg::Real(r) => Ok(PropertyValue::Real(r.abs())),
            }
        }
        "floor" => rounded(name, &args, f64::floor),
        "ceil" => rounded(name, &args, f64::ceil),
        "trunc" => rounded(name, &args, f64::trunc),
        "sqrt" => {
            arity(name, &args, 1)?;
            Ok(PropertyValue::Real(num_arg(name, &args, 0)?.as_real().sqrt()))
        }
        "min" | "max" => {
            arity(name, &args, 2)?;
            let a = num_arg(name, &args, 0)?;
            let b = num_arg(name, &args, 1)?;
            if let (NumArg::Int(x), NumArg::Int(y)) = (a, b) {
                let n = if name == "min" { x.min(y) } else { x.max(y) };
                return Ok(PropertyValue::Int(n));
            }
            let (x, y) = (a.as_real(), b.as_real());
            Ok(PropertyValue::Real(if name == "min" {
                x.min(y)
            } else {
                x.max(y)
            }))
        }
        "pow" => {
            arity(name, &args, 2)?;
            let base = num_arg(name, &args, 0)?;
            let exp = num_arg(name, &args, 1)?;
            if let (NumArg::Int(b), NumArg::Int(e)) = (base, exp) {
                if let Ok(e) = u32::try_from(e) {
                    if let Some(n) = b.checked_pow(e) {
                        return Ok(PropertyValue::Int(n));
                    }
                }
            }
            Ok(PropertyValue::Real(base.as_real().powf(exp.as_real())))
        }
        _ => Err(unknown(name, "Math")),
    }
}

#[derive(Clone, Copy)]
enum NumArg {
    Int(i64),
    Real(f64),
}

impl NumArg {
    fn as_real(self) -> f64 {
        match self {
            NumArg::Int(n) => n as f64,
            NumArg::Real(r) => r,
        }
    }
}

fn num_arg(name: &str, args: &[PropertyValue], at: usize) -> Result<NumArg, EvalError> {
    match &args[at] {
        PropertyValue::Int(n) => Ok(NumArg::Int(*n)),
        PropertyValue::Real(r) => Ok(NumArg::Real(*r)),
        other => Err(EvalError::TypeMismatch {
            message: format!(
                "Math.{}() expects a numeric argument, got {}",
                name,
                other.type_name()
            ),
        }),
    }
}

/// floor/ceil/trunc: integers pass through, reals come back as Int when
/// the result fits in i64.
fn rounded(
    name: &str,
    args: &[PropertyValue],
    op: fn(f64) -> f64,
) -> Result<PropertyValue, EvalError> {
    arity(name, &args, 1)?;
    match num_arg(name, args, 0)? {
        NumArg::Int(n) => Ok(PropertyValue::Int(n)),
        NumArg::Real(r) => {
            let v = op(r);
            if v.is_finite() && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                Ok(PropertyValue::Int(v as i64))
            } else {
                Ok(PropertyValue::Real(v))
            }
        }
    }
}

// ──────────────────────────────────────────────
// Regex test()
// ──────────────────────────────────────────────

pub(crate) fn regex_call(
    pattern: &str,
    flags: &str,
    name: &str,
    args: &[Expr],
    ctx: &EvaluationContext,
    scope: &Scope,
    budget: &mut Budget,
    depth: usize,
) -> Result<PropertyValue, EvalError> {
    if name != "test" {
        return Err(unknown(name, "regex"));
    }
    let args = eval_args(args, ctx, scope, budget, depth)?;
    arity(name, &args, 1)?;
    match &args[0] {
        // Missing document data tests false rather than erroring,
        // matching the null-heavy authoring style of the profiles
        PropertyValue::Null => Ok(PropertyValue::Bool(false)),
        PropertyValue::Str(s) => {
            let re = compile_regex(pattern, flags)?;
            Ok(PropertyValue::Bool(re.is_match(s)))
        }
        other => Err(EvalError::TypeMismatch {
            message: format!("test() expects a string argument, got {}", other.type_name()),
        }),
    }
}

/// Compile a regex literal, translating the source language's flag
/// letters. `i m s x` map to inline flags; `u` is a no-op (the engine
/// is Unicode-aware by default) and the match-position flags `g`/`y`
/// have no meaning for test().
fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, EvalError> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' => inline.push(flag),
            'u' | 'g' | 'y' => {}
            other => {
                return Err(EvalError::RegexCompile {
                    pattern: pattern.to_owned(),
                    message: format!("unsupported flag '{}'", other),
                });
            }
        }
    }
    let full = if inline.is_empty() {
        pattern.to_owned()
    } else {
        format!("(?{}){}", inline, pattern)
    };
    Regex::new(&full).map_err(|e| EvalError::RegexCompile {
        pattern: pattern.to_owned(),
        message: e.to_string(),
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
