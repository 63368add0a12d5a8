//! Compiled rules and verdicts.
//!
//! The rule-execution layer compiles each profile rule's test expression
//! once at load time and evaluates the cached tree against every
//! applicable object's property context. Evaluation failures never
//! abort a validation run; they downgrade the single rule's verdict to
//! Indeterminate so the report can distinguish "violates this rule"
//! from "this rule could not be checked".

use serde::Serialize;

use probo_core::{parse_expression, Expr, ParseError};

use crate::interp;
use crate::limits::EvalLimits;
use crate::types::{EvalError, EvaluationContext, PropertyValue};

/// Parse a rule's test expression into a reusable compiled form.
///
/// One call per rule at profile-load time. A parse failure disables
/// that rule only; the caller keeps loading the rest of the profile.
pub fn compile(expression: &str) -> Result<CompiledRule, ParseError> {
    let ast = parse_expression(expression).inspect_err(|e| {
        log::warn!("rule expression rejected: {} -- {}", expression, e);
    })?;
    Ok(CompiledRule {
        source: expression.to_owned(),
        ast,
        limits: EvalLimits::default(),
    })
}

/// A parsed rule expression plus its evaluation limits.
///
/// Immutable after construction and safely shared across threads: each
/// `evaluate` call allocates its own budget and scope state, so many
/// documents' checks may walk one cached rule concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    source: String,
    ast: Expr,
    limits: EvalLimits,
}

impl CompiledRule {
    /// Replace the default evaluation limits.
    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The expression string this rule was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression tree.
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluate against one object's property context, coercing the
    /// result to a verdict. Evaluation errors become Indeterminate.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> RuleVerdict {
        match self.evaluate_value(ctx) {
            Ok(value) => {
                if value.is_truthy() {
                    RuleVerdict::Pass
                } else {
                    RuleVerdict::Fail
                }
            }
            Err(err) => {
                log::debug!("rule '{}' indeterminate: {}", self.source, err);
                RuleVerdict::Indeterminate {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Evaluate and return the typed result instead of a verdict.
    pub fn evaluate_value(&self, ctx: &EvaluationContext) -> Result<PropertyValue, EvalError> {
        interp::evaluate(&self.ast, ctx, self.limits)
    }
}

// ──────────────────────────────────────────────
// Verdicts
// ──────────────────────────────────────────────

/// The three-valued outcome of checking one rule against one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleVerdict {
    Pass,
    Fail,
    /// The rule could not be checked; `reason` carries the evaluation
    /// error for the report.
    Indeterminate { reason: String },
}

impl RuleVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, RuleVerdict::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, RuleVerdict::Fail)
    }

    /// Serialize for the validation report.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RuleVerdict::Pass => serde_json::json!({ "status": "pass" }),
            RuleVerdict::Fail => serde_json::json!({ "status": "fail" }),
            RuleVerdict::Indeterminate { reason } => serde_json::json!({
                "status": "indeterminate",
                "reason": reason,
            }),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(name: &str, value: PropertyValue) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        ctx.insert(name, value);
        ctx
    }

    #[test]
    fn compile_once_evaluate_many() {
        let rule = compile("containsStructTreeRoot == true").unwrap();
        assert!(rule
            .evaluate(&ctx_with("containsStructTreeRoot", PropertyValue::Bool(true)))
            .is_pass());
        assert!(rule
            .evaluate(&ctx_with("containsStructTreeRoot", PropertyValue::Bool(false)))
            .is_fail());
    }

    #[test]
    fn compile_rejects_bad_syntax() {
        assert!(compile("Alt !=").is_err());
        assert!(compile("Alt != null extra").is_err());
    }

    #[test]
    fn truthiness_coerces_non_boolean_results() {
        let rule = compile("kids.length").unwrap();
        let one = ctx_with("kids", PropertyValue::Array(vec![PropertyValue::Int(1)]));
        let none = ctx_with("kids", PropertyValue::Array(vec![]));
        assert!(rule.evaluate(&one).is_pass());
        assert!(rule.evaluate(&none).is_fail());
    }

    #[test]
    fn eval_error_becomes_indeterminate() {
        let rule = compile("S < 3").unwrap();
        let verdict = rule.evaluate(&ctx_with("S", PropertyValue::from("H1")));
        match verdict {
            RuleVerdict::Indeterminate { reason } => {
                assert!(reason.contains("type mismatch"), "reason: {}", reason);
            }
            other => panic!("expected indeterminate, got {:?}", other),
        }
    }

    #[test]
    fn budget_exhaustion_is_indeterminate_not_panic() {
        let rule = compile("a.filter(e => e == 'x').length == 0")
            .unwrap()
            .with_limits(EvalLimits {
                max_depth: 64,
                max_steps: 10,
            });
        let items: Vec<PropertyValue> = (0..50).map(|_| PropertyValue::from("y")).collect();
        let verdict = rule.evaluate(&ctx_with("a", PropertyValue::Array(items)));
        assert!(matches!(verdict, RuleVerdict::Indeterminate { .. }));
    }

    #[test]
    fn verdict_json_shapes() {
        assert_eq!(
            RuleVerdict::Pass.to_json(),
            serde_json::json!({ "status": "pass" })
        );
        let indeterminate = RuleVerdict::Indeterminate {
            reason: "division by zero".to_owned(),
        };
        assert_eq!(
            indeterminate.to_json(),
            serde_json::json!({ "status": "indeterminate", "reason": "division by zero" })
        );
        // serde derive agrees with to_json
        assert_eq!(
            serde_json::to_value(&indeterminate).unwrap(),
            indeterminate.to_json()
        );
    }

    #[test]
    fn source_and_ast_accessors() {
        let rule = compile("Alt != null").unwrap();
        assert_eq!(rule.source(), "Alt != null");
        assert_eq!(rule.ast().to_string(), "Alt != null");
    }
}
