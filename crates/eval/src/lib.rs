//! probo-eval: rule expression evaluator -- accepts a compiled rule
//! expression + a per-object property context, produces a verdict.
//!
//! The evaluator consumes the expression tree built by probo-core
//! (not raw source), resolves identifiers against the property snapshot
//! extracted from one PDF object, applies the operator and built-in
//! method semantics, and coerces the result to Pass / Fail /
//! Indeterminate.

pub mod interp;
pub mod limits;
pub mod methods;
pub mod numeric;
pub mod rules;
pub mod types;

pub use interp::evaluate;
pub use limits::EvalLimits;
pub use rules::{compile, CompiledRule, RuleVerdict};
pub use types::{EvalError, EvaluationContext, PropertyValue};

// Re-export the load-time surface so rule-layer callers need one crate.
pub use probo_core::{parse_expression, Expr, LexError, ParseError};

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// End-to-end: a profile's rule set compiled once and run against
    /// two object snapshots.
    #[test]
    fn evaluate_rule_set_against_objects() {
        let rules: Vec<CompiledRule> = [
            "Alt != null || ActualText != null",
            "S != null && S.startsWith('H') ? structLevel <= 6 : true",
            "kidsStandardTypes.split('&').filter(elem => elem == 'Figure').length == 0",
        ]
        .iter()
        .map(|src| compile(src).unwrap())
        .collect();

        let mut figure = EvaluationContext::new();
        figure.insert("Alt", PropertyValue::from("A chart"));
        figure.insert("S", PropertyValue::from("Figure"));
        figure.insert("kidsStandardTypes", PropertyValue::from("P&Span"));

        let mut heading = EvaluationContext::new();
        heading.insert("ActualText", PropertyValue::from("Title"));
        heading.insert("S", PropertyValue::from("H7"));
        heading.insert("structLevel", PropertyValue::Int(7));
        heading.insert("kidsStandardTypes", PropertyValue::from("P&Figure"));

        let verdicts: Vec<Vec<RuleVerdict>> = [&figure, &heading]
            .iter()
            .map(|ctx| rules.iter().map(|r| r.evaluate(ctx)).collect())
            .collect();

        assert_eq!(
            verdicts[0],
            vec![RuleVerdict::Pass, RuleVerdict::Pass, RuleVerdict::Pass]
        );
        assert_eq!(
            verdicts[1],
            vec![RuleVerdict::Pass, RuleVerdict::Fail, RuleVerdict::Fail]
        );
    }

    /// A rule with a syntax error is rejected at load time without
    /// affecting its neighbors.
    #[test]
    fn bad_rule_disables_only_itself() {
        let sources = ["Alt != null", "Alt !=", "ActualText != null"];
        let compiled: Vec<Result<CompiledRule, ParseError>> =
            sources.iter().map(|src| compile(src)).collect();
        assert!(compiled[0].is_ok());
        assert!(compiled[1].is_err());
        assert!(compiled[2].is_ok());
    }
}
