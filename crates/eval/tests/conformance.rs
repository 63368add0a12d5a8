//! Evaluator conformance suite.
//!
//! Each case pairs a profile rule expression with a literal property
//! snapshot and the verdict the engine must produce. The expressions
//! are drawn from real PDF/UA conformance profiles.

use probo_eval::{compile, EvalLimits, EvaluationContext, PropertyValue, RuleVerdict};

fn ctx(entries: &[(&str, PropertyValue)]) -> EvaluationContext {
    let mut ctx = EvaluationContext::new();
    for (name, value) in entries {
        ctx.insert(*name, value.clone());
    }
    ctx
}

fn check(expression: &str, entries: &[(&str, PropertyValue)], expected: RuleVerdict) {
    let rule = compile(expression)
        .unwrap_or_else(|e| panic!("failed to compile '{}': {}", expression, e));
    let verdict = rule.evaluate(&ctx(entries));
    assert_eq!(
        verdict, expected,
        "wrong verdict for '{}' against {:?}",
        expression, entries
    );
}

#[test]
fn struct_tree_root_flag() {
    check(
        "containsStructTreeRoot == true",
        &[("containsStructTreeRoot", PropertyValue::Bool(true))],
        RuleVerdict::Pass,
    );
    check(
        "containsStructTreeRoot == true",
        &[("containsStructTreeRoot", PropertyValue::Bool(false))],
        RuleVerdict::Fail,
    );
}

#[test]
fn alternative_text_present() {
    check(
        "Alt != null || ActualText != null",
        &[
            ("Alt", PropertyValue::Null),
            ("ActualText", PropertyValue::from("desc")),
        ],
        RuleVerdict::Pass,
    );
    check(
        "Alt != null || ActualText != null",
        &[
            ("Alt", PropertyValue::Null),
            ("ActualText", PropertyValue::Null),
        ],
        RuleVerdict::Fail,
    );
}

#[test]
fn figure_kids_excluded() {
    let expr = "kidsStandardTypes.split('&').filter(elem => elem == 'Figure').length == 0";
    check(
        expr,
        &[("kidsStandardTypes", PropertyValue::from("P&Figure&Span"))],
        RuleVerdict::Fail,
    );
    check(
        expr,
        &[("kidsStandardTypes", PropertyValue::from("P&Span"))],
        RuleVerdict::Pass,
    );
}

#[test]
fn language_tag_syntax() {
    let expr = "/^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$/.test(unicodeValue)";
    check(
        expr,
        &[("unicodeValue", PropertyValue::from("en-US"))],
        RuleVerdict::Pass,
    );
    check(
        expr,
        &[("unicodeValue", PropertyValue::from("123"))],
        RuleVerdict::Fail,
    );
}

#[test]
fn glyph_width_tolerance() {
    check(
        "Math.abs(widthFromFontProgram - widthFromDictionary) <= 1",
        &[
            ("widthFromFontProgram", PropertyValue::Real(500.4)),
            ("widthFromDictionary", PropertyValue::Int(500)),
        ],
        RuleVerdict::Pass,
    );
    check(
        "Math.abs(widthFromFontProgram - widthFromDictionary) <= 1",
        &[
            ("widthFromFontProgram", PropertyValue::Real(503.0)),
            ("widthFromDictionary", PropertyValue::Int(500)),
        ],
        RuleVerdict::Fail,
    );
}

#[test]
fn missing_identifier_evaluates_to_null() {
    check("foo == null", &[], RuleVerdict::Pass);
}

#[test]
fn indeterminate_carries_the_reason() {
    let _ = env_logger::builder().is_test(true).try_init();

    let rule = compile("structLevel < 'six'").unwrap();
    match rule.evaluate(&ctx(&[("structLevel", PropertyValue::Int(3))])) {
        RuleVerdict::Indeterminate { reason } => assert!(reason.contains("type mismatch")),
        other => panic!("expected indeterminate, got {:?}", other),
    }

    let rule = compile("1 / count").unwrap();
    match rule.evaluate(&ctx(&[("count", PropertyValue::Int(0))])) {
        RuleVerdict::Indeterminate { reason } => assert_eq!(reason, "division by zero"),
        other => panic!("expected indeterminate, got {:?}", other),
    }
}

#[test]
fn adversarial_expression_hits_budget() {
    let deep = format!("{}x", "!".repeat(1_000));
    let rule = compile(&deep).unwrap();
    match rule.evaluate(&EvaluationContext::new()) {
        RuleVerdict::Indeterminate { reason } => {
            assert!(reason.contains("budget"), "reason: {}", reason);
        }
        other => panic!("expected indeterminate, got {:?}", other),
    }
}

#[test]
fn custom_limits_are_honored() {
    let rule = compile("values.filter(v => v > 0).length == values.length")
        .unwrap()
        .with_limits(EvalLimits {
            max_depth: 32,
            max_steps: 1_000_000,
        });
    let items: Vec<PropertyValue> = (1..=500).map(PropertyValue::Int).collect();
    assert_eq!(
        rule.evaluate(&ctx(&[("values", PropertyValue::Array(items))])),
        RuleVerdict::Pass
    );
}

#[test]
fn shared_rule_across_snapshots() {
    // One compiled rule, many object contexts -- the load-once
    // evaluate-many lifecycle the rule engine relies on
    let rule = compile("Alt != null || ActualText != null").unwrap();
    let objects = [
        (
            ctx(&[("Alt", PropertyValue::from("a"))]),
            RuleVerdict::Pass,
        ),
        (
            ctx(&[("ActualText", PropertyValue::from("b"))]),
            RuleVerdict::Pass,
        ),
        (ctx(&[]), RuleVerdict::Fail),
    ];
    for (snapshot, expected) in &objects {
        assert_eq!(rule.evaluate(snapshot), *expected);
    }
}
