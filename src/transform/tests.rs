use super::*;
use crate::mapping::PaddingConfig;
use crate::format::PadSide;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn source_mapping(field: &str, length: i64) -> FieldMapping {
    FieldMapping {
        target_field: field.to_string(),
        target_position: 1,
        length,
        pad: PadSide::Right,
        pad_char: ' ',
        transformation_type: Some(TransformationType::Source),
        value: None,
        source_field: Some(field.to_string()),
        default_value: None,
        sources: Vec::new(),
        transform: None,
        delimiter: None,
        conditions: Vec::new(),
        format: None,
    }
}

// ============================================================================
// Simple evaluator
// ============================================================================

#[test_case("STATUS = 'A'", true ; "equality with single quotes")]
#[test_case("STATUS = A", true ; "equality bare literal")]
#[test_case("STATUS = 'B'", false ; "equality mismatch")]
#[test_case("AMT > 100", true ; "greater than")]
#[test_case("AMT > 200", false ; "greater than false")]
#[test_case("AMT < 200", true ; "less than")]
fn test_simple_evaluator(expr: &str, expected: bool) {
    let record = record(&[("STATUS", json!("A")), ("AMT", json!("150"))]);
    let eval = SimpleEvaluator::new();
    assert_eq!(eval.evaluate(expr, &record).unwrap(), expected);
}

#[test]
fn test_simple_evaluator_numeric_parse_failure_is_error() {
    let record = record(&[("STATUS", json!("A"))]);
    let eval = SimpleEvaluator::new();
    assert!(eval.evaluate("STATUS > 5", &record).is_err());
    assert!(eval.evaluate("no operator here", &record).is_err());
}

// ============================================================================
// Extended evaluator
// ============================================================================

#[test_case("STATUS = 'A' && AMT > 100", true ; "and both true")]
#[test_case("STATUS = 'A' && AMT > 500", false ; "and one false")]
#[test_case("STATUS = 'B' || AMT >= 150", true ; "or second true")]
#[test_case("STATUS = 'B' || OVERRIDE = 'Y'", false ; "or both false")]
#[test_case("STATUS = 'A' && AMT > 500 || AMT <= 150", true ; "or of ands")]
#[test_case("!STATUS = 'B'", true ; "negated clause")]
#[test_case("STATUS != 'B'", true ; "not equal")]
#[test_case("STATUS == \"A\"", true ; "double equals double quotes")]
#[test_case("MISSING = null", true ; "null absence test")]
#[test_case("STATUS != null", true ; "null presence test")]
#[test_case("MISSING != null", false ; "absent field is null")]
fn test_extended_evaluator(expr: &str, expected: bool) {
    let record = record(&[("STATUS", json!("A")), ("AMT", json!(150))]);
    let eval = ExtendedEvaluator::new();
    assert_eq!(eval.evaluate(expr, &record).unwrap(), expected);
}

#[test]
fn test_extended_evaluator_explicit_null_value_is_null() {
    let record = record(&[("NULLED", serde_json::Value::Null)]);
    let eval = ExtendedEvaluator::new();
    assert!(eval.evaluate("NULLED = null", &record).unwrap());
    assert!(!eval.evaluate("NULLED != null", &record).unwrap());
}

#[test]
fn test_extended_evaluator_non_numeric_comparison_is_clause_false() {
    let record = record(&[("AMT", json!("abc")), ("STATUS", json!("A"))]);
    let eval = ExtendedEvaluator::new();

    // The failing clause is false on its own and poisons its AND branch.
    assert!(!eval.evaluate("AMT > 10", &record).unwrap());
    assert!(!eval.evaluate("AMT > 10 && STATUS = 'A'", &record).unwrap());

    // A sibling OR branch still matches.
    assert!(eval.evaluate("AMT > 10 || STATUS = 'A'", &record).unwrap());

    // Structurally unparseable clauses are still errors.
    assert!(eval.evaluate("%%% no field", &record).is_err());
}

// ============================================================================
// Transformation engine: positional path
// ============================================================================

#[test]
fn test_constant_padded_to_exact_length() {
    let engine = TransformEngine::new();
    let mapping = FieldMapping::constant("LOCATION-CODE", 1, "100020", 6);
    let out = engine.transform_field(&Record::new(), &mapping).unwrap();
    assert_eq!(out, "100020");
    assert_eq!(out.len(), 6);

    let mapping = FieldMapping::constant("LOCATION-CODE", 1, "ABC", 6);
    let out = engine.transform_field(&Record::new(), &mapping).unwrap();
    assert_eq!(out, "ABC   ");
}

#[test]
fn test_constant_length_zero_unchanged() {
    let engine = TransformEngine::new();
    let mapping = FieldMapping::constant("F", 1, "unpadded value", 0);
    let out = engine.transform_field(&Record::new(), &mapping).unwrap();
    assert_eq!(out, "unpadded value");
}

#[test]
fn test_source_case_insensitive_fallback_then_default() {
    let engine = TransformEngine::new();
    let record = record(&[("acct_num", json!("12345"))]);

    let mut mapping = source_mapping("ACCT_NUM", 0);
    assert_eq!(engine.transform_field(&record, &mapping).unwrap(), "12345");

    mapping.source_field = Some("NOT-THERE".to_string());
    mapping.default_value = Some("DEFAULT".to_string());
    assert_eq!(engine.transform_field(&record, &mapping).unwrap(), "DEFAULT");
}

#[test]
fn test_composite_sum_treats_non_numeric_as_zero() {
    let engine = TransformEngine::new();
    let record = record(&[("a", json!("10")), ("b", json!("x"))]);
    let mapping = FieldMapping {
        transformation_type: Some(TransformationType::Composite),
        sources: vec!["a".to_string(), "b".to_string()],
        transform: Some(CompositeTransform::Sum),
        ..FieldMapping::constant("SUM", 1, "", 0)
    };
    assert_eq!(engine.transform_field(&record, &mapping).unwrap(), "10.0");
}

#[test]
fn test_composite_concat_with_delimiter() {
    let engine = TransformEngine::new();
    let record = record(&[("a", json!("X")), ("b", json!("Y"))]);
    let mapping = FieldMapping {
        transformation_type: Some(TransformationType::Composite),
        sources: vec!["a".to_string(), "b".to_string()],
        transform: Some(CompositeTransform::Concat),
        delimiter: Some(",".to_string()),
        ..FieldMapping::constant("CAT", 1, "", 0)
    };
    assert_eq!(engine.transform_field(&record, &mapping).unwrap(), "X,Y");
}

#[test]
fn test_composite_concat_missing_source_becomes_empty() {
    let engine = TransformEngine::new();
    let record = record(&[("a", json!("X"))]);
    let mapping = FieldMapping {
        transformation_type: Some(TransformationType::Composite),
        sources: vec!["a".to_string(), "missing".to_string()],
        transform: Some(CompositeTransform::Concat),
        delimiter: Some("-".to_string()),
        ..FieldMapping::constant("CAT", 1, "", 0)
    };
    assert_eq!(engine.transform_field(&record, &mapping).unwrap(), "X-");
}

#[test]
fn test_composite_unknown_transform_uses_default() {
    let engine = TransformEngine::new();
    let mapping = FieldMapping {
        transformation_type: Some(TransformationType::Composite),
        sources: vec!["a".to_string()],
        transform: Some(CompositeTransform::Unknown),
        default_value: Some("fallback".to_string()),
        ..FieldMapping::constant("X", 1, "", 0)
    };
    assert_eq!(
        engine.transform_field(&Record::new(), &mapping).unwrap(),
        "fallback"
    );
}

fn status_conditional() -> FieldMapping {
    FieldMapping {
        transformation_type: Some(TransformationType::Conditional),
        default_value: Some("UNKNOWN".to_string()),
        conditions: vec![Condition {
            if_expr: "STATUS = 'A'".to_string(),
            then: "Active".to_string(),
            else_expr: Some("Other".to_string()),
            else_if_exprs: vec![Condition {
                if_expr: "STATUS = 'B'".to_string(),
                then: "Blocked".to_string(),
                else_expr: None,
                else_if_exprs: Vec::new(),
            }],
        }],
        ..FieldMapping::constant("STATUS-DESC", 1, "", 0)
    }
}

#[test]
fn test_conditional_chain_order() {
    let engine = TransformEngine::new();
    let mapping = status_conditional();

    let rec = record(&[("STATUS", json!("B"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "Blocked");

    let rec = record(&[("STATUS", json!("Z"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "Other");

    let rec = record(&[("STATUS", json!("A"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "Active");
}

#[test]
fn test_conditional_no_else_uses_default_value() {
    let engine = TransformEngine::new();
    let mut mapping = status_conditional();
    mapping.conditions[0].else_expr = None;
    mapping.conditions[0].else_if_exprs.clear();

    let rec = record(&[("STATUS", json!("Z"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "UNKNOWN");
}

#[test]
fn test_conditional_branch_field_lookup_beats_literal() {
    // Compatibility behavior: a bare branch value that names a record field
    // resolves to that field's value, not the literal.
    let engine = TransformEngine::new();
    let mut mapping = status_conditional();
    mapping.conditions[0].then = "DESC".to_string();

    let rec = record(&[("STATUS", json!("A")), ("DESC", json!("from-record"))]);
    assert_eq!(
        engine.transform_field(&rec, &mapping).unwrap(),
        "from-record"
    );

    // Without the colliding field, the branch is a plain literal.
    let rec = record(&[("STATUS", json!("A"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "DESC");
}

#[test]
fn test_conditional_explicit_field_marker() {
    let engine = TransformEngine::new();
    let mut mapping = status_conditional();
    mapping.conditions[0].then = "$DESC".to_string();

    let rec = record(&[("STATUS", json!("A")), ("DESC", json!("marked"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "marked");

    // Marker referencing a missing field yields empty, never the literal.
    let rec = record(&[("STATUS", json!("A"))]);
    assert_eq!(engine.transform_field(&rec, &mapping).unwrap(), "");
}

#[test]
fn test_conditional_malformed_expression_degrades_to_false() {
    let engine = TransformEngine::new();
    let mut mapping = status_conditional();
    mapping.conditions[0].if_expr = "garbage without operator".to_string();
    mapping.conditions[0].else_if_exprs.clear();
    mapping.conditions[0].else_expr = Some("fallthrough".to_string());

    let rec = record(&[("STATUS", json!("A"))]);
    assert_eq!(
        engine.transform_field(&rec, &mapping).unwrap(),
        "fallthrough"
    );
}

#[test]
fn test_unknown_type_returns_default() {
    let engine = TransformEngine::new();
    let mapping = FieldMapping {
        transformation_type: None,
        default_value: Some("dflt".to_string()),
        ..FieldMapping::constant("X", 1, "", 0)
    };
    assert_eq!(engine.transform_field(&Record::new(), &mapping).unwrap(), "dflt");
}

#[test]
fn test_picture_format_applied_before_padding() {
    let engine = TransformEngine::new();
    let mapping = FieldMapping {
        transformation_type: Some(TransformationType::Source),
        source_field: Some("AMT".to_string()),
        format: Some("+9(12)V9(6)".to_string()),
        ..FieldMapping::constant("AMT", 1, "", 19)
    };
    let rec = record(&[("AMT", json!("123.45"))]);
    assert_eq!(
        engine.transform_field(&rec, &mapping).unwrap(),
        "+000000000123450000"
    );
}

// ============================================================================
// Transformation engine: enhanced path
// ============================================================================

fn target_field(name: &str, length: i64) -> TargetField {
    TargetField {
        name: name.to_string(),
        position: 1,
        length,
        data_type: "string".to_string(),
        format: None,
        padding: PaddingConfig::default(),
        default_value: None,
        validation: None,
    }
}

#[test]
fn test_enhanced_conditional_uses_extended_grammar() {
    let engine = TransformEngine::new();
    let mapping = EnhancedFieldMapping {
        transformation_type: Some(TransformationType::Conditional),
        conditions: vec![Condition {
            if_expr: "STATUS = 'A' && AMT > 100 || OVERRIDE = 'Y'".to_string(),
            then: "HIGH".to_string(),
            else_expr: Some("LOW".to_string()),
            else_if_exprs: Vec::new(),
        }],
        ..EnhancedFieldMapping::default()
    };
    let target = target_field("RISK", 4);

    let rec = record(&[("STATUS", json!("A")), ("AMT", json!(150))]);
    assert_eq!(
        engine.transform_enhanced(&rec, &mapping, &target).unwrap(),
        "HIGH"
    );

    let rec = record(&[("STATUS", json!("X")), ("OVERRIDE", json!("Y"))]);
    assert_eq!(
        engine.transform_enhanced(&rec, &mapping, &target).unwrap(),
        "HIGH"
    );

    let rec = record(&[("STATUS", json!("X"))]);
    assert_eq!(
        engine.transform_enhanced(&rec, &mapping, &target).unwrap(),
        "LOW "
    );
}

#[test]
fn test_enhanced_conditional_or_survives_non_numeric_clause() {
    let engine = TransformEngine::new();
    let mapping = EnhancedFieldMapping {
        transformation_type: Some(TransformationType::Conditional),
        conditions: vec![Condition {
            if_expr: "AMT > 10 || STATUS = 'A'".to_string(),
            then: "MATCH".to_string(),
            else_expr: Some("NOMATCH".to_string()),
            else_if_exprs: Vec::new(),
        }],
        ..EnhancedFieldMapping::default()
    };
    let target = target_field("FLAG", 7);

    // AMT does not parse as a number; the second OR branch must still win.
    let rec = record(&[("AMT", json!("abc")), ("STATUS", json!("A"))]);
    assert_eq!(
        engine.transform_enhanced(&rec, &mapping, &target).unwrap(),
        "MATCH  "
    );

    let rec = record(&[("AMT", json!("abc")), ("STATUS", json!("X"))]);
    assert_eq!(
        engine.transform_enhanced(&rec, &mapping, &target).unwrap(),
        "NOMATCH"
    );
}

#[test]
fn test_enhanced_padding_from_target_definition() {
    let engine = TransformEngine::new();
    let mapping = EnhancedFieldMapping {
        transformation_type: Some(TransformationType::Source),
        source_field: Some("AMT".to_string()),
        ..EnhancedFieldMapping::default()
    };
    let mut target = target_field("AMT", 8);
    target.padding = PaddingConfig {
        side: PadSide::Left,
        character: '0',
    };

    let rec = record(&[("AMT", json!("123"))]);
    assert_eq!(
        engine.transform_enhanced(&rec, &mapping, &target).unwrap(),
        "00000123"
    );
}

#[test]
fn test_enhanced_default_falls_back_to_target_default() {
    let engine = TransformEngine::new();
    let mapping = EnhancedFieldMapping {
        transformation_type: Some(TransformationType::Source),
        source_field: Some("MISSING".to_string()),
        ..EnhancedFieldMapping::default()
    };
    let mut target = target_field("F", 3);
    target.default_value = Some("ZZZ".to_string());

    assert_eq!(
        engine
            .transform_enhanced(&Record::new(), &mapping, &target)
            .unwrap(),
        "ZZZ"
    );
}

// ============================================================================
// End-to-end field resolution
// ============================================================================

#[test]
fn test_end_to_end_constant_plus_padded_source() {
    let engine = TransformEngine::new();
    let rec = record(&[
        ("ACCT_NUM", json!("12345")),
        ("TOTAL-DELINQ-AMT", json!("123456")),
    ]);

    let constant = FieldMapping::constant("LOCATION-CODE", 1, "100020", 6);
    let source = source_mapping("TOTAL-DELINQ-AMT", 19);

    assert_eq!(engine.transform_field(&rec, &constant).unwrap(), "100020");
    assert_eq!(
        engine.transform_field(&rec, &source).unwrap(),
        "123456             "
    );
}
