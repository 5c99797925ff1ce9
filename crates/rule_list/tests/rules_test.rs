//! Integration tests for rule_list::rules
//!
//! These tests exercise the public API of rules:
//! - Clause (single equality predicate, item parsing)
//! - Rule (conjunction + output, default rule, textual form)
//! - Predicate trait default behavior (vector evaluation)

use rule_list::{CategoricalMatrix, Clause, Predicate, Rule, RuleListError};

fn matrix() -> CategoricalMatrix {
    CategoricalMatrix::from_rows(&[
        vec![0, 1, 2],
        vec![1, 1, 0],
        vec![0, 0, 2],
        vec![2, 1, 2],
    ])
    .unwrap()
}

// ---------------------------
// Clause tests
// ---------------------------

#[test]
fn clause_evaluates_equality_per_row() {
    let clause = Clause::new(1, 1);
    assert_eq!(clause.evaluate(&matrix()), vec![true, true, false, true]);
}

#[test]
fn clause_equality_uses_both_fields() {
    assert_eq!(Clause::new(2, 1), Clause::new(2, 1));
    assert_ne!(Clause::new(2, 1), Clause::new(1, 2));
}

#[test]
fn clause_from_item_parses_plain_and_prefixed_items() {
    assert_eq!(Clause::from_item("3=7").unwrap(), Clause::new(3, 7));
    assert_eq!(Clause::from_item("x3=7").unwrap(), Clause::new(3, 7));
    assert_eq!(Clause::new(3, 7).item(), "3=7");
}

/// An item without '=' means the miner broke its contract; it must not be dropped.
#[test]
fn clause_from_item_rejects_missing_separator() {
    let err = Clause::from_item("37").unwrap_err();
    assert!(matches!(err, RuleListError::MalformedItem { ref item, .. } if item == "37"));
}

#[test]
fn clause_from_item_rejects_non_integer_parts() {
    assert!(matches!(
        Clause::from_item("3=red"),
        Err(RuleListError::MalformedItem { .. })
    ));
}

// ---------------------------
// Rule tests
// ---------------------------

/// The default rule fires on every row, whatever the data.
#[test]
fn default_rule_is_satisfied_everywhere() {
    let rule = Rule::default_rule(vec![0.5, 0.5]);
    assert!(rule.is_default());
    assert_eq!(rule.is_satisfied(&matrix()), vec![true; 4]);
}

#[test]
fn rule_is_conjunction_of_clauses() {
    let rule = Rule::new(vec![Clause::new(0, 0), Clause::new(2, 2)], vec![1.0, 0.0]);
    assert!(!rule.is_default());
    assert_eq!(rule.is_satisfied(&matrix()), vec![true, false, true, false]);
}

#[test]
fn rule_str_of_default_and_conjunction() {
    assert_eq!(Rule::default_rule(vec![1.0]).rule_str(), "default");
    let rule = Rule::new(vec![Clause::new(2, 1), Clause::new(5, 0)], vec![1.0]);
    assert_eq!(rule.rule_str(), "{2=1,5=0}");
}

#[test]
fn rule_string_round_trip_is_order_insensitive() {
    let rule = Rule::new(vec![Clause::new(2, 1), Clause::new(5, 0)], vec![0.3, 0.7]);
    let parsed = Rule::parse(&rule.rule_str(), vec![0.3, 0.7]).unwrap();
    assert_eq!(parsed, rule);

    let swapped = Rule::parse("{5=0,2=1}", vec![0.3, 0.7]).unwrap();
    let mut a = swapped.clauses().to_vec();
    let mut b = rule.clauses().to_vec();
    a.sort();
    b.sort();
    assert_eq!(a, b);
    assert_eq!(swapped.clauses()[0].feature_idx, 5);
    assert_eq!(swapped.clauses()[0].category, 0);
}

#[test]
fn rule_parse_default_keyword() {
    let rule = Rule::parse("default", vec![0.1, 0.9]).unwrap();
    assert!(rule.is_default());
    assert_eq!(rule.output(), &[0.1, 0.9]);
}

#[test]
fn rule_parse_splits_on_first_equals() {
    let rule = Rule::parse("{x4=-2}", vec![1.0]).unwrap();
    assert_eq!(rule.clauses(), &[Clause::new(4, -2)]);
}

#[test]
fn rule_parse_rejects_malformed_strings() {
    for bad in ["{2=1,5}", "2=1", "{}", "{a=b}"] {
        assert!(
            matches!(
                Rule::parse(bad, vec![1.0]),
                Err(RuleListError::MalformedRule { .. })
            ),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn predicted_class_breaks_ties_by_lowest_index() {
    let rule = Rule::new(vec![Clause::new(0, 0)], vec![0.2, 0.4, 0.4]);
    assert_eq!(rule.predicted_class(), 1);
}
