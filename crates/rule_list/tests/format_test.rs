use rule_list::{
    format_rule, format_rule_list, Clause, DisplayNames, LabelMode, Rule, RuleList, RuleListError,
};

fn color_rule() -> Rule {
    Rule::new(vec![Clause::new(0, 1), Clause::new(2, 0)], vec![0.9, 0.1])
}

#[test]
fn label_mode_parses_and_prints() {
    assert_eq!("label".parse::<LabelMode>().unwrap(), LabelMode::ByLabel);
    assert_eq!("prob".parse::<LabelMode>().unwrap(), LabelMode::ByDistribution);
    assert_eq!(LabelMode::default(), LabelMode::ByDistribution);
    assert_eq!(LabelMode::ByLabel.to_string(), "label");
}

#[test]
fn unknown_label_mode_is_an_error() {
    let err = "foo".parse::<LabelMode>().unwrap_err();
    assert!(matches!(err, RuleListError::UnknownLabelMode(ref mode) if mode == "foo"));
}

#[test]
fn rule_without_names_uses_indexed_features() {
    let s = format_rule(
        &color_rule(),
        &DisplayNames::default(),
        LabelMode::ByDistribution,
        None,
    );
    assert_eq!(s, "IF (X0 = 1) AND (X2 = 0) THEN prob: [0.9000, 0.1000]");
}

#[test]
fn label_mode_prints_class_and_probability() {
    let s = format_rule(&color_rule(), &DisplayNames::default(), LabelMode::ByLabel, None);
    assert_eq!(s, "IF (X0 = 1) AND (X2 = 0) THEN label: 0 (0.9)");
}

#[test]
fn names_replace_indices_where_known() {
    let names = DisplayNames::new(
        Some(vec!["color".into(), "size".into()]),
        Some(vec![Some(vec!["red".into(), "blue".into()]), None]),
    );
    // feature 2 has no name; category names exist only for feature 0
    let s = format_rule(&color_rule(), &names, LabelMode::ByDistribution, None);
    assert_eq!(s, "IF (color in blue) AND (X2 = 0) THEN prob: [0.9000, 0.1000]");
}

#[test]
fn out_of_range_category_falls_back_to_code() {
    let names = DisplayNames::new(None, Some(vec![Some(vec!["red".into()])]));
    let rule = Rule::new(vec![Clause::new(0, 4)], vec![1.0]);
    let s = format_rule(&rule, &names, LabelMode::ByDistribution, None);
    assert_eq!(s, "IF (X0 = 4) THEN prob: [1.0000]");
}

#[test]
fn support_marks_predicted_class_positive() {
    let rule = Rule::new(vec![Clause::new(0, 0)], vec![0.1, 0.7, 0.2]);
    let s = format_rule(
        &rule,
        &DisplayNames::default(),
        LabelMode::ByDistribution,
        Some(&[1, 9, 2][..]),
    );
    assert!(s.ends_with(" [-1/+9/-2]"), "{s}");
}

#[test]
fn default_rule_renders_as_default() {
    let s = format_rule(
        &Rule::default_rule(vec![0.25, 0.75]),
        &DisplayNames::default(),
        LabelMode::ByLabel,
        None,
    );
    assert_eq!(s, "DEFAULT label: 1 (0.75)");
}

#[test]
fn rule_list_renders_as_else_chain() {
    let list = RuleList::new(
        vec![
            Rule::new(vec![Clause::new(0, 0)], vec![1.0, 0.0]),
            Rule::new(vec![Clause::new(1, 1)], vec![0.5, 0.5]),
            Rule::default_rule(vec![0.0, 1.0]),
        ],
        2,
        2,
    )
    .unwrap();
    let expected = "The rule list contains 3 of rules:\n\n     \
                    IF (X0 = 0) THEN prob: [1.0000, 0.0000]\n\
                    \nELSE IF (X1 = 1) THEN prob: [0.5000, 0.5000]\n\
                    \nELSE DEFAULT prob: [0.0000, 1.0000]\n";
    let rendered = format_rule_list(&list, &DisplayNames::default(), LabelMode::ByDistribution, None);
    assert_eq!(rendered, expected);
    assert_eq!(list.to_string(), expected);
}

#[test]
fn single_default_list_has_no_else() {
    let list = RuleList::new(vec![Rule::default_rule(vec![1.0])], 1, 0).unwrap();
    assert_eq!(
        list.to_string(),
        "The rule list contains 1 of rules:\n\n     DEFAULT prob: [1.0000]\n"
    );
}
