//! Integration tests for rule_list::rule_list
//!
//! Covers reconstruction from trainer output, first-match evaluation
//! (caught matrix, decision path, prediction), support and persistence.

use rule_list::rule_list::support_from_caught;
use rule_list::{CandidatePool, CategoricalMatrix, Clause, Rule, RuleList, RuleListError};

/// x0 decides the class, x1 is noise.
fn xor_free_data() -> (CategoricalMatrix, Vec<usize>) {
    let x = CategoricalMatrix::from_rows(&[
        vec![0, 1],
        vec![0, 1],
        vec![0, 0],
        vec![0, 0],
        vec![1, 0],
        vec![1, 0],
        vec![1, 1],
        vec![1, 1],
    ])
    .unwrap();
    (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
}

fn split_list() -> RuleList {
    RuleList::new(
        vec![
            Rule::new(vec![Clause::new(0, 0)], vec![1.0, 0.0]),
            Rule::default_rule(vec![0.0, 1.0]),
        ],
        2,
        2,
    )
    .unwrap()
}

fn three_rule_list() -> RuleList {
    RuleList::new(
        vec![
            Rule::new(vec![Clause::new(1, 1)], vec![0.2, 0.8]),
            Rule::new(vec![Clause::new(0, 0)], vec![0.9, 0.1]),
            Rule::default_rule(vec![0.3, 0.7]),
        ],
        2,
        2,
    )
    .unwrap()
}

// ---------------------------
// Construction
// ---------------------------

#[test]
fn new_requires_trailing_default_rule() {
    let missing = RuleList::new(vec![Rule::new(vec![Clause::new(0, 0)], vec![1.0])], 1, 1);
    assert!(matches!(missing, Err(RuleListError::InvalidRuleList { .. })));

    let early_default = RuleList::new(
        vec![Rule::default_rule(vec![1.0]), Rule::default_rule(vec![1.0])],
        1,
        1,
    );
    assert!(matches!(early_default, Err(RuleListError::InvalidRuleList { .. })));

    assert!(matches!(
        RuleList::new(Vec::new(), 1, 1),
        Err(RuleListError::InvalidRuleList { .. })
    ));
}

#[test]
fn new_checks_output_width_and_features() {
    let wrong_width = RuleList::new(vec![Rule::default_rule(vec![1.0])], 2, 1);
    assert!(matches!(wrong_width, Err(RuleListError::InvalidRuleList { .. })));

    let negative = RuleList::new(vec![Rule::default_rule(vec![-0.1, 1.1])], 2, 1);
    assert!(matches!(negative, Err(RuleListError::InvalidRuleList { .. })));

    let unknown_feature = RuleList::new(
        vec![
            Rule::new(vec![Clause::new(3, 0)], vec![1.0]),
            Rule::default_rule(vec![1.0]),
        ],
        1,
        2,
    );
    assert!(matches!(unknown_feature, Err(RuleListError::InvalidRuleList { .. })));
}

/// Outputs are kept as produced; rows need not sum to one.
#[test]
fn unnormalized_outputs_are_accepted() {
    let list = RuleList::new(vec![Rule::default_rule(vec![2.0, 3.0])], 2, 1).unwrap();
    let x = CategoricalMatrix::from_rows(&[vec![0]]).unwrap();
    assert_eq!(list.predict_proba(&x).unwrap(), vec![vec![2.0, 3.0]]);
}

#[test]
fn from_pool_preserves_trainer_order() {
    let (x, _) = xor_free_data();
    let pool = CandidatePool::from_itemsets(
        &x,
        vec![
            vec![Clause::new(0, 0)],
            vec![Clause::new(0, 1), Clause::new(1, 1)],
            vec![Clause::new(1, 0)],
        ],
    );
    let list = RuleList::from_pool(
        &[3, 1, 0],
        vec![vec![0.5, 0.5], vec![0.9, 0.1], vec![0.2, 0.8]],
        &pool,
        2,
        2,
    )
    .unwrap();

    let rules = list.rules();
    assert_eq!(rules[0].clauses(), &[Clause::new(1, 0)]);
    assert_eq!(rules[1].clauses(), &[Clause::new(0, 0)]);
    assert!(rules[2].is_default());
    assert_eq!(rules[1].output(), &[0.9, 0.1]);
}

#[test]
fn from_pool_rejects_unknown_ids_and_length_mismatch() {
    let (x, _) = xor_free_data();
    let pool = CandidatePool::from_itemsets(&x, vec![vec![Clause::new(0, 0)]]);
    assert!(matches!(
        RuleList::from_pool(&[5, 0], vec![vec![1.0], vec![1.0]], &pool, 1, 2),
        Err(RuleListError::UnknownRuleId { id: 5, pool_size: 2 })
    ));
    assert!(matches!(
        RuleList::from_pool(&[1, 0], vec![vec![1.0]], &pool, 1, 2),
        Err(RuleListError::Shape { .. })
    ));
}

#[test]
fn from_rule_strings_matches_from_pool() {
    let (x, _) = xor_free_data();
    let pool = CandidatePool::from_itemsets(
        &x,
        vec![vec![Clause::new(0, 0)], vec![Clause::new(0, 1), Clause::new(1, 1)]],
    );
    let rule_pool: Vec<String> = vec!["default".into(), "{0=0}".into(), "{0=1,1=1}".into()];
    let outputs = vec![vec![0.1, 0.9], vec![0.8, 0.2], vec![0.5, 0.5]];

    let by_strings =
        RuleList::from_rule_strings(&[2, 1, 0], outputs.clone(), &rule_pool, 2, 2).unwrap();
    let by_pool = RuleList::from_pool(&[2, 1, 0], outputs, &pool, 2, 2).unwrap();
    assert_eq!(by_strings, by_pool);
}

// ---------------------------
// Evaluation
// ---------------------------

#[test]
fn two_feature_split_predicts_and_scores_perfectly() {
    let (x, y) = xor_free_data();
    let list = split_list();
    assert_eq!(list.predict(&x).unwrap(), y);
    assert_eq!(list.score(&x, &y, None).unwrap(), 1.0);
}

#[test]
fn caught_matrix_assigns_each_row_to_first_matching_rule() {
    let (x, _) = xor_free_data();
    let caught = three_rule_list().caught_matrix(&x).unwrap();
    assert_eq!(
        caught,
        vec![
            vec![true, true, false, false, false, false, true, true],
            vec![false, false, true, true, false, false, false, false],
            vec![false, false, false, false, true, true, false, false],
        ]
    );
}

#[test]
fn decision_path_marks_rules_consulted() {
    let (x, _) = xor_free_data();
    let path = three_rule_list().decision_path(&x).unwrap();
    assert_eq!(path[0], vec![true; 8]);
    assert_eq!(
        path[1],
        vec![false, false, true, true, true, true, false, false]
    );
    assert_eq!(
        path[2],
        vec![false, false, false, false, true, true, false, false]
    );
}

#[test]
fn predict_proba_writes_catching_rule_output() {
    let (x, _) = xor_free_data();
    let proba = three_rule_list().predict_proba(&x).unwrap();
    assert_eq!(proba[0], vec![0.2, 0.8]);
    assert_eq!(proba[2], vec![0.9, 0.1]);
    assert_eq!(proba[4], vec![0.3, 0.7]);
    assert_eq!(proba[7], vec![0.2, 0.8]);
}

#[test]
fn predict_breaks_ties_by_lowest_class() {
    let list = RuleList::new(vec![Rule::default_rule(vec![0.5, 0.5])], 2, 1).unwrap();
    let x = CategoricalMatrix::from_rows(&[vec![3], vec![4]]).unwrap();
    assert_eq!(list.predict(&x).unwrap(), vec![0, 0]);
}

#[test]
fn score_supports_sample_weights() {
    let (x, _) = xor_free_data();
    let list = three_rule_list();
    // predictions: 1 1 0 0 1 1 1 1
    let y = vec![0, 0, 0, 0, 1, 1, 1, 1];
    assert_eq!(list.score(&x, &y, None).unwrap(), 0.75);

    let weights = vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
    assert_eq!(list.score(&x, &y, Some(weights.as_slice())).unwrap(), 1.0);

    assert!(matches!(
        list.score(&x, &y, Some(&[1.0][..])),
        Err(RuleListError::Shape { .. })
    ));
}

#[test]
fn evaluation_rejects_wrong_feature_count() {
    let x = CategoricalMatrix::from_rows(&[vec![0, 0, 0]]).unwrap();
    assert!(matches!(
        split_list().predict(&x),
        Err(RuleListError::Shape { .. })
    ));
}

// ---------------------------
// Support
// ---------------------------

#[test]
fn support_counts_labels_per_rule() {
    let (x, y) = xor_free_data();
    let support = three_rule_list().compute_support(&x, &y).unwrap();
    assert_eq!(support.rows(), &[vec![2, 2], vec![2, 0], vec![0, 2]]);
    assert_eq!(support.total(), 8);
}

/// A label never seen during fit widens the matrix instead of failing.
#[test]
fn support_pads_unseen_labels() {
    let (x, _) = xor_free_data();
    let y = vec![0, 0, 0, 0, 1, 3, 1, 1];
    let support = three_rule_list().compute_support(&x, &y).unwrap();
    assert_eq!(support.n_classes(), 4);
    assert_eq!(support.row(2), &[0, 1, 0, 1]);
    for rule in 0..support.n_rules() {
        assert_eq!(support.get(rule, 2), 0);
    }
    assert_eq!(support.get(0, 3), 0);
}

#[test]
fn support_mismatch_is_fatal() {
    // two rules that leave the last row uncaught
    let caught = vec![vec![true, false, false], vec![false, true, false]];
    assert!(matches!(
        support_from_caught(&caught, &[0, 1, 1], 2),
        Err(RuleListError::SupportMismatch {
            caught: 2,
            n_instances: 3
        })
    ));
}

// ---------------------------
// Persistence
// ---------------------------

#[test]
fn json_round_trip_keeps_the_list() {
    let list = three_rule_list();
    let json = list.to_json().unwrap();
    assert_eq!(RuleList::from_json(&json).unwrap(), list);
}

#[test]
fn loading_revalidates_invariants() {
    let json = r#"{"rules":[{"clauses":[],"output":[1.0]},{"clauses":[{"feature_idx":0,"category":1}],"output":[1.0]}],"n_classes":1,"n_features":1}"#;
    assert!(RuleList::from_json(json).is_err());
}

#[test]
fn save_and_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/list.json");
    let list = split_list();
    list.save(&path).unwrap();
    assert_eq!(RuleList::load(&path).unwrap(), list);
}
