//! Ordered first-match evaluation of a fitted rule list.
//!
//! Every operation walks the rules in list order while carrying the mask of
//! rows that no earlier rule has caught. A row is caught by the first rule it
//! satisfies, and because the last rule is the default rule every row is
//! caught exactly once.

use std::fmt;
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataframe::CategoricalMatrix;
use crate::error::{Result, RuleListError};
use crate::format::{format_rule_list, DisplayNames, LabelMode};
use crate::pool::CandidatePool;
use crate::rules::{argmax, Rule};

/// Row-per-rule boolean masks over instances, shape `(n_rules, n_instances)`.
pub type BoolMatrix = Vec<Vec<bool>>;

/// The state of one rule during a first-match pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleStep {
    /// Rows still unmatched when this rule was tested.
    pub reached: Vec<bool>,
    /// Rows this rule caught.
    pub caught: Vec<bool>,
}

/// Resolve per-rule satisfaction masks into first-match steps.
///
/// `caught = satisfied & unmatched`, then `unmatched ^= caught`. The XOR only
/// clears bits because `caught` is a subset of `unmatched`.
pub fn resolve_first_match(satisfied: BoolMatrix, n_instances: usize) -> Vec<RuleStep> {
    let n_rules = satisfied.len();
    let (steps, _unmatched) = satisfied.into_iter().fold(
        (Vec::with_capacity(n_rules), vec![true; n_instances]),
        |(mut steps, unmatched): (Vec<RuleStep>, Vec<bool>), is_satisfied| {
            let caught: Vec<bool> = is_satisfied
                .iter()
                .zip(&unmatched)
                .map(|(&s, &u)| s && u)
                .collect();
            let remaining = unmatched
                .iter()
                .zip(&caught)
                .map(|(&u, &c)| u ^ c)
                .collect();
            steps.push(RuleStep {
                reached: unmatched,
                caught,
            });
            (steps, remaining)
        },
    );
    steps
}

/// Per-rule label counts of the rows each rule caught.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportMatrix {
    counts: Vec<Vec<usize>>,
}

impl SupportMatrix {
    pub fn zeros(n_rules: usize, n_classes: usize) -> Self {
        SupportMatrix {
            counts: vec![vec![0; n_classes]; n_rules],
        }
    }

    pub fn n_rules(&self) -> usize {
        self.counts.len()
    }

    pub fn n_classes(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    pub fn row(&self, rule: usize) -> &[usize] {
        &self.counts[rule]
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    pub fn get(&self, rule: usize, class: usize) -> usize {
        self.counts[rule].get(class).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Pad every row with zero columns up to `n_classes`.
    fn widen(&mut self, n_classes: usize) {
        for row in &mut self.counts {
            if row.len() < n_classes {
                row.resize(n_classes, 0);
            }
        }
    }

    fn add(&mut self, rule: usize, class: usize) {
        if class >= self.counts[rule].len() {
            self.widen(class + 1);
        }
        self.counts[rule][class] += 1;
    }
}

/// Tally labels per rule from a caught matrix.
///
/// Fails with [`RuleListError::SupportMismatch`] when the caught rows do not
/// add up to the number of labels: the rules did not partition the data.
/// Labels past `n_classes` widen the matrix instead of failing.
pub fn support_from_caught(
    caught: &BoolMatrix,
    y: &[usize],
    n_classes: usize,
) -> Result<SupportMatrix> {
    let n_caught: usize = caught
        .iter()
        .map(|row| row.iter().filter(|&&c| c).count())
        .sum();
    if n_caught != y.len() {
        return Err(RuleListError::SupportMismatch {
            caught: n_caught,
            n_instances: y.len(),
        });
    }

    let mut support = SupportMatrix::zeros(caught.len(), n_classes);
    for (rule, row) in caught.iter().enumerate() {
        for (&label, _) in y.iter().zip(row).filter(|(_, &c)| c) {
            support.add(rule, label);
        }
    }
    Ok(support)
}

#[derive(Deserialize)]
struct RuleListRepr {
    rules: Vec<Rule>,
    n_classes: usize,
    n_features: usize,
}

impl TryFrom<RuleListRepr> for RuleList {
    type Error = RuleListError;

    fn try_from(repr: RuleListRepr) -> Result<Self> {
        RuleList::new(repr.rules, repr.n_classes, repr.n_features)
    }
}

/// A fitted decision list. Immutable once built; a new fit produces a new list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleListRepr")]
pub struct RuleList {
    rules: Vec<Rule>,
    n_classes: usize,
    n_features: usize,
}

impl RuleList {
    /// Validate and wrap an ordered rule sequence.
    ///
    /// The last rule must be the only default rule; every output must hold
    /// `n_classes` finite non-negative values; clauses must address existing
    /// features.
    pub fn new(rules: Vec<Rule>, n_classes: usize, n_features: usize) -> Result<Self> {
        let invalid = |reason: String| Err(RuleListError::InvalidRuleList { reason });

        match rules.last() {
            None => return invalid("a rule list needs at least the default rule".to_string()),
            Some(last) if !last.is_default() => {
                return invalid("the last rule must be the default rule".to_string())
            }
            Some(_) => {}
        }
        if let Some(pos) = rules[..rules.len() - 1].iter().position(Rule::is_default) {
            return invalid(format!(
                "rule {} is a default rule but only the last rule may be",
                pos
            ));
        }
        for (i, rule) in rules.iter().enumerate() {
            if rule.output().len() != n_classes {
                return invalid(format!(
                    "rule {} has {} outputs, expected {}",
                    i,
                    rule.output().len(),
                    n_classes
                ));
            }
            if rule.output().iter().any(|p| !p.is_finite() || *p < 0.0) {
                return invalid(format!("rule {} has a negative or non-finite output", i));
            }
            if let Some(clause) = rule.clauses().iter().find(|c| c.feature_idx >= n_features) {
                return invalid(format!(
                    "rule {} tests feature {} but there are {} features",
                    i, clause.feature_idx, n_features
                ));
            }
        }

        Ok(RuleList {
            rules,
            n_classes,
            n_features,
        })
    }

    /// Rebuild the list the trainer selected, resolving ids through the mined
    /// pool. `rule_ids` order is the decision-list order and is kept as is.
    pub fn from_pool(
        rule_ids: &[usize],
        outputs: Vec<Vec<f64>>,
        pool: &CandidatePool,
        n_classes: usize,
        n_features: usize,
    ) -> Result<Self> {
        check_ids_outputs(rule_ids, &outputs)?;
        let rules = rule_ids
            .iter()
            .zip(outputs)
            .map(|(&id, output)| {
                pool.get(id)
                    .map(|candidate| candidate.to_rule(output))
                    .ok_or(RuleListError::UnknownRuleId {
                        id,
                        pool_size: pool.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        RuleList::new(rules, n_classes, n_features)
    }

    /// Same as [`RuleList::from_pool`] but resolving ids through the trainer's
    /// textual pool (`"default"`, `"{f=c,...}"`).
    pub fn from_rule_strings(
        rule_ids: &[usize],
        outputs: Vec<Vec<f64>>,
        rule_pool: &[String],
        n_classes: usize,
        n_features: usize,
    ) -> Result<Self> {
        check_ids_outputs(rule_ids, &outputs)?;
        let rules = rule_ids
            .iter()
            .zip(outputs)
            .map(|(&id, output)| {
                let rule_str = rule_pool.get(id).ok_or(RuleListError::UnknownRuleId {
                    id,
                    pool_size: rule_pool.len(),
                })?;
                Rule::parse(rule_str, output)
            })
            .collect::<Result<Vec<_>>>()?;
        RuleList::new(rules, n_classes, n_features)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn n_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn check_features(&self, x: &CategoricalMatrix) -> Result<()> {
        if x.n_cols() != self.n_features {
            return Err(RuleListError::shape(format!(
                "x has {} features, the rule list was fitted on {}",
                x.n_cols(),
                self.n_features
            )));
        }
        Ok(())
    }

    /// First-match steps for every rule. Satisfaction masks are computed in
    /// parallel; the resolution is sequential in list order.
    pub fn steps(&self, x: &CategoricalMatrix) -> Result<Vec<RuleStep>> {
        self.check_features(x)?;
        let satisfied: BoolMatrix = self
            .rules
            .par_iter()
            .map(|rule| rule.is_satisfied(x))
            .collect();
        Ok(resolve_first_match(satisfied, x.n_rows()))
    }

    /// Row `i` marks the instances first caught by rule `i`.
    pub fn caught_matrix(&self, x: &CategoricalMatrix) -> Result<BoolMatrix> {
        Ok(self.steps(x)?.into_iter().map(|step| step.caught).collect())
    }

    /// Row `i` marks the instances that reach rule `i`, i.e. were not caught
    /// by any earlier rule.
    pub fn decision_path(&self, x: &CategoricalMatrix) -> Result<BoolMatrix> {
        Ok(self.steps(x)?.into_iter().map(|step| step.reached).collect())
    }

    /// Number of instances caught by each rule.
    pub fn capture_counts(&self, x: &CategoricalMatrix) -> Result<Vec<usize>> {
        Ok(self
            .steps(x)?
            .iter()
            .map(|step| step.caught.iter().filter(|&&c| c).count())
            .collect())
    }

    /// Label counts of the instances each rule catches.
    pub fn compute_support(&self, x: &CategoricalMatrix, y: &[usize]) -> Result<SupportMatrix> {
        if x.n_rows() != y.len() {
            return Err(RuleListError::shape(format!(
                "x has {} rows but y has {} labels",
                x.n_rows(),
                y.len()
            )));
        }
        support_from_caught(&self.caught_matrix(x)?, y, self.n_classes)
    }

    /// Output distribution of the catching rule, one row per instance.
    pub fn predict_proba(&self, x: &CategoricalMatrix) -> Result<Vec<Vec<f64>>> {
        let mut proba = vec![vec![0.0; self.n_classes]; x.n_rows()];
        for (rule, step) in self.rules.iter().zip(self.steps(x)?) {
            for (row, _) in proba.iter_mut().zip(&step.caught).filter(|(_, &c)| c) {
                row.copy_from_slice(rule.output());
            }
        }
        Ok(proba)
    }

    /// Most probable class per instance; ties go to the lowest class index.
    pub fn predict(&self, x: &CategoricalMatrix) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|row| argmax(row))
            .collect())
    }

    /// Accuracy of `predict(x)` against `y`, optionally weighted.
    pub fn score(
        &self,
        x: &CategoricalMatrix,
        y: &[usize],
        sample_weight: Option<&[f64]>,
    ) -> Result<f64> {
        if x.n_rows() != y.len() {
            return Err(RuleListError::shape(format!(
                "x has {} rows but y has {} labels",
                x.n_rows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(RuleListError::shape("cannot score an empty batch"));
        }
        let correct: Vec<f64> = self
            .predict(x)?
            .iter()
            .zip(y)
            .map(|(pred, label)| if pred == label { 1.0 } else { 0.0 })
            .collect();

        match sample_weight {
            None => Ok(correct.iter().sum::<f64>() / correct.len() as f64),
            Some(weights) => {
                if weights.len() != correct.len() {
                    return Err(RuleListError::shape(format!(
                        "{} sample weights for {} instances",
                        weights.len(),
                        correct.len()
                    )));
                }
                let total: f64 = weights.iter().sum();
                if total == 0.0 {
                    return Err(RuleListError::shape("sample weights sum to zero"));
                }
                let hit: f64 = correct.iter().zip(weights).map(|(c, w)| c * w).sum();
                Ok(hit / total)
            }
        }
    }

    /// Render with names, label mode and optional per-rule support.
    pub fn render(
        &self,
        names: &DisplayNames,
        mode: LabelMode,
        supports: Option<&SupportMatrix>,
    ) -> String {
        format_rule_list(self, names, mode, supports)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a serialized list; the invariants are checked again.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

fn check_ids_outputs(rule_ids: &[usize], outputs: &[Vec<f64>]) -> Result<()> {
    if rule_ids.len() != outputs.len() {
        return Err(RuleListError::shape(format!(
            "{} rule ids but {} output rows",
            rule_ids.len(),
            outputs.len()
        )));
    }
    Ok(())
}

impl fmt::Display for RuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&DisplayNames::default(), LabelMode::ByDistribution, None))
    }
}
