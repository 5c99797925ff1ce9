use core::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::conf::{DEFAULT_RULE_STR, ITEM_SEPARATOR};
use crate::dataframe::CategoricalMatrix;
use crate::error::{Result, RuleListError};

/// Anything that can be tested against a row of categorical codes.
pub trait Predicate {
    fn evaluate_row(&self, row: &[i64]) -> bool;

    // Vectorised evaluation over every row of the matrix
    fn evaluate(&self, x: &CategoricalMatrix) -> Vec<bool> {
        x.rows().map(|row| self.evaluate_row(row)).collect()
    }
}

/// -------------------
/// Clause
/// -------------------
/// The predicate `feature[feature_idx] == category`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Clause {
    pub feature_idx: usize,
    pub category: i64,
}

impl Clause {
    pub fn new(feature_idx: usize, category: i64) -> Self {
        Self {
            feature_idx,
            category,
        }
    }

    /// Parse a mined item of the form `"<feature>=<category>"`.
    ///
    /// A leading alphabetic prefix on the feature part (`x3=1`) is accepted so
    /// that transaction items named after columns parse to the same clause.
    pub fn from_item(item: &str) -> Result<Self> {
        let malformed = |reason: &str| RuleListError::MalformedItem {
            item: item.to_string(),
            reason: reason.to_string(),
        };
        let (feature, category) = item
            .split_once(ITEM_SEPARATOR)
            .ok_or_else(|| malformed("no '=' separator"))?;
        let (feature_idx, category) =
            parse_pair(feature, category).ok_or_else(|| malformed("non-integer component"))?;
        Ok(Clause::new(feature_idx, category))
    }

    /// Item form used in transactions and in the encoded data file.
    pub fn item(&self) -> String {
        format!("{}{}{}", self.feature_idx, ITEM_SEPARATOR, self.category)
    }
}

impl Predicate for Clause {
    fn evaluate_row(&self, row: &[i64]) -> bool {
        row.get(self.feature_idx) == Some(&self.category)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{} = {}", self.feature_idx, self.category)
    }
}

fn parse_pair(feature: &str, category: &str) -> Option<(usize, i64)> {
    let feature = feature
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let feature_idx = feature.parse::<usize>().ok()?;
    let category = category.trim().parse::<i64>().ok()?;
    Some((feature_idx, category))
}

/// -------------------
/// Rule
/// -------------------
/// A conjunction of clauses (the IF part) and a per-class output vector (the
/// THEN part). A rule without clauses is the default rule and matches every row.
///
/// The output is whatever the trainer produced. It is not renormalised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    clauses: Vec<Clause>,
    output: Vec<f64>,
}

impl Rule {
    pub fn new(clauses: Vec<Clause>, output: Vec<f64>) -> Self {
        Self { clauses, output }
    }

    pub fn default_rule(output: Vec<f64>) -> Self {
        Self::new(Vec::new(), output)
    }

    /// Parse the trainer's textual rule form, `"default"` or `"{f1=c1,f2=c2}"`.
    pub fn parse(rule_str: &str, output: Vec<f64>) -> Result<Self> {
        let trimmed = rule_str.trim();
        if trimmed == DEFAULT_RULE_STR {
            return Ok(Rule::default_rule(output));
        }
        let malformed = |reason: &str| RuleListError::MalformedRule {
            rule: rule_str.to_string(),
            reason: reason.to_string(),
        };
        let body = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| malformed("expected a brace-delimited clause list"))?;
        if body.trim().is_empty() {
            return Err(malformed("empty clause list"));
        }

        let clauses = body
            .split(',')
            .map(|token| {
                let (feature, category) = token
                    .split_once(ITEM_SEPARATOR)
                    .ok_or_else(|| malformed("no '=' in clause"))?;
                let (feature_idx, category) = parse_pair(feature, category)
                    .ok_or_else(|| malformed("non-integer feature or category"))?;
                Ok(Clause::new(feature_idx, category))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Rule::new(clauses, output))
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn is_default(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Boolean mask of the rows that fire this rule.
    pub fn is_satisfied(&self, x: &CategoricalMatrix) -> Vec<bool> {
        self.evaluate(x)
    }

    /// Index of the largest output entry; ties go to the lowest index.
    pub fn predicted_class(&self) -> usize {
        argmax(&self.output)
    }

    /// `"default"` or the brace form, clauses in stored order.
    pub fn rule_str(&self) -> String {
        if self.is_default() {
            return DEFAULT_RULE_STR.to_string();
        }
        format!("{{{}}}", self.clauses.iter().map(Clause::item).join(","))
    }
}

impl Predicate for Rule {
    fn evaluate_row(&self, row: &[i64]) -> bool {
        self.clauses.iter().all(|clause| clause.evaluate_row(row))
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn parse_pair_strips_column_prefix() {
        assert_eq!(parse_pair("x12", "3"), Some((12, 3)));
        assert_eq!(parse_pair("4", "-1"), Some((4, -1)));
        assert_eq!(parse_pair("x", "1"), None);
    }
}
