use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::conf::FEATURE_PREFIX;
use crate::error::RuleListError;
use crate::rule_list::{RuleList, SupportMatrix};
use crate::rules::Rule;

/// How the THEN part of a rule is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelMode {
    /// `label: <class> (<probability>)`
    ByLabel,
    /// `prob: [p0, p1, ...]`
    #[default]
    ByDistribution,
}

impl LabelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelMode::ByLabel => "label",
            LabelMode::ByDistribution => "prob",
        }
    }
}

impl FromStr for LabelMode {
    type Err = RuleListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(LabelMode::ByLabel),
            "prob" => Ok(LabelMode::ByDistribution),
            other => Err(RuleListError::UnknownLabelMode(other.to_string())),
        }
    }
}

impl fmt::Display for LabelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional human-readable names for features and their categories.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayNames {
    pub feature_names: Option<Vec<String>>,
    /// Indexed by feature, then by category code.
    pub category_names: Option<Vec<Option<Vec<String>>>>,
}

impl DisplayNames {
    pub fn new(
        feature_names: Option<Vec<String>>,
        category_names: Option<Vec<Option<Vec<String>>>>,
    ) -> Self {
        DisplayNames {
            feature_names,
            category_names,
        }
    }

    fn feature(&self, feature_idx: usize) -> String {
        self.feature_names
            .as_ref()
            .and_then(|names| names.get(feature_idx))
            .cloned()
            .unwrap_or_else(|| format!("{}{}", FEATURE_PREFIX, feature_idx))
    }

    fn condition(&self, feature_idx: usize, category: i64) -> String {
        let name = self
            .category_names
            .as_ref()
            .and_then(|per_feature| per_feature.get(feature_idx))
            .and_then(Option::as_ref)
            .and_then(|names| usize::try_from(category).ok().and_then(|c| names.get(c)));
        match name {
            Some(name) => format!(" in {}", name),
            None => format!(" = {}", category),
        }
    }
}

fn format_output(rule: &Rule, mode: LabelMode) -> String {
    let output = match mode {
        LabelMode::ByLabel => {
            let label = rule.predicted_class();
            let prob = rule.output().get(label).copied().unwrap_or(0.0);
            format!("{} ({:?})", label, prob)
        }
        LabelMode::ByDistribution => format!(
            "[{}]",
            rule.output().iter().map(|p| format!("{:.4}", p)).join(", ")
        ),
    };
    format!("{}: {}", mode, output)
}

/// Render one rule, e.g.
/// `IF (X0 = 1) AND (color in red) THEN prob: [0.9000, 0.1000] [+9/-1]`.
///
/// Support entries are prefixed `+` for the predicted class and `-` for every
/// other class.
pub fn format_rule(
    rule: &Rule,
    names: &DisplayNames,
    mode: LabelMode,
    support: Option<&[usize]>,
) -> String {
    let output = format_output(rule, mode);
    let mut s = if rule.is_default() {
        format!("DEFAULT {}", output)
    } else {
        let conditions = rule
            .clauses()
            .iter()
            .map(|clause| {
                format!(
                    "({}{})",
                    names.feature(clause.feature_idx),
                    names.condition(clause.feature_idx, clause.category)
                )
            })
            .join(" AND ");
        format!("IF {} THEN {}", conditions, output)
    };

    if let Some(support) = support {
        let predicted = rule.predicted_class();
        let annotated = support
            .iter()
            .enumerate()
            .map(|(class, count)| {
                let sign = if class == predicted { '+' } else { '-' };
                format!("{}{}", sign, count)
            })
            .join("/");
        s.push_str(&format!(" [{}]", annotated));
    }
    s
}

/// Render the whole list as an IF/ELSE chain in decision-list order.
pub fn format_rule_list(
    list: &RuleList,
    names: &DisplayNames,
    mode: LabelMode,
    supports: Option<&SupportMatrix>,
) -> String {
    let mut s = format!(
        "The rule list contains {} of rules:\n\n     ",
        list.n_rules()
    );
    for (i, rule) in list.rules().iter().enumerate() {
        let support = supports
            .filter(|m| i < m.n_rules())
            .map(|m| m.row(i));
        s.push_str(&format_rule(rule, names, mode, support));
        s.push('\n');
        if list.n_rules() > 1 && !rule.is_default() {
            s.push_str("\nELSE ");
        }
    }
    s
}
