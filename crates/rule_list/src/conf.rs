use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleListError};
use crate::trainer::Alpha;

pub const DEFAULT_RULE_STR: &str = "default";
pub const ITEM_SEPARATOR: char = '=';
pub const FEATURE_PREFIX: &str = "X";
pub const DEFAULT_FIM_METHOD: &str = "eclat";
/// Seed value the trainer reads as "seed from the clock".
pub const NON_DETERMINISTIC_SEED: i64 = -1;

/// Hyperparameters of a rule list fit, as read from a JSON document.
///
/// Every field is optional in the document; missing fields take the values of
/// [`RuleListConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleListConfig {
    pub min_rule_len: usize,
    pub max_rule_len: usize,
    pub min_support: f64,
    pub lambda: f64,
    pub eta: f64,
    pub iters: usize,
    pub n_chains: usize,
    pub alpha: Alpha,
    pub fim_method: String,
    pub feature_names: Option<Vec<String>>,
    pub category_names: Option<Vec<Option<Vec<String>>>>,
    pub seed: Option<u32>,
    pub verbose: u8,
}

impl Default for RuleListConfig {
    fn default() -> Self {
        RuleListConfig {
            min_rule_len: 1,
            max_rule_len: 2,
            min_support: 0.01,
            lambda: 20.0,
            eta: 1.0,
            iters: 30_000,
            n_chains: 30,
            alpha: Alpha::Uniform(1),
            fim_method: DEFAULT_FIM_METHOD.to_string(),
            feature_names: None,
            category_names: None,
            seed: None,
            verbose: 0,
        }
    }
}

impl RuleListConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: RuleListConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(config_err(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        if self.min_rule_len == 0 {
            return Err(config_err("min_rule_len must be at least 1"));
        }
        if self.min_rule_len > self.max_rule_len {
            return Err(config_err(format!(
                "min_rule_len {} exceeds max_rule_len {}",
                self.min_rule_len, self.max_rule_len
            )));
        }
        if self.n_chains == 0 {
            return Err(config_err("n_chains must be at least 1"));
        }
        Ok(())
    }
}

fn config_err(reason: impl Into<String>) -> RuleListError {
    RuleListError::Config {
        reason: reason.into(),
    }
}
