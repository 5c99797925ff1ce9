//! # Rule List
//!
//! Interpretable classification with Bayesian rule lists over categorical data.
//!
//! ## Key Features
//!
//! - **Candidate mining**: per-class frequent itemsets (Eclat or Apriori) become
//!   the pool of rule antecedents
//! - **Trainer encoding**: the pool and labels are written in the bit-vector text
//!   format the external rule-list trainer reads
//! - **First-match evaluation**: caught matrix, decision path, support,
//!   probabilities and scores of an ordered rule list
//! - **Rendering**: IF/THEN/ELSE text with optional feature and category names
//!
//! ## Example
//!
//! ```rust,ignore
//! use rule_list::{BayesianRuleList, CategoricalMatrix, CommandTrainer};
//!
//! let x = CategoricalMatrix::from_rows(&[vec![0, 1], vec![1, 0], vec![1, 1]])?;
//! let y = vec![0, 1, 1];
//! let mut model = BayesianRuleList::with_trainer(CommandTrainer::new("sbrl-train"));
//! let rule_list = model.fit_matrix(&x, &y)?;
//! println!("{}", rule_list);
//! ```

pub mod conf;
pub mod dataframe;
pub mod encoding;
pub mod error;
pub mod estimator;
pub mod format;
pub mod mining;
pub mod pool;
pub mod rule_list;
pub mod rules;
pub mod trainer;

pub use conf::RuleListConfig;
pub use dataframe::{CategoricalDataFrameExt, CategoricalFrame, CategoricalMatrix};
pub use error::{Result, RuleListError};
pub use estimator::BayesianRuleList;
pub use format::{format_rule, format_rule_list, DisplayNames, LabelMode};
pub use mining::{mine_candidates, FimMethod, ItemsetMiner, MiningParams};
pub use pool::{Candidate, CandidatePool};
pub use rule_list::{BoolMatrix, RuleList, SupportMatrix};
pub use rules::{Clause, Predicate, Rule};
pub use trainer::{Alpha, CommandTrainer, TrainOutput, TrainParams, Trainer};
